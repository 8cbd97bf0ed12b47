use chrono::{Datelike, Duration, Months, NaiveDate};

use super::{frequency::Frequency, Series};

/// First day of the bucket `date` falls in: the date itself, the Monday of
/// its week or the first of its month.
pub fn bucket_start(date: NaiveDate, frequency: Frequency) -> NaiveDate {
    match frequency {
        Frequency::Daily => date,
        Frequency::Weekly => date - Duration::days(date.weekday().num_days_from_monday() as i64),
        Frequency::Monthly => date.with_day(1).unwrap_or(date),
    }
}

fn next_bucket(start: NaiveDate, frequency: Frequency) -> Option<NaiveDate> {
    match frequency {
        Frequency::Daily => start.succ_opt(),
        Frequency::Weekly => start.checked_add_signed(Duration::days(7)),
        Frequency::Monthly => start.checked_add_months(Months::new(1)),
    }
}

/// Sums a per-day series into buckets labelled by their first day. Every
/// bucket between the first and the last is present, empty ones as `0`.
pub fn resample(series: &Series, frequency: Frequency) -> Series {
    if frequency == Frequency::Daily {
        return series.clone();
    }
    let mut buckets = Series::new();
    for (date, value) in series {
        *buckets.entry(bucket_start(*date, frequency)).or_insert(0.0) += value;
    }
    if let (Some(&first), Some(&last)) = (buckets.keys().next(), buckets.keys().next_back()) {
        let mut start = first;
        while start < last {
            buckets.entry(start).or_insert(0.0);
            match next_bucket(start, frequency) {
                Some(next) => start = next,
                None => break,
            }
        }
    }
    buckets
}
