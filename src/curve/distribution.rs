use serde::Serialize;

use super::Series;
use crate::models::schedule::ScheduleItem;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingDates,
    EndBeforeStart,
    NonPositiveAmount,
}

/// A schedule item that contributed nothing to the planned series.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SkippedItem {
    pub index: usize,
    pub id: String,
    pub name: String,
    pub reason: SkipReason,
}

#[derive(Debug, Default, PartialEq)]
pub struct Distribution {
    pub series: Series,
    pub skipped: Vec<SkippedItem>,
}

/// Spreads every item's planned amount evenly over each calendar day of its
/// range, both ends included, summing overlapping days. With `name_filter`
/// only items whose name contains it (ignoring case) are considered.
pub fn distribute<'a, I>(items: I, name_filter: Option<&str>) -> Distribution
where
    I: IntoIterator<Item = &'a ScheduleItem>,
{
    let filter = name_filter
        .map(|filter| filter.trim().to_lowercase())
        .filter(|filter| !filter.is_empty());

    let mut distribution = Distribution::default();
    for (index, item) in items.into_iter().enumerate() {
        if let Some(filter) = &filter {
            if !item.name.to_lowercase().contains(filter) {
                continue;
            }
        }
        let skip = |reason| SkippedItem {
            index,
            id: item.id.clone(),
            name: item.name.clone(),
            reason,
        };

        let (start, end) = match (item.start_date, item.end_date) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                distribution.skipped.push(skip(SkipReason::MissingDates));
                continue;
            }
        };
        if !item.planned_amount.is_finite() || item.planned_amount <= 0.0 {
            distribution.skipped.push(skip(SkipReason::NonPositiveAmount));
            continue;
        }
        if end < start {
            distribution.skipped.push(skip(SkipReason::EndBeforeStart));
            continue;
        }

        let days = (end - start).num_days() + 1;
        let daily = item.planned_amount / days as f64;
        for day in start.iter_days().take(days as usize) {
            *distribution.series.entry(day).or_insert(0.0) += daily;
        }
    }
    if !distribution.skipped.is_empty() {
        tracing::warn!(
            skipped = distribution.skipped.len(),
            "schedule items left out of the planned curve"
        );
    }
    distribution
}
