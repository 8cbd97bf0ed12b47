use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::schedule::ScheduleItem;

/// Longest schedule span, in days, still charted day by day.
pub const DAILY_MAX_SPAN: i64 = 45;
/// Longest schedule span, in days, still charted week by week.
pub const WEEKLY_MAX_SPAN: i64 = 210;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    #[default]
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn label(&self) -> &'static str {
        match self {
            Frequency::Daily => "Diario",
            Frequency::Weekly => "Semanal",
            Frequency::Monthly => "Mensual",
        }
    }
    pub fn for_span(days: i64) -> Self {
        if days <= DAILY_MAX_SPAN {
            Frequency::Daily
        } else if days <= WEEKLY_MAX_SPAN {
            Frequency::Weekly
        } else {
            Frequency::Monthly
        }
    }
}

/// Accepts codes (`d`, `w`, `m`) and English or Spanish names. Anything
/// unrecognised reads as weekly.
impl FromStr for Frequency {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim().to_lowercase();
        let is = |code: &str, prefixes: &[&str]| {
            value == code || prefixes.iter().any(|prefix| value.starts_with(prefix))
        };

        Ok(if is("d", &["dai", "dia", "día"]) {
            Frequency::Daily
        } else if is("m", &["mon", "mens", "mes"]) {
            Frequency::Monthly
        } else {
            Frequency::Weekly
        })
    }
}

/// Picks the bucket size from the overall span of the items that have both
/// dates, counting the first and last day. Weekly when nothing is dated.
pub fn auto_frequency<'a, I>(items: I) -> Frequency
where
    I: IntoIterator<Item = &'a ScheduleItem>,
{
    let dated = items
        .into_iter()
        .filter_map(|item| Some((item.start_date?, item.end_date?)));

    let mut span: Option<(chrono::NaiveDate, chrono::NaiveDate)> = None;
    for (start, end) in dated {
        span = Some(match span {
            Some((first, last)) => (first.min(start), last.max(end)),
            None => (start, end),
        });
    }
    match span {
        Some((first, last)) => Frequency::for_span((last - first).num_days() + 1),
        None => Frequency::Weekly,
    }
}
