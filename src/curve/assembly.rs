use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

use super::Series;

/// One row of the comparison table. Absent values on either side count
/// as zero.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CurvePoint {
    pub date: NaiveDate,
    pub planned: f64,
    pub actual: f64,
    pub planned_cumulative: f64,
    pub actual_cumulative: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_cumulative: Option<f64>,
}

/// Outer-joins the planned and actual series (and the pending draft plan,
/// when given) on date and accumulates each column.
pub fn assemble(planned: &Series, actual: &Series, pending: Option<&Series>) -> Vec<CurvePoint> {
    let dates: BTreeSet<NaiveDate> = planned
        .keys()
        .chain(actual.keys())
        .chain(pending.into_iter().flat_map(|pending| pending.keys()))
        .copied()
        .collect();

    let mut planned_cumulative = 0.0;
    let mut actual_cumulative = 0.0;
    let mut pending_cumulative = 0.0;
    dates
        .into_iter()
        .map(|date| {
            let planned = planned.get(&date).copied().unwrap_or(0.0);
            let actual = actual.get(&date).copied().unwrap_or(0.0);
            let pending = pending.map(|pending| pending.get(&date).copied().unwrap_or(0.0));
            planned_cumulative += planned;
            actual_cumulative += actual;
            pending_cumulative += pending.unwrap_or(0.0);
            CurvePoint {
                date,
                planned,
                actual,
                planned_cumulative,
                actual_cumulative,
                pending,
                pending_cumulative: pending.map(|_| pending_cumulative),
            }
        })
        .collect()
}

/// Planned value against actual cost, overall and as of a cutoff date.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ScheduleSummary {
    pub pv_total: f64,
    pub ac_total: f64,
    pub pv_to_date: f64,
    pub ac_to_date: f64,
    /// `ac_to_date - pv_to_date`; positive means spending ahead of plan.
    pub variance: f64,
    pub performance_index: f64,
}

/// `actual / planned`, or `0` when nothing was planned.
pub fn performance_index(actual_to_date: f64, planned_to_date: f64) -> f64 {
    if planned_to_date > 0.0 {
        actual_to_date / planned_to_date
    } else {
        0.0
    }
}

fn sum_until(series: &Series, cutoff: NaiveDate) -> f64 {
    series.range(..=cutoff).map(|(_, value)| value).sum()
}

/// Expects per-day series; the cutoff day itself is included.
pub fn summarize(planned: &Series, actual: &Series, cutoff: NaiveDate) -> ScheduleSummary {
    let pv_to_date = sum_until(planned, cutoff);
    let ac_to_date = sum_until(actual, cutoff);
    ScheduleSummary {
        pv_total: planned.values().sum(),
        ac_total: actual.values().sum(),
        pv_to_date,
        ac_to_date,
        variance: ac_to_date - pv_to_date,
        performance_index: performance_index(ac_to_date, pv_to_date),
    }
}
