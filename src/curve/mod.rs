//! Curve S: cumulative planned spend from the valorized schedule against
//! cumulative executed cost from the daily reports.
//!
//! Everything here is pure and never fails. Records that cannot be placed
//! on the curve are skipped and listed in the result.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{
    report::DailyReport,
    schedule::{ApprovalState, ScheduleItem},
};

pub mod assembly;
pub mod distribution;
pub mod extraction;
pub mod frequency;
pub mod resample;

use assembly::{assemble, summarize, CurvePoint, ScheduleSummary};
use distribution::{distribute, SkippedItem};
use extraction::{actual_series, SkippedReport};
use frequency::{auto_frequency, Frequency};
use resample::resample;

/// Date-indexed amounts, kept in date order.
pub type Series = BTreeMap<NaiveDate, f64>;

#[derive(Clone, Debug)]
pub struct CurveOptions {
    /// `None` picks the bucket size from the schedule span.
    pub frequency: Option<Frequency>,
    /// Adds the not-yet-approved items as a separate draft plan.
    pub include_pending: bool,
    pub cutoff: NaiveDate,
    pub name_filter: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CurveReport {
    pub frequency: Frequency,
    pub frequency_label: &'static str,
    pub points: Vec<CurvePoint>,
    pub summary: ScheduleSummary,
    pub approved_items: usize,
    pub pending_items: usize,
    pub reports: usize,
    pub skipped_items: Vec<SkippedItem>,
    pub skipped_reports: Vec<SkippedReport>,
    /// `false` when there is nothing to chart.
    pub has_data: bool,
}

/// Builds the chart table and the PV/AC summary for one site.
///
/// The plan uses approved items only. When no frequency is requested it is
/// chosen from the approved items, or from the pending ones if nothing is
/// approved yet. The summary is computed on the daily series, independent
/// of the chart's bucket size.
pub fn build_curve(
    schedule: &[ScheduleItem],
    reports: &[DailyReport],
    options: &CurveOptions,
) -> CurveReport {
    let (approved, pending): (Vec<&ScheduleItem>, Vec<&ScheduleItem>) = schedule
        .iter()
        .partition(|item| item.state == ApprovalState::Approved);

    let frequency = options.frequency.unwrap_or_else(|| {
        let basis = if approved.is_empty() { &pending } else { &approved };
        auto_frequency(basis.iter().copied())
    });

    let name_filter = options.name_filter.as_deref();
    let planned = distribute(approved.iter().copied(), name_filter);
    let actual = actual_series(reports);

    let mut skipped_items = planned.skipped.clone();
    let draft = if options.include_pending && !pending.is_empty() {
        let draft = distribute(pending.iter().copied(), name_filter);
        skipped_items.extend(draft.skipped);
        Some(resample(&draft.series, frequency))
    } else {
        None
    };

    let points = assemble(
        &resample(&planned.series, frequency),
        &resample(&actual.series, frequency),
        draft.as_ref(),
    );

    CurveReport {
        frequency,
        frequency_label: frequency.label(),
        summary: summarize(&planned.series, &actual.series, options.cutoff),
        has_data: !points.is_empty(),
        points,
        approved_items: approved.len(),
        pending_items: pending.len(),
        reports: reports.len(),
        skipped_items,
        skipped_reports: actual.skipped,
    }
}

/// PV/AC summary over the approved plan, without building the chart.
pub fn schedule_summary(
    schedule: &[ScheduleItem],
    reports: &[DailyReport],
    cutoff: NaiveDate,
) -> ScheduleSummary {
    let approved = schedule
        .iter()
        .filter(|item| item.state == ApprovalState::Approved);
    summarize(
        &distribute(approved, None).series,
        &actual_series(reports).series,
        cutoff,
    )
}
