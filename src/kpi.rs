//! Dashboard indicators derived from a site's records.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::{
    curve::{assembly::ScheduleSummary, schedule_summary},
    models::{
        donation::{Donation, DonationKind},
        milestone::{Milestone, PaymentState},
        report::DailyReport,
        site::Site,
    },
};

/// Length of the standard working day the expected yield refers to.
pub const STANDARD_DAY_HOURS: f64 = 8.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Light {
    Green,
    Amber,
    Red,
    NoData,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct BudgetSummary {
    pub budgeted: f64,
    pub spent: f64,
    pub available: f64,
    pub spent_pct: f64,
    pub light: Light,
}

/// Light for the share of the budget already spent: up to 95 % green, up
/// to 100 % amber, red beyond.
pub fn budget_light(spent_pct: Option<f64>) -> Light {
    match spent_pct {
        None => Light::NoData,
        Some(pct) if pct <= 95.0 => Light::Green,
        Some(pct) if pct <= 100.0 => Light::Amber,
        Some(_) => Light::Red,
    }
}

pub fn budget_summary(total_budget: f64, reports: &[DailyReport]) -> BudgetSummary {
    let budgeted = total_budget.max(0.0);
    let spent: f64 = reports.iter().map(|report| report.executed_total).sum();
    let spent_pct = (budgeted > 0.0).then(|| spent / budgeted * 100.0);
    BudgetSummary {
        budgeted,
        spent,
        available: budgeted - spent,
        spent_pct: spent_pct.unwrap_or(0.0),
        light: budget_light(spent_pct),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    OnTime,
    SlightDelay,
    CriticalDelay,
    /// No programmed progress has been set for the site.
    Undefined,
}

/// Points of progress a site may fall behind before the delay is critical.
pub const SLIGHT_DELAY_MARGIN: f64 = 5.0;

pub fn schedule_status(actual_pct: f64, programmed_pct: f64) -> ScheduleStatus {
    if programmed_pct <= 0.0 {
        return ScheduleStatus::Undefined;
    }
    let difference = actual_pct - programmed_pct;
    if difference >= 0.0 {
        ScheduleStatus::OnTime
    } else if difference >= -SLIGHT_DELAY_MARGIN {
        ScheduleStatus::SlightDelay
    } else {
        ScheduleStatus::CriticalDelay
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub actual_pct: f64,
    pub programmed_pct: f64,
    pub difference: f64,
    pub status: ScheduleStatus,
}

/// Physical progress is the sum of the progress claimed by each report.
pub fn progress_summary(reports: &[DailyReport], programmed_pct: f64) -> ProgressSummary {
    let actual_pct: f64 = reports.iter().map(|report| report.progress).sum();
    ProgressSummary {
        actual_pct,
        programmed_pct,
        difference: actual_pct - programmed_pct,
        status: schedule_status(actual_pct, programmed_pct),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EfficiencyLevel {
    Excellent,
    Acceptable,
    Critical,
}

/// Executed quantity as a percentage of what the crew was expected to
/// produce in the hours worked. `0` without a yield or hours.
pub fn efficiency(executed: f64, expected_yield: f64, hours: f64) -> f64 {
    if expected_yield <= 0.0 || hours <= 0.0 {
        return 0.0;
    }
    let expected = expected_yield * (hours / STANDARD_DAY_HOURS);
    executed / expected * 100.0
}

pub fn efficiency_level(efficiency: f64) -> EfficiencyLevel {
    if efficiency >= 100.0 {
        EfficiencyLevel::Excellent
    } else if efficiency >= 80.0 {
        EfficiencyLevel::Acceptable
    } else {
        EfficiencyLevel::Critical
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct EfficiencySummary {
    pub average: f64,
    pub measured_reports: usize,
    pub level: Option<EfficiencyLevel>,
}

/// Mean efficiency over the reports whose work item has a yield, hours and
/// an executed quantity.
pub fn average_efficiency(reports: &[DailyReport]) -> EfficiencySummary {
    let measured: Vec<f64> = reports
        .iter()
        .map(|report| &report.work_item)
        .filter(|item| {
            item.expected_yield > 0.0 && item.labor_hours > 0.0 && item.executed_quantity > 0.0
        })
        .map(|item| efficiency(item.executed_quantity, item.expected_yield, item.labor_hours))
        .collect();

    if measured.is_empty() {
        return EfficiencySummary {
            average: 0.0,
            measured_reports: 0,
            level: None,
        };
    }
    let average = measured.iter().sum::<f64>() / measured.len() as f64;
    EfficiencySummary {
        average,
        measured_reports: measured.len(),
        level: Some(efficiency_level(average)),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CostControl {
    InControl,
    Attention,
    Overrun,
    NoData,
}

/// Reads the actual/planned index: up to 0.95 in control, up to 1.05
/// attention, overrun beyond. A zero index means nothing to compare.
pub fn cost_control(performance_index: f64) -> CostControl {
    if performance_index <= 0.0 {
        CostControl::NoData
    } else if performance_index <= 0.95 {
        CostControl::InControl
    } else if performance_index <= 1.05 {
        CostControl::Attention
    } else {
        CostControl::Overrun
    }
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct MilestoneSummary {
    pub total: f64,
    pub paid: f64,
    pub pending: f64,
}

pub fn milestone_summary(milestones: &[Milestone]) -> MilestoneSummary {
    let mut summary = MilestoneSummary::default();
    for milestone in milestones.iter().filter(|milestone| milestone.amount > 0.0) {
        summary.total += milestone.amount;
        match milestone.state {
            PaymentState::Paid => summary.paid += milestone.amount,
            PaymentState::Pending => summary.pending += milestone.amount,
        }
    }
    summary
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct DonationSummary {
    pub cash_total: f64,
    pub in_kind_total: f64,
    pub total: f64,
    pub donors: usize,
    pub donations: usize,
}

pub fn donation_summary(donations: &[Donation]) -> DonationSummary {
    let mut summary = DonationSummary::default();
    let mut donors: BTreeSet<&str> = BTreeSet::new();
    for donation in donations {
        summary.donations += 1;
        if !donation.donor.trim().is_empty() {
            donors.insert(donation.donor.trim());
        }
        match donation.kind {
            DonationKind::Cash => summary.cash_total += donation.quantity,
            DonationKind::InKind => {
                summary.in_kind_total += donation.quantity * donation.unit_value.unwrap_or(0.0)
            }
        }
    }
    summary.total = summary.cash_total + summary.in_kind_total;
    summary.donors = donors.len();
    summary
}

#[derive(Debug, PartialEq, Serialize)]
pub struct BudgetImpact {
    pub original_budget: f64,
    pub donations: f64,
    pub extended_budget: f64,
    pub extension_pct: f64,
}

pub fn budget_impact(original_budget: f64, donations: &[Donation]) -> BudgetImpact {
    let total = donation_summary(donations).total;
    BudgetImpact {
        original_budget,
        donations: total,
        extended_budget: original_budget + total,
        extension_pct: if original_budget > 0.0 {
            total / original_budget * 100.0
        } else {
            0.0
        },
    }
}

#[derive(Debug, Serialize)]
pub struct SiteKpis {
    pub budget: BudgetSummary,
    pub progress: ProgressSummary,
    pub efficiency: EfficiencySummary,
    pub schedule: ScheduleSummary,
    pub cost_control: CostControl,
    pub milestones: MilestoneSummary,
    pub donations: DonationSummary,
    pub budget_impact: BudgetImpact,
}

pub fn site_kpis(site: &Site, donations: &[Donation], cutoff: NaiveDate) -> SiteKpis {
    let reports = site.daily_reports();
    let schedule = schedule_summary(&site.schedule, &reports, cutoff);
    SiteKpis {
        budget: budget_summary(site.total_budget, &reports),
        progress: progress_summary(&reports, site.programmed_progress),
        efficiency: average_efficiency(&reports),
        cost_control: cost_control(schedule.performance_index),
        schedule,
        milestones: milestone_summary(&site.milestones),
        donations: donation_summary(donations),
        budget_impact: budget_impact(site.total_budget, donations),
    }
}
