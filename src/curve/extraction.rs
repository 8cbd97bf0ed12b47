use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

use super::Series;
use crate::models::{lenient::parse_date, report::DailyReport};

/// Keys holding the executed total inside a report's `totales` object, most
/// specific first.
const TOTALS_KEYS: [&str; 5] = [
    "total_ejecutado",
    "total_general_ejecutado",
    "total",
    "total_general",
    "total_costos",
];
/// Keys holding the executed total directly on reports without `totales`.
const FLAT_KEYS: [&str; 6] = [
    "total_ejecutado",
    "total_general_ejecutado",
    "total",
    "total_general",
    "monto",
    "costo",
];
const DATE_KEYS: [&str; 3] = ["fecha", "Fecha", "date"];

fn first_number(object: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .find_map(|key| object.get(*key).and_then(Value::as_f64))
}

/// Executed cost of a stored report, whatever layout it was written with.
///
/// A `totales` object is searched for a known total key and, failing that,
/// its numeric values are summed. Reports without one are searched for a
/// flat total key. Only JSON numbers count; anything else yields `0`.
pub fn extract_actual_cost(report: &Value) -> f64 {
    let report = match report.as_object() {
        Some(report) => report,
        None => return 0.0,
    };
    if let Some(totals) = report.get("totales").and_then(Value::as_object) {
        return first_number(totals, &TOTALS_KEYS)
            .unwrap_or_else(|| totals.values().filter_map(Value::as_f64).sum());
    }
    first_number(report, &FLAT_KEYS).unwrap_or(0.0)
}

/// Date of a stored report, read from the first non-empty of `fecha`,
/// `Fecha` or `date`. Extended-JSON dates (`{"$date": ...}`) are accepted.
pub fn report_date(report: &Value) -> Option<NaiveDate> {
    let raw = DATE_KEYS.iter().find_map(|key| match report.get(*key)? {
        Value::String(raw) if !raw.trim().is_empty() => Some(raw.as_str()),
        Value::Object(date) => date.get("$date").and_then(Value::as_str),
        _ => None,
    })?;
    parse_date(raw)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSkipReason {
    MissingDate,
    NoCost,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SkippedReport {
    pub index: usize,
    pub id: String,
    pub reason: ReportSkipReason,
}

#[derive(Debug, Default, PartialEq)]
pub struct ActualCosts {
    pub series: Series,
    pub skipped: Vec<SkippedReport>,
}

/// Per-day executed cost. Undated reports and reports without a positive
/// cost are left out and listed.
pub fn actual_series(reports: &[DailyReport]) -> ActualCosts {
    let mut actual = ActualCosts::default();
    for (index, report) in reports.iter().enumerate() {
        let reason = match report.date {
            None => ReportSkipReason::MissingDate,
            Some(_) if report.executed_total.is_nan() || report.executed_total <= 0.0 => {
                ReportSkipReason::NoCost
            }
            Some(date) => {
                *actual.series.entry(date).or_insert(0.0) += report.executed_total;
                continue;
            }
        };
        actual.skipped.push(SkippedReport {
            index,
            id: report.id.clone(),
            reason,
        });
    }
    if !actual.skipped.is_empty() {
        tracing::warn!(
            skipped = actual.skipped.len(),
            "daily reports left out of the actual curve"
        );
    }
    actual
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn known_total_keys_win() {
        assert_eq!(
            extract_actual_cost(&json!({ "totales": { "total_general_ejecutado": 150 } })),
            150.0
        );
        assert_eq!(
            extract_actual_cost(&json!({
                "totales": { "total_general": 90, "total_ejecutado": 120.5, "mano_de_obra": 7 }
            })),
            120.5
        );
        // a recognised key holding zero still wins over the fallback sum
        assert_eq!(
            extract_actual_cost(&json!({ "totales": { "total": 0, "materiales": 30 } })),
            0.0
        );
    }

    #[test]
    fn totals_without_known_key_are_summed() {
        assert_eq!(
            extract_actual_cost(&json!({ "totales": { "mano_de_obra": 50, "materiales": 30 } })),
            80.0
        );
        assert_eq!(
            extract_actual_cost(&json!({
                "totales": { "mano_de_obra": "50", "materiales": 30, "nota": null }
            })),
            30.0
        );
    }

    #[test]
    fn flat_keys_and_empty_reports() {
        assert_eq!(extract_actual_cost(&json!({})), 0.0);
        assert_eq!(extract_actual_cost(&json!({ "monto": 64.2, "costo": 1 })), 64.2);
        assert_eq!(extract_actual_cost(&json!({ "total": "75" })), 0.0);
        assert_eq!(extract_actual_cost(&json!({ "totales": "n/a", "costo": 12 })), 12.0);
        assert_eq!(extract_actual_cost(&json!([1, 2])), 0.0);
    }

    #[test]
    fn report_dates() {
        let jan5 = NaiveDate::from_ymd_opt(2024, 1, 5);
        assert_eq!(report_date(&json!({ "fecha": "2024-01-05" })), jan5);
        assert_eq!(report_date(&json!({ "fecha": "", "Fecha": "2024-01-05 17:40" })), jan5);
        assert_eq!(report_date(&json!({ "date": { "$date": "2024-01-05T00:00:00Z" } })), jan5);
        assert_eq!(report_date(&json!({ "fecha": "ayer" })), None);
        assert_eq!(report_date(&json!({})), None);
    }

    #[test]
    fn actual_series_lists_what_it_leaves_out() {
        let report = |id: &str, date: Option<NaiveDate>, executed: f64| DailyReport {
            id: id.to_string(),
            date,
            executed_total: executed,
            ..DailyReport::default()
        };
        let jan5 = NaiveDate::from_ymd_opt(2024, 1, 5);
        let reports = [
            report("a", jan5, 50.0),
            report("b", jan5, 25.0),
            report("c", None, 80.0),
            report("d", jan5, 0.0),
        ];
        let actual = actual_series(&reports);
        assert_eq!(actual.series.len(), 1);
        assert_eq!(actual.series.values().sum::<f64>(), 75.0);
        assert_eq!(
            actual.skipped,
            vec![
                SkippedReport {
                    index: 2,
                    id: "c".to_string(),
                    reason: ReportSkipReason::MissingDate,
                },
                SkippedReport {
                    index: 3,
                    id: "d".to_string(),
                    reason: ReportSkipReason::NoCost,
                },
            ]
        );
    }
}
