//! Tolerant readers for documents written by older versions of the
//! dashboard. Dates and amounts may arrive as strings, numbers or not at all;
//! whatever cannot be understood becomes "absent" instead of an error.

use chrono::{DateTime, NaiveDate};
use mongodb::bson::oid::ObjectId;
use serde::{
    de::{DeserializeOwned, IgnoredAny},
    Deserialize, Deserializer,
};
use serde_json::Value;

use super::{milestone::PaymentState, schedule::ApprovalState};

/// Recorded as creator when the stored value is missing or blank.
pub const LEGACY_CREATOR: &str = "jefe";

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Number(f64),
    Text(String),
    #[allow(dead_code)]
    Other(IgnoredAny),
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.date_naive());
    }
    // "2024-01-05 14:30", "2024-01-05T14:30:00.123"
    if let Some(prefix) = raw.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Some(date);
        }
    }
    NaiveDate::parse_from_str(raw, "%d/%m/%Y").ok()
}

pub fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim()
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

pub fn date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Loose::deserialize(deserializer)? {
        Loose::Text(raw) => parse_date(&raw),
        _ => None,
    })
}

pub fn amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Loose::deserialize(deserializer)? {
        Loose::Number(value) if value.is_finite() => value,
        Loose::Text(raw) => parse_amount(&raw).unwrap_or(0.0),
        _ => 0.0,
    })
}

pub fn optional_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Loose::deserialize(deserializer)? {
        Loose::Number(value) if value.is_finite() => Some(value),
        Loose::Text(raw) => parse_amount(&raw),
        _ => None,
    })
}

pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Loose::deserialize(deserializer)? {
        Loose::Text(raw) => raw,
        Loose::Number(value) => value.to_string(),
        Loose::Other(_) => String::new(),
    })
}

/// Like [`text`], but a blank creator falls back to [`LEGACY_CREATOR`].
pub fn creator<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let creator = text(deserializer)?;
    Ok(if creator.trim().is_empty() {
        LEGACY_CREATOR.to_string()
    } else {
        creator
    })
}

/// Only a case-insensitive `aprobado`/`approved` counts as approved; any
/// other value, null included, is pending.
pub fn approval_state<'de, D>(deserializer: D) -> Result<ApprovalState, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Loose::deserialize(deserializer)? {
        Loose::Text(raw) if matches!(raw.trim().to_lowercase().as_str(), "aprobado" | "approved") => {
            ApprovalState::Approved
        }
        _ => ApprovalState::Pending,
    })
}

/// `pagado`, `pagada` or `paid` in any case is paid; anything else pending.
pub fn payment_state<'de, D>(deserializer: D) -> Result<PaymentState, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Loose::deserialize(deserializer)? {
        Loose::Text(raw)
            if matches!(raw.trim().to_lowercase().as_str(), "pagado" | "pagada" | "paid") =>
        {
            PaymentState::Paid
        }
        _ => PaymentState::Pending,
    })
}

/// Photo references: a list keeps its strings, a lone string becomes a
/// one-element list, anything else is empty.
pub fn text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(raw) if !raw.trim().is_empty() => vec![raw],
        Value::Array(values) => values
            .into_iter()
            .filter_map(|value| match value {
                Value::String(raw) if !raw.trim().is_empty() => Some(raw),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Nested records that do not have the expected shape are replaced by
/// their default instead of failing the enclosing document.
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

pub fn new_id() -> String {
    ObjectId::new().to_hex()
}
