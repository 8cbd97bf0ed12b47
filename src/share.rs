//! WhatsApp notification links for submitted daily reports.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::report::DailyReport,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Country {
    #[default]
    Peru,
    Chile,
    Mexico,
    Argentina,
    Colombia,
    Brazil,
    Spain,
}

impl Country {
    pub fn dial_code(&self) -> &'static str {
        match self {
            Country::Peru => "51",
            Country::Chile => "56",
            Country::Mexico => "52",
            Country::Argentina => "54",
            Country::Colombia => "57",
            Country::Brazil => "55",
            Country::Spain => "34",
        }
    }
    /// Digits of a local number, without the country code.
    pub fn local_digits(&self) -> usize {
        match self {
            Country::Peru | Country::Chile | Country::Spain => 9,
            Country::Mexico | Country::Argentina | Country::Colombia => 10,
            Country::Brazil => 11,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ShareRequest {
    #[serde(default)]
    pub country: Country,
    pub number: String,
    pub notes: Option<String>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct ShareLink {
    pub phone: String,
    pub message: String,
    pub url: String,
}

pub fn clean_number(raw: &str) -> String {
    let non_digit: Regex = Regex::new(r"\D").unwrap();
    non_digit.replace_all(raw, "").into_owned()
}

/// `1234.5` → `1,234.50`.
pub fn format_money(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (integer, decimals) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (position, digit) in integer.chars().enumerate() {
        if position > 0 && (integer.len() - position) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{decimals}")
}

pub fn report_message(site_name: &str, report: &DailyReport, notes: Option<&str>) -> String {
    let date = report
        .date
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    let mut message = format!(
        "*Parte Diario Enviado*\n\n*Obra:* {}\n*Fecha:* {}\n*Avance:* {}%\n*Total Ejecutado:* S/. {}",
        site_name,
        date,
        report.progress,
        format_money(report.executed_total)
    );
    if let Some(notes) = notes.map(str::trim).filter(|notes| !notes.is_empty()) {
        message.push_str("\n\n*Observaciones:*\n");
        message.push_str(notes);
    }
    message
}

pub fn share_link(country: Country, number: &str, message: String) -> AppResult<ShareLink> {
    let local = clean_number(number);
    if local.is_empty() {
        return Err(AppError::Validation("PHONE_NUMBER_REQUIRED"));
    }
    if local.len() != country.local_digits() {
        return Err(AppError::Validation("INVALID_PHONE_NUMBER_LENGTH"));
    }
    let phone = format!("{}{}", country.dial_code(), local);
    let url = format!(
        "https://wa.me/{}?text={}",
        phone,
        urlencoding::encode(&message)
    );
    Ok(ShareLink {
        phone,
        message,
        url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    #[test]
    fn money_has_thousand_separators() {
        assert_eq!(format_money(0.0), "0.00");
        assert_eq!(format_money(999.999), "1,000.00");
        assert_eq!(format_money(1234.56), "1,234.56");
        assert_eq!(format_money(1234567.5), "1,234,567.50");
        assert_eq!(format_money(-45210.0), "-45,210.00");
    }

    #[test]
    fn numbers_are_cleaned_and_checked() {
        assert_eq!(clean_number("+51 958-555 917"), "51958555917");
        assert_matches!(
            share_link(Country::Peru, "958 555 91", String::new()),
            Err(AppError::Validation("INVALID_PHONE_NUMBER_LENGTH"))
        );
        assert_matches!(
            share_link(Country::Chile, "n/a", String::new()),
            Err(AppError::Validation("PHONE_NUMBER_REQUIRED"))
        );
        let link = share_link(Country::Brazil, "(11) 98765-4321", "ok".to_string()).unwrap();
        assert_eq!(link.phone, "5511987654321");
        assert_eq!(link.url, "https://wa.me/5511987654321?text=ok");
    }

    #[test]
    fn message_and_link() {
        let report = DailyReport {
            date: NaiveDate::from_ymd_opt(2024, 1, 5),
            progress: 4.5,
            executed_total: 1234.56,
            ..DailyReport::default()
        };
        let message = report_message("Rinconada", &report, Some("  Falta arena  "));
        assert_eq!(
            message,
            "*Parte Diario Enviado*\n\n*Obra:* Rinconada\n*Fecha:* 2024-01-05\n*Avance:* 4.5%\n\
             *Total Ejecutado:* S/. 1,234.56\n\n*Observaciones:*\nFalta arena"
        );
        assert!(!report_message("Rinconada", &report, Some(" ")).contains("Observaciones"));

        let link = share_link(Country::Peru, "958555917", message).unwrap();
        assert!(link
            .url
            .starts_with("https://wa.me/51958555917?text=%2AParte%20Diario%20Enviado%2A%0A%0A"));
    }
}
