//! # Formatting and Coercion Helpers
//!
//! Display formatting shared by every controller: money, status labels and
//! badge variants, dates, and the lenient text/number coercions applied to
//! form drafts before they are written to the backend.

use chrono::{DateTime, NaiveDate, TimeZone};
use num_format::{Locale, ToFormattedString};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Visual variant shared by badges, KPI cards and notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Ok,
    Warn,
    Danger,
    Info,
    Neutral,
}

/// Formats an amount in shekels with grouped thousands and no fraction.
///
/// Missing or non-finite values render as `-`.
pub fn format_money_ils(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => {
            let rounded = v.round() as i64;
            let grouped = rounded.unsigned_abs().to_formatted_string(&Locale::en);
            if rounded < 0 {
                format!("-₪{grouped}")
            } else {
                format!("₪{grouped}")
            }
        }
        _ => "-".to_string(),
    }
}

/// Trimmed text, with `None` treated as the empty string.
pub fn safe_text(value: Option<&str>) -> String {
    value.unwrap_or_default().trim().to_string()
}

/// Trimmed text, or `None` when nothing is left after trimming.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    let text = safe_text(value);
    if text.is_empty() { None } else { Some(text) }
}

/// Parses a user-entered number. Blank, unparsable and non-finite input yields `None`.
pub fn to_number_or_null(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parses `"true"`/`"false"`; anything else is unset.
pub fn to_bool_or_null(value: &str) -> Option<bool> {
    match value.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Display label for a car status, `-` when unknown.
pub fn status_label(status: &str) -> &'static str {
    match status.trim().to_lowercase().as_str() {
        "available" => "متاح",
        "reserved" => "محجوز",
        "sold" => "مباع",
        _ => "-",
    }
}

/// Badge variant for a car status.
pub fn status_variant(status: &str) -> Variant {
    match status.trim().to_lowercase().as_str() {
        "available" => Variant::Ok,
        "reserved" => Variant::Warn,
        _ => Variant::Info,
    }
}

/// `HH:MM`, 24-hour clock.
pub fn fmt_time_24<Tz: TimeZone>(value: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    value.format("%H:%M").to_string()
}

/// `DD/MM/YYYY`.
pub fn fmt_date_dmy(value: NaiveDate) -> String {
    value.format("%d/%m/%Y").to_string()
}

/// `DD/MM/YYYY HH:MM`, or `—` when there is no timestamp.
pub fn fmt_date_time_24<Tz: TimeZone>(value: Option<&DateTime<Tz>>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match value {
        Some(dt) => format!("{} {}", fmt_date_dmy(dt.date_naive()), fmt_time_24(dt)),
        None => "—".to_string(),
    }
}

/// Joins make, model and year, skipping whichever parts are missing.
pub fn car_title(make: &str, model: &str, year: Option<i32>) -> String {
    let year = year.map(|y| y.to_string());
    [Some(make.trim()), Some(model.trim()), year.as_deref()]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Form input as it arrives from the UI: a JSON number, a string, a boolean or nothing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum Loose {
    Number(f64),
    Bool(bool),
    Text(String),
}

/// Deserializes an optional number that may have been sent as text.
///
/// Blank or unparsable text becomes `None` instead of failing the request.
pub fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Loose>::deserialize(deserializer)?;
    Ok(match value {
        Some(Loose::Number(n)) if n.is_finite() => Some(n),
        Some(Loose::Text(text)) => to_number_or_null(&text),
        _ => None,
    })
}

/// Like [`lenient_number`] for columns that always arrive; `null` reads as zero.
pub fn number_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_number(deserializer)?.unwrap_or(0.0))
}

/// Deserializes an optional boolean that may have been sent as `"true"`/`"false"`.
pub fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Loose>::deserialize(deserializer)?;
    Ok(match value {
        Some(Loose::Bool(b)) => Some(b),
        Some(Loose::Text(text)) => to_bool_or_null(&text),
        _ => None,
    })
}
