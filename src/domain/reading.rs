// Reading domain model - one DGA sample normalized from a loose sheet row
use chrono::{DateTime, Days, Months, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::row::{Row, first_present, number_field, text_field, value_to_text};

pub const UNKNOWN_SERIAL: &str = "N/A";
pub const DEFAULT_TAG: &str = "EQUIP";
pub const DEFAULT_LOCATION: &str = "Planta";

const SERIAL_ALIASES: &[&str] = &["sn", "serie", "numeroSerie", "numeroserie", "id"];
const DATE_ALIASES: &[&str] = &["datacoleta", "dataColeta", "data", "Data"];
const OIL_TEMPERATURE_ALIASES: &[&str] = &["temperaturaOleo", "temperaturaoleo", "temperatura_oleo"];

/// Field names owned by the canonical record; everything else passes through
const CANONICAL_FIELDS: &[&str] = &[
    "sn", "id", "tag", "local", "data", "h2", "ch4", "c2h2", "c2h4", "c2h6", "co", "co2",
    "temperaturaOleo",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub sn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub tag: String,
    pub local: String,
    pub data: DateTime<Utc>,
    pub h2: f64,
    pub ch4: f64,
    pub c2h2: f64,
    pub c2h4: f64,
    pub c2h6: f64,
    pub co: f64,
    pub co2: f64,
    #[serde(rename = "temperaturaOleo")]
    pub temperatura_oleo: f64,
    #[serde(flatten)]
    pub extra: Row,
}

impl Reading {
    /// Normalize one raw row. Never fails: missing or malformed fields fall
    /// back to their defaults and an unparseable date becomes `now`.
    pub fn from_row(row: &Row, now: DateTime<Utc>) -> Self {
        let sn = text_field(row, SERIAL_ALIASES, UNKNOWN_SERIAL);
        let id = row
            .get("id")
            .filter(|v| !v.is_null())
            .map(value_to_text)
            .filter(|s| !s.is_empty());

        let extra = row
            .iter()
            .filter(|(key, _)| !CANONICAL_FIELDS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Self {
            sn,
            id,
            tag: text_field(row, &["tag"], DEFAULT_TAG),
            local: text_field(row, &["local"], DEFAULT_LOCATION),
            data: parse_timestamp(first_present(row, DATE_ALIASES), now),
            h2: number_field(row, &["h2"]),
            ch4: number_field(row, &["ch4"]),
            c2h2: number_field(row, &["c2h2"]),
            c2h4: number_field(row, &["c2h4"]),
            c2h6: number_field(row, &["c2h6"]),
            co: number_field(row, &["co"]),
            co2: number_field(row, &["co2"]),
            temperatura_oleo: number_field(row, OIL_TEMPERATURE_ALIASES),
            extra,
        }
    }

    /// Total combustible gas. CO2 is not combustible and is left out.
    pub fn tcg(&self) -> f64 {
        self.h2 + self.ch4 + self.c2h2 + self.c2h4 + self.c2h6 + self.co
    }
}

/// Normalize a batch of rows against a single `now`, so that every row with
/// an unusable date lands on the same instant.
pub fn normalize_rows(rows: &[Row], now: DateTime<Utc>) -> Vec<Reading> {
    rows.iter().map(|row| Reading::from_row(row, now)).collect()
}

/// Parse a date-like value, falling back to `now` when nothing usable is found
pub fn parse_timestamp(value: Option<&Value>, now: DateTime<Utc>) -> DateTime<Utc> {
    let parsed = match value {
        Some(Value::String(s)) => parse_standard(s).or_else(|| parse_day_first(s)),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis),
        _ => None,
    };

    parsed.unwrap_or(now)
}

fn parse_standard(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // chrono's %Y takes any digit count; "05-03-24" must reach the day-first path
    if !has_iso_year_prefix(s) {
        return None;
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn has_iso_year_prefix(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 10 && bytes[..4].iter().all(u8::is_ascii_digit) && bytes[4] == b'-'
}

/// Spreadsheet dates typed by hand: `day/month/year`, with `/`, `-` or
/// whitespace between parts. Two-character years belong to the 2000s.
fn parse_day_first(raw: &str) -> Option<DateTime<Utc>> {
    let parts: Vec<&str> = raw
        .trim()
        .split(|c: char| c == '/' || c == '-' || c.is_whitespace())
        .collect();
    if parts.len() < 3 {
        return None;
    }

    let day = leading_int(parts[0])?;
    let month = leading_int(parts[1])?;
    let year = if parts[2].chars().count() == 2 {
        2000 + leading_int(parts[2])?
    } else {
        leading_int(parts[2])?
    };

    rolled_date(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Calendar date where out-of-range months and days carry over into the
/// next unit, so `31/02/2024` lands on 2024-03-02 and month 13 on January
/// of the following year. Zero and negative parts carry backwards.
fn rolled_date(year: i32, month: i32, day: i32) -> Option<NaiveDate> {
    let months = i64::from(year) * 12 + i64::from(month) - 1;
    let year = i32::try_from(months.div_euclid(12)).ok()?;
    let month0 = u32::try_from(months.rem_euclid(12)).ok()?;
    let first = NaiveDate::from_ymd_opt(year, 1, 1)?.checked_add_months(Months::new(month0))?;

    let offset = i64::from(day) - 1;
    if offset >= 0 {
        first.checked_add_days(Days::new(offset.unsigned_abs()))
    } else {
        first.checked_sub_days(Days::new(offset.unsigned_abs()))
    }
}

/// Integer made of the leading digits of `s` (optional sign), like a
/// lenient `parseInt`
fn leading_int(s: &str) -> Option<i32> {
    let s = s.trim_start();
    let (sign, rest) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i32>().ok().map(|n| sign * n)
}
