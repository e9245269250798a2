//! Date normalizer: every statement date ends up as `DD/MM/YYYY`.
//!
//! Supported encodings:
//!   2024-03-05, 2024/03/05            (year first)
//!   05/03/2024, 5-3-2024              (day first)
//!   2025-07-01 00:00:00.0             (time part ignored)
//!   5 de marzo del 2024, marzo 2024   (Spanish long form, day optional)

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

static YEAR_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})$").expect("valid year-first regex")
});

static DAY_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})[-/.](\d{1,2})[-/.](\d{4})$").expect("valid day-first regex")
});

static SPANISH_LONG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(\d{1,2})\s+(?:de\s+)?)?(\p{L}+)\.?\s+(?:(?:del|de)\s+)?(\d{4})$")
        .expect("valid spanish date regex")
});

/// Result of normalizing one raw date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedDate {
    /// `DD/MM/YYYY`, or the raw input when it could not be understood.
    pub canonical: String,
    /// Comparable value; `None` when unparseable.
    pub sortable: Option<NaiveDate>,
}

impl NormalizedDate {
    fn parsed(date: NaiveDate) -> Self {
        Self {
            canonical: format_date(date),
            sortable: Some(date),
        }
    }

    fn unparsed(raw: &str) -> Self {
        Self {
            canonical: raw.to_string(),
            sortable: None,
        }
    }

    pub fn is_parsed(&self) -> bool {
        self.sortable.is_some()
    }
}

/// `DD/MM/YYYY`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Map a Spanish month name (or its three-letter abbreviation) to 1-12.
pub fn spanish_month(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    let month = match lower.as_str() {
        "enero" | "ene" => 1,
        "febrero" | "feb" => 2,
        "marzo" | "mar" => 3,
        "abril" | "abr" => 4,
        "mayo" | "may" => 5,
        "junio" | "jun" => 6,
        "julio" | "jul" => 7,
        "agosto" | "ago" => 8,
        "septiembre" | "setiembre" | "sep" | "set" => 9,
        "octubre" | "oct" => 10,
        "noviembre" | "nov" => 11,
        "diciembre" | "dic" => 12,
        _ => return None,
    };
    Some(month)
}

/// Last calendar day of a month, leap years included.
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

fn numeric(caps: &regex::Captures<'_>, idx: usize) -> Option<u32> {
    caps.get(idx)?.as_str().parse().ok()
}

fn parse_known(text: &str) -> Option<NaiveDate> {
    if let Some(caps) = YEAR_FIRST.captures(text) {
        let year = numeric(&caps, 1)? as i32;
        return NaiveDate::from_ymd_opt(year, numeric(&caps, 2)?, numeric(&caps, 3)?);
    }

    if let Some(caps) = DAY_FIRST.captures(text) {
        let year = numeric(&caps, 3)? as i32;
        return NaiveDate::from_ymd_opt(year, numeric(&caps, 2)?, numeric(&caps, 1)?);
    }

    let caps = SPANISH_LONG.captures(text)?;
    let month = spanish_month(caps.get(2)?.as_str())?;
    let year = numeric(&caps, 3)? as i32;
    match numeric(&caps, 1) {
        Some(day) => NaiveDate::from_ymd_opt(year, month, day),
        None => last_day_of_month(year, month),
    }
}

/// Normalize a raw date. `hint_format` is a chrono format tried before the
/// built-in encodings. Never fails: unparseable input comes back unchanged.
pub fn parse_date(raw: &str, hint_format: Option<&str>) -> NormalizedDate {
    let text = raw.trim();
    if text.is_empty() {
        return NormalizedDate::unparsed(raw);
    }

    if let Some(fmt) = hint_format {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return NormalizedDate::parsed(date);
        }
    }

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if let Some(date) = parse_known(&collapsed) {
        return NormalizedDate::parsed(date);
    }

    // Spreadsheet exports append a time: "2025-07-01 00:00:00.0"
    if let Some((date_part, time_part)) = collapsed.split_once(' ') {
        if time_part.contains(':') {
            if let Some(date) = parse_known(date_part) {
                return NormalizedDate::parsed(date);
            }
        }
    }

    NormalizedDate::unparsed(raw)
}
