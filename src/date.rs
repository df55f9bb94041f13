//! Query date normalization.
//!
//! A creation date arrives as `"05 January 2024"` and is needed in three
//! shapes: the word form used to pick candidate filings, the `DD/MM/YYYY`
//! form printed inside charge documents, and a compact `YYYYMMDD` form for
//! file names. All three are rendered from one parsed [`NaiveDate`].

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{DateFormatError, Result};

const MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june",
    "july", "august", "september", "october", "november", "december",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedDate {
    pub month_in_word: String,
    pub month_in_num: String,
    pub filename_date: String,
}

impl NormalizedDate {
    /// Parses `<day> <full month name> <year>`. No other layout is tried.
    pub fn parse(date_str: &str) -> Result<Self> {
        let date = parse_day_month_year(date_str).ok_or_else(|| DateFormatError::new(date_str))?;
        Ok(Self::from_date(date))
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            month_in_word: date.format("%d %B %Y").to_string(),
            month_in_num: date.format("%d/%m/%Y").to_string(),
            filename_date: date.format("%Y%m%d").to_string(),
        }
    }

    /// Month name as written in `month_in_word`, e.g. `"March"`.
    pub fn month_name(&self) -> &str {
        self.month_in_word.split_whitespace().nth(1).unwrap_or_default()
    }

    /// Whether a filing-history description mentions this date's month.
    /// Case-sensitive substring test, the way registry listings spell months.
    pub fn mentioned_in(&self, description: &str) -> bool {
        let month = self.month_name();
        !month.is_empty() && description.contains(month)
    }
}

/// Shorthand for [`NormalizedDate::parse`].
pub fn normalize(date_str: &str) -> Result<NormalizedDate> {
    NormalizedDate::parse(date_str)
}

fn parse_day_month_year(input: &str) -> Option<NaiveDate> {
    if input != input.trim() {
        return None;
    }
    let tokens: Vec<&str> = input.split_whitespace().collect();
    let [day, month, year] = tokens.as_slice() else {
        return None;
    };

    // chrono's %B also accepts abbreviations; only full names are valid here
    if !MONTHS.contains(&month.to_ascii_lowercase().as_str()) {
        return None;
    }
    if !day.chars().all(|c| c.is_ascii_digit()) || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if year.len() != 4 || day.len() > 2 {
        return None;
    }

    NaiveDate::parse_from_str(&format!("{day} {month} {year}"), "%d %B %Y")
        .ok()
        .filter(|date| date.year() >= 1)
}
