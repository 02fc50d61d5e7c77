use anyhow::anyhow;
use chrono::{Days, Local, NaiveDate};

/// Compact date format used by the API's query parameters and bars.
pub const API_DATE_FORMAT: &str = "%Y%m%d";

/// Largest lookback accepted from configuration, about ten years.
pub const MAX_LOOKBACK_DAYS: u32 = 3650;

/// Format `today - days_ago` as YYYYMMDD
pub fn format_date_at(today: NaiveDate, days_ago: u32) -> anyhow::Result<String> {
    let date = today
        .checked_sub_days(Days::new(u64::from(days_ago)))
        .ok_or_else(|| anyhow!("{} days before {} is out of range", days_ago, today))?;
    Ok(date.format(API_DATE_FORMAT).to_string())
}

/// Format a date relative to the local clock as YYYYMMDD
pub fn format_date(days_ago: u32) -> anyhow::Result<String> {
    format_date_at(today_local(), days_ago)
}

pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// Inclusive `(start, end)` window ending today
pub fn lookback_window(today: NaiveDate, days: u32) -> anyhow::Result<(String, String)> {
    Ok((format_date_at(today, days)?, format_date_at(today, 0)?))
}
