use crate::error::{PipelineError, PipelineResult};
use crate::models::{DateRange, TimeRange};
use chrono::{NaiveDate, Utc};

/// Parse a `YYYY-MM-DD` date string
pub fn parse_date(date_str: &str) -> PipelineResult<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .map_err(|e| PipelineError::invalid(format!("invalid date '{}': {}", date_str, e)))
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Resolve user-facing range inputs into a `DateRange`.
///
/// Explicit dates win over a preset. A missing end means `today`; a missing
/// start means `default_lookback_days` before the end.
pub fn resolve_range(
    start: Option<&str>,
    end: Option<&str>,
    preset: Option<TimeRange>,
    default_lookback_days: i64,
    today: NaiveDate,
) -> PipelineResult<DateRange> {
    let end = match end.filter(|s| !s.trim().is_empty()) {
        Some(s) => parse_date(s)?,
        None => today,
    };

    match start.filter(|s| !s.trim().is_empty()) {
        Some(s) => DateRange::new(parse_date(s)?, end),
        None => match preset {
            Some(preset) => DateRange::from_preset(preset, end),
            None => DateRange::last_days(default_lookback_days, end),
        },
    }
}
