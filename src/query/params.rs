//! Parameter parsing shared by the queries.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use super::QueryError;
use crate::storage::TimeWindow;

/// Which end of a date range a bare date stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// 00:00:00.000 local time
    Start,
    /// 23:59:59.999 local time
    End,
}

/// Parse one date bound.
///
/// Accepts an RFC 3339 timestamp, used as-is, or a `YYYY-MM-DD` date,
/// which expands to the start or end of that day in local time.
pub fn parse_date_bound(input: &str, bound: Bound) -> Result<DateTime<Utc>, QueryError> {
    let input = input.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| {
        QueryError::validation(format!(
            "Invalid date '{}': expected YYYY-MM-DD or an RFC 3339 timestamp",
            input
        ))
    })?;

    let time = match bound {
        Bound::Start => NaiveTime::MIN,
        Bound::End => NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN),
    };
    local_to_utc(date.and_time(time), bound)
        .ok_or_else(|| QueryError::validation(format!("Date '{}' does not exist locally", input)))
}

fn local_to_utc(naive: NaiveDateTime, bound: Bound) -> Option<DateTime<Utc>> {
    let resolved = Local.from_local_datetime(&naive);
    let local = match bound {
        Bound::Start => resolved.earliest(),
        Bound::End => resolved.latest(),
    };
    // Midnight can fall inside a DST gap; the day then starts an hour later.
    let local = local.or_else(|| {
        Local
            .from_local_datetime(&(naive + chrono::Duration::hours(1)))
            .earliest()
    })?;
    Some(local.with_timezone(&Utc))
}

/// Parse a required `[start, end]` pair into an inclusive window.
pub fn parse_window(start: Option<&str>, end: Option<&str>) -> Result<TimeWindow, QueryError> {
    let (start, end) = match (start, end) {
        (Some(s), Some(e)) if !s.trim().is_empty() && !e.trim().is_empty() => (s, e),
        _ => {
            return Err(QueryError::validation(
                "startDate and endDate are required",
            ))
        }
    };

    let start_date = parse_date_bound(start, Bound::Start)?;
    let end_date = parse_date_bound(end, Bound::End)?;
    if start_date > end_date {
        return Err(QueryError::validation(format!(
            "startDate {} is after endDate {}",
            start, end
        )));
    }
    Ok(TimeWindow::new(start_date, end_date))
}

/// Parse a card pair given as a JSON array or a comma-separated list.
///
/// Exactly two distinct, non-empty names are accepted.
pub fn parse_combo_spec(input: &str) -> Result<[String; 2], QueryError> {
    let input = input.trim();

    let names: Vec<String> = if input.starts_with('[') {
        serde_json::from_str::<Vec<String>>(input).map_err(|e| {
            QueryError::validation(format!("combo is not a JSON array of names: {}", e))
        })?
    } else {
        input.split(',').map(str::to_string).collect()
    };

    let names: Vec<String> = names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();

    match <[String; 2]>::try_from(names) {
        Ok([a, b]) if a != b => Ok([a, b]),
        Ok(_) => Err(QueryError::validation(
            "combo must name two different cards",
        )),
        Err(names) => Err(QueryError::validation(format!(
            "combo must contain exactly 2 cards, got {}",
            names.len()
        ))),
    }
}

/// A required parameter, or a validation error naming it.
pub(crate) fn required<T>(value: Option<T>, name: &str) -> Result<T, QueryError> {
    value.ok_or_else(|| QueryError::validation(format!("{} is required", name)))
}
