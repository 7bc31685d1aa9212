//! Coercion of raw time-range strings into concrete `[start, end)` instants.
//!
//! Extracted values arrive either as an explicit `start/end` pair (RFC 3339
//! instants or plain dates) or as a small vocabulary of relative phrases.
//! Relative phrases resolve against an explicit `now` so the planner stays
//! testable and re-validation of a bound plan is exact.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::domain::TimeRange;

pub(crate) fn parse_time_range(raw: &str, now: DateTime<Utc>) -> Result<TimeRange, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("empty time range".to_string());
    }

    if let Some((start_raw, end_raw)) = split_pair(trimmed) {
        let start = parse_instant(start_raw, false)?;
        let end = parse_instant(end_raw, true)?;
        return TimeRange::new(start, end)
            .ok_or_else(|| format!("range `{trimmed}` is empty or inverted"));
    }

    let phrase = normalize(trimmed);
    // "today" is the one phrase that can denote an empty interval, exactly
    // at midnight; name that instead of calling the phrase unrecognized.
    if phrase == "today" {
        let today = today_midnight(now);
        return TimeRange::new(today, now)
            .ok_or_else(|| "`today` has no elapsed time yet at exactly midnight".to_string());
    }

    parse_relative(&phrase, now).ok_or_else(|| format!("unrecognized time range `{trimmed}`"))
}

fn today_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_hms_opt(0, 0, 0).map(|naive| naive.and_utc()).unwrap_or(now)
}

/// Splits `start/end` without breaking RFC 3339 dates, which contain `-` but
/// never `/`.
fn split_pair(raw: &str) -> Option<(&str, &str)> {
    let (start, end) = raw.split_once('/')?;
    if start.trim().is_empty() || end.trim().is_empty() {
        return None;
    }
    Some((start.trim(), end.trim()))
}

fn parse_instant(raw: &str, is_end: bool) -> Result<DateTime<Utc>, String> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc())
            .ok_or_else(|| format!("invalid date `{raw}`"))?;
        // A bare end date means "through the end of that day".
        return Ok(if is_end { midnight + Duration::days(1) } else { midnight });
    }
    Err(format!("`{raw}` is not an RFC 3339 instant or YYYY-MM-DD date"))
}

fn parse_relative(phrase: &str, now: DateTime<Utc>) -> Option<TimeRange> {
    let today = today_midnight(now);

    match phrase {
        "last week" | "past week" => TimeRange::new(now - Duration::days(7), now),
        "last month" | "past month" => TimeRange::new(now - Duration::days(30), now),
        "last day" | "last 24 hours" | "past 24 hours" => {
            TimeRange::new(now - Duration::hours(24), now)
        }
        "yesterday" => TimeRange::new(today - Duration::days(1), today),
        _ => parse_last_n(phrase, now),
    }
}

/// `last N hours` / `past N days` style phrases.
fn parse_last_n(phrase: &str, now: DateTime<Utc>) -> Option<TimeRange> {
    let mut words = phrase.split_whitespace();
    let leader = words.next()?;
    if leader != "last" && leader != "past" {
        return None;
    }
    let count = words.next()?.parse::<i64>().ok()?;
    if count <= 0 {
        return None;
    }
    let span = match words.next()? {
        "hour" | "hours" => Duration::hours(count),
        "day" | "days" => Duration::days(count),
        "week" | "weeks" => Duration::days(7 * count),
        _ => return None,
    };
    if words.next().is_some() {
        return None;
    }
    TimeRange::new(now - span, now)
}

fn normalize(raw: &str) -> String {
    raw.to_ascii_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}
