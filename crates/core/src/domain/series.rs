use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a single physical sensor, e.g. `"temp-204"`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SensorId(pub String);

impl SensorId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SensorId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Half-open interval `[start, end)` over UTC instants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Returns `None` when the interval would be empty or inverted.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        if start < end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }

    /// Canonical raw form, re-parseable by the planner.
    pub fn to_raw(&self) -> String {
        format!("{}/{}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start.format("%Y-%m-%d %H:%M"), self.end.format("%Y-%m-%d %H:%M"))
    }
}

/// One timestamped sensor observation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Reading {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Ordered readings for one sensor over the queried range.
///
/// Read-only for the execution engine; fetched fresh per query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorSeries {
    pub sensor_id: SensorId,
    pub range: TimeRange,
    pub points: Vec<Reading>,
}

impl SensorSeries {
    pub fn new(sensor_id: SensorId, range: TimeRange, points: Vec<Reading>) -> Self {
        Self { sensor_id, range, points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::TimeRange;

    #[test]
    fn time_range_rejects_empty_and_inverted_intervals() {
        let start = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 8, 2, 0, 0, 0).unwrap();

        assert!(TimeRange::new(start, end).is_some());
        assert!(TimeRange::new(start, start).is_none());
        assert!(TimeRange::new(end, start).is_none());
    }

    #[test]
    fn time_range_is_half_open() {
        let start = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 8, 2, 0, 0, 0).unwrap();
        let range = TimeRange::new(start, end).unwrap();

        assert!(range.contains(start));
        assert!(!range.contains(end));
    }
}
