//! Append-only audit log of pipeline stages.
//!
//! A `TraceRecorder` collects steps while a query runs and is frozen into an
//! immutable `Trace` when execution finishes. The frozen trace travels inside
//! the `ExecutionResult` so a caller can audit what was computed without
//! re-running the query.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One recorded stage with its consumed/produced counts.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TraceStep {
    pub stage: String,
    pub details: BTreeMap<String, String>,
    pub recorded_at: DateTime<Utc>,
    /// Wall time the stage took, measured by the recorder from the previous
    /// step (or from recorder creation for the first step).
    pub duration_ms: u64,
}

impl TraceStep {
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            details: BTreeMap::new(),
            recorded_at: Utc::now(),
            duration_ms: 0,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// Mutable collector used while a query is in flight.
#[derive(Debug)]
pub struct TraceRecorder {
    steps: Vec<TraceStep>,
    last_mark: Instant,
}

impl Default for TraceRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self { steps: Vec::new(), last_mark: Instant::now() }
    }

    /// Appends the step, stamping it with the time elapsed since the
    /// previous one.
    pub fn record(&mut self, mut step: TraceStep) {
        let now = Instant::now();
        step.duration_ms = now.duration_since(self.last_mark).as_millis() as u64;
        self.last_mark = now;
        self.steps.push(step);
    }

    pub fn freeze(self) -> Trace {
        Trace { steps: self.steps }
    }
}

/// Frozen, read-only trace. No mutation API by design.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Trace {
    steps: Vec<TraceStep>,
}

impl Trace {
    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    pub fn stage(&self, name: &str) -> Option<&TraceStep> {
        self.steps.iter().find(|step| step.stage == name)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::{TraceRecorder, TraceStep};

    #[test]
    fn recorder_stamps_elapsed_time_per_step() {
        let mut recorder = TraceRecorder::new();
        thread::sleep(Duration::from_millis(10));
        recorder.record(TraceStep::new("fetch"));
        recorder.record(TraceStep::new("filter"));

        let trace = recorder.freeze();
        assert!(trace.stage("fetch").unwrap().duration_ms >= 10);
        // The second step is measured from the first, not from creation.
        assert!(trace.stage("filter").unwrap().duration_ms < 10);
    }

    #[test]
    fn recorder_preserves_stage_order_and_details() {
        let mut recorder = TraceRecorder::new();
        recorder.record(TraceStep::new("fetch").with_detail("points_fetched", "48"));
        recorder.record(TraceStep::new("aggregate").with_detail("points_consumed", "48"));

        let trace = recorder.freeze();
        let stages = trace.steps().iter().map(|step| step.stage.as_str()).collect::<Vec<_>>();
        assert_eq!(stages, vec!["fetch", "aggregate"]);
        assert_eq!(
            trace.stage("fetch").and_then(|step| step.details.get("points_fetched")).map(String::as_str),
            Some("48")
        );
    }
}
