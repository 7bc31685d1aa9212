use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::series::{SensorId, TimeRange};
use super::task::CandidateTask;

/// Closed vocabulary of per-point reductions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    Mean,
    Min,
    Max,
    Sum,
}

impl Statistic {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mean" | "average" | "avg" => Some(Self::Mean),
            "min" | "minimum" => Some(Self::Min),
            "max" | "maximum" => Some(Self::Max),
            "sum" | "total" => Some(Self::Sum),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Min => "min",
            Self::Max => "max",
            Self::Sum => "sum",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucket width for temporal aggregation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    Hourly,
    Daily,
    Weekly,
}

impl Cadence {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hourly" | "hour" => Some(Self::Hourly),
            "daily" | "day" => Some(Self::Daily),
            "weekly" | "week" => Some(Self::Weekly),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A coerced, predicate-checked parameter value bound into a plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ParamValue {
    SensorId(SensorId),
    SensorIdList(Vec<SensorId>),
    TimeRange(TimeRange),
    Statistic(Statistic),
    Cadence(Cadence),
    Threshold(f64),
}

impl ParamValue {
    /// Canonical raw form; parsing it again through the planner yields an
    /// equal value, which is what makes re-validation idempotent.
    pub fn to_raw(&self) -> String {
        match self {
            Self::SensorId(id) => id.0.clone(),
            Self::SensorIdList(ids) => {
                ids.iter().map(SensorId::as_str).collect::<Vec<_>>().join(",")
            }
            Self::TimeRange(range) => range.to_raw(),
            Self::Statistic(statistic) => statistic.as_str().to_string(),
            Self::Cadence(cadence) => cadence.as_str().to_string(),
            Self::Threshold(threshold) => format!("{threshold}"),
        }
    }

    pub fn as_sensor_id(&self) -> Option<&SensorId> {
        match self {
            Self::SensorId(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_sensor_id_list(&self) -> Option<&[SensorId]> {
        match self {
            Self::SensorIdList(ids) => Some(ids),
            _ => None,
        }
    }

    pub fn as_time_range(&self) -> Option<&TimeRange> {
        match self {
            Self::TimeRange(range) => Some(range),
            _ => None,
        }
    }

    pub fn as_statistic(&self) -> Option<Statistic> {
        match self {
            Self::Statistic(statistic) => Some(*statistic),
            _ => None,
        }
    }

    pub fn as_cadence(&self) -> Option<Cadence> {
        match self {
            Self::Cadence(cadence) => Some(*cadence),
            _ => None,
        }
    }

    pub fn as_threshold(&self) -> Option<f64> {
        match self {
            Self::Threshold(threshold) => Some(*threshold),
            _ => None,
        }
    }
}

/// A fully bound intent, ready for deterministic execution.
///
/// Constructed only by the planner, which guarantees that every required
/// parameter of the referenced operation is bound and that no binding exists
/// outside the operation's declared set. Immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExecutionPlan {
    operation: String,
    bindings: BTreeMap<String, ParamValue>,
}

impl ExecutionPlan {
    pub(crate) fn new(operation: String, bindings: BTreeMap<String, ParamValue>) -> Self {
        Self { operation, bindings }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn binding(&self, name: &str) -> Option<&ParamValue> {
        self.bindings.get(name)
    }

    pub fn bindings(&self) -> &BTreeMap<String, ParamValue> {
        &self.bindings
    }

    /// Recast as a candidate with canonical raw values, e.g. for re-validation.
    pub fn as_candidate(&self) -> CandidateTask {
        let mut candidate = CandidateTask::new(self.operation.clone());
        for (name, value) in &self.bindings {
            candidate.parameters.insert(name.clone(), value.to_raw());
        }
        candidate
    }
}
