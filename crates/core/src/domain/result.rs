use chrono::{DateTime, Utc};
use serde::Serialize;

use super::series::SensorId;
use crate::trace::Trace;

/// One aggregation bucket produced by the `aggregate` operation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Bucket {
    pub start: DateTime<Utc>,
    pub value: f64,
    pub point_count: usize,
}

/// One row of a cross-sensor comparison, ranked descending by value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub sensor_id: SensorId,
    pub value: f64,
    pub rank: usize,
    pub percent_of_highest: f64,
}

/// Descriptive statistics block produced by the `summary` operation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; absent for fewer than two points.
    pub std_dev: Option<f64>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Typed output of one execution, closed over the catalog's result shapes.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResultValue {
    Scalar(f64),
    Bucketed(Vec<Bucket>),
    Comparison(Vec<ComparisonRow>),
    Summary(SummaryStats),
}

impl ResultValue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Bucketed(_) => "bucketed",
            Self::Comparison(_) => "comparison",
            Self::Summary(_) => "summary",
        }
    }
}

/// Final product of the execution engine. Later stages read it but never
/// change it; the explanation pass in particular has no write access to the
/// numbers here.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub operation: String,
    pub unit: Option<String>,
    pub value: ResultValue,
    pub trace: Trace,
}
