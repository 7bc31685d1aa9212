//! Immutable value objects that connect the pipeline stages.

pub mod plan;
pub mod result;
pub mod series;
pub mod task;

pub use plan::{Cadence, ExecutionPlan, ParamValue, Statistic};
pub use result::{Bucket, ComparisonRow, ExecutionResult, ResultValue, SummaryStats};
pub use series::{Reading, SensorId, SensorSeries, TimeRange};
pub use task::{CandidateTask, UNRECOGNIZED_OPERATION};
