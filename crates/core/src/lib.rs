//! Core of the atrium pipeline: the contract between free-form language and
//! deterministic computation.
//!
//! The crate owns the closed operation catalog, the value objects that flow
//! between pipeline stages, the planner that validates untrusted candidate
//! tasks into executable plans, and the engine that runs those plans over
//! sensor data. Everything probabilistic (LLM calls) and everything I/O
//! (HTTP clients) lives behind ports in other crates; correctness here never
//! depends on the LLM being right, only on the planner being a complete gate.

pub mod catalog;
pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod planner;
pub mod ports;
pub mod stats;
mod timerange;
pub mod trace;

pub use catalog::{Catalog, CatalogError, OperationSpec, ParamKind, ParameterSpec};
pub use config::{AppConfig, BuildingProfile, ConfigError, LlmConfig, LogFormat, LoggingConfig, SensorApiConfig, SensorInfo};
pub use domain::{
    Bucket, Cadence, CandidateTask, ComparisonRow, ExecutionPlan, ExecutionResult, ParamValue,
    Reading, ResultValue, SensorId, SensorSeries, Statistic, SummaryStats, TimeRange,
    UNRECOGNIZED_OPERATION,
};
pub use engine::Engine;
pub use errors::{AdapterError, ExecutionError, PipelineError, ValidationError};
pub use planner::Planner;
pub use ports::SensorStore;
pub use trace::{Trace, TraceRecorder, TraceStep};
