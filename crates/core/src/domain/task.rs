use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Sentinel operation name used when intent extraction produced nothing usable.
///
/// The planner resolves it like any other name and reports `UnknownOperation`,
/// keeping validation as the single choke point for bad extractions.
pub const UNRECOGNIZED_OPERATION: &str = "unrecognized";

/// Structured intent as extracted from natural language. Untrusted: the
/// operation may not exist and parameter values may be missing or malformed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateTask {
    pub operation: String,
    pub parameters: BTreeMap<String, String>,
}

impl CandidateTask {
    pub fn new(operation: impl Into<String>) -> Self {
        Self { operation: operation.into(), parameters: BTreeMap::new() }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn unrecognized() -> Self {
        Self::new(UNRECOGNIZED_OPERATION)
    }

    pub fn is_unrecognized(&self) -> bool {
        self.operation == UNRECOGNIZED_OPERATION
    }
}
