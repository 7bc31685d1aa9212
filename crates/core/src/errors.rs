use thiserror::Error;

/// Rejections produced by the planner, the sole trust boundary between LLM
/// output and deterministic computation. Always recoverable at the caller
/// level; the offending parameter is named so the message can surface as-is.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown operation `{0}`")]
    UnknownOperation(String),
    #[error("missing required parameter `{which}`")]
    MissingParameter { which: String },
    #[error("invalid parameter `{which}`: {reason}")]
    InvalidParameter { which: String, reason: String },
    #[error("unexpected parameter `{which}` for this operation")]
    UnexpectedParameter { which: String },
}

impl ValidationError {
    /// Parameter the error points at, when it points at one.
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Self::UnknownOperation(_) => None,
            Self::MissingParameter { which }
            | Self::InvalidParameter { which, .. }
            | Self::UnexpectedParameter { which } => Some(which),
        }
    }
}

/// Failures reported by a sensor store implementation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AdapterError {
    #[error("sensor store unavailable: {0}")]
    Unavailable(String),
    #[error("sensor store protocol error: {0}")]
    Protocol(String),
}

/// Terminal failures of a deterministic execution. Never retried: rerunning
/// the same plan over the same unavailable data cannot change the outcome.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("no data available for the requested sensors and range")]
    NoData,
    #[error("insufficient data: {0}")]
    InsufficientData(String),
    #[error("operation `{0}` has no registered computation")]
    UnsupportedOperation(String),
    #[error("plan binding `{0}` is missing or mistyped")]
    MalformedPlan(String),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// Caller-facing taxonomy: which trust zone failed. Extraction failures never
/// appear here because the extractor degrades to a sentinel candidate that
/// surfaces as `UnknownOperation` at validation. Explanation failures are
/// non-fatal and degrade to templated output instead.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

#[cfg(test)]
mod tests {
    use super::ValidationError;

    #[test]
    fn validation_error_names_the_offending_parameter() {
        let error = ValidationError::InvalidParameter {
            which: "sensor_id".to_string(),
            reason: "not a known sensor".to_string(),
        };
        assert_eq!(error.parameter(), Some("sensor_id"));
        assert_eq!(error.to_string(), "invalid parameter `sensor_id`: not a known sensor");
    }

    #[test]
    fn unknown_operation_points_at_no_parameter() {
        assert_eq!(ValidationError::UnknownOperation("foo".to_string()).parameter(), None);
    }
}
