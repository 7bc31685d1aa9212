//! Closed catalog of analytics operations.
//!
//! The catalog is the permission boundary of the whole system: only the
//! operations enumerated here may ever execute, and each one declares the
//! exact parameter set the planner will accept. It is built once at boot,
//! fails fast on a malformed definition, and is never mutated afterwards,
//! which is what makes it safe to share across concurrent queries without
//! locking.

use serde::Serialize;
use thiserror::Error;

/// Semantic type of a declared parameter. Drives coercion and the validity
/// predicate applied by the planner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    SensorId,
    SensorIdList,
    TimeRange,
    Statistic,
    Cadence,
    Threshold,
}

impl ParamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SensorId => "sensor_id",
            Self::SensorIdList => "sensor_id_list",
            Self::TimeRange => "time_range",
            Self::Statistic => "statistic",
            Self::Cadence => "cadence",
            Self::Threshold => "threshold",
        }
    }
}

/// Declaration of one operation parameter.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
    /// Raw default for optional parameters, coerced through the same path as
    /// an extracted value.
    pub default: Option<String>,
}

impl ParameterSpec {
    pub fn required(name: &str, kind: ParamKind) -> Self {
        Self { name: name.to_string(), kind, required: true, default: None }
    }

    pub fn optional(name: &str, kind: ParamKind, default: &str) -> Self {
        Self { name: name.to_string(), kind, required: false, default: Some(default.to_string()) }
    }
}

/// Declaration of one executable operation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OperationSpec {
    pub name: String,
    pub summary: String,
    pub parameters: Vec<ParameterSpec>,
}

impl OperationSpec {
    pub fn new(name: &str, summary: &str, parameters: Vec<ParameterSpec>) -> Self {
        Self { name: name.to_string(), summary: summary.to_string(), parameters }
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|parameter| parameter.name == name)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate operation `{0}` in catalog")]
    DuplicateOperation(String),
    #[error("operation `{operation}` declares duplicate parameter `{parameter}`")]
    DuplicateParameter { operation: String, parameter: String },
    #[error("operation `{operation}` declares required parameter `{parameter}` with a default")]
    DefaultOnRequired { operation: String, parameter: String },
    #[error("operation `{operation}` declares optional parameter `{parameter}` without a default")]
    OptionalWithoutDefault { operation: String, parameter: String },
}

/// Immutable, process-wide operation registry.
pub struct Catalog {
    operations: Vec<OperationSpec>,
}

impl Catalog {
    /// Builds a catalog, rejecting malformed definitions up front so a bad
    /// deployment fails at boot instead of at query time.
    pub fn new(operations: Vec<OperationSpec>) -> Result<Self, CatalogError> {
        for (index, operation) in operations.iter().enumerate() {
            if operations[..index].iter().any(|other| other.name == operation.name) {
                return Err(CatalogError::DuplicateOperation(operation.name.clone()));
            }
            for (p_index, parameter) in operation.parameters.iter().enumerate() {
                if operation.parameters[..p_index].iter().any(|other| other.name == parameter.name)
                {
                    return Err(CatalogError::DuplicateParameter {
                        operation: operation.name.clone(),
                        parameter: parameter.name.clone(),
                    });
                }
                if parameter.required && parameter.default.is_some() {
                    return Err(CatalogError::DefaultOnRequired {
                        operation: operation.name.clone(),
                        parameter: parameter.name.clone(),
                    });
                }
                if !parameter.required && parameter.default.is_none() {
                    return Err(CatalogError::OptionalWithoutDefault {
                        operation: operation.name.clone(),
                        parameter: parameter.name.clone(),
                    });
                }
            }
        }
        Ok(Self { operations })
    }

    /// The built-in operation set recognized by the planner and engine.
    pub fn builtin() -> Result<Self, CatalogError> {
        use ParamKind::*;

        let sensor_and_range = || {
            vec![
                ParameterSpec::required("sensor_id", SensorId),
                ParameterSpec::required("range", TimeRange),
            ]
        };

        Self::new(vec![
            OperationSpec::new("average", "Mean value over a time range", sensor_and_range()),
            OperationSpec::new("minimum", "Lowest value over a time range", sensor_and_range()),
            OperationSpec::new("maximum", "Highest value over a time range", sensor_and_range()),
            OperationSpec::new("total", "Sum of values over a time range", sensor_and_range()),
            OperationSpec::new(
                "stddev",
                "Sample standard deviation over a time range",
                sensor_and_range(),
            ),
            OperationSpec::new(
                "count_above",
                "Number of readings above a threshold",
                vec![
                    ParameterSpec::required("sensor_id", SensorId),
                    ParameterSpec::required("range", TimeRange),
                    ParameterSpec::required("threshold", Threshold),
                ],
            ),
            OperationSpec::new(
                "aggregate",
                "Bucketed statistic at hourly, daily, or weekly cadence",
                vec![
                    ParameterSpec::required("sensor_id", SensorId),
                    ParameterSpec::required("range", TimeRange),
                    ParameterSpec::required("cadence", Cadence),
                    ParameterSpec::optional("statistic", Statistic, "mean"),
                ],
            ),
            OperationSpec::new(
                "compare",
                "Ranked statistic across two or more sensors",
                vec![
                    ParameterSpec::required("sensor_ids", SensorIdList),
                    ParameterSpec::required("range", TimeRange),
                    ParameterSpec::optional("statistic", Statistic, "mean"),
                ],
            ),
            OperationSpec::new(
                "summary",
                "Descriptive statistics over a time range",
                sensor_and_range(),
            ),
        ])
    }

    pub fn lookup(&self, name: &str) -> Option<&OperationSpec> {
        self.operations.iter().find(|operation| operation.name == name)
    }

    pub fn operations(&self) -> &[OperationSpec] {
        &self.operations
    }
}

#[cfg(test)]
mod tests {
    use super::{Catalog, CatalogError, OperationSpec, ParamKind, ParameterSpec};

    #[test]
    fn builtin_catalog_is_well_formed() {
        let catalog = Catalog::builtin().expect("builtin catalog must construct");
        assert!(catalog.lookup("average").is_some());
        assert!(catalog.lookup("compare").is_some());
        assert!(catalog.lookup("bogus").is_none());
        assert_eq!(catalog.operations().len(), 9);
    }

    #[test]
    fn every_builtin_operation_takes_a_time_range() {
        let catalog = Catalog::builtin().expect("builtin catalog must construct");
        for operation in catalog.operations() {
            assert!(
                operation.parameter("range").is_some(),
                "operation {} has no range parameter",
                operation.name
            );
        }
    }

    #[test]
    fn duplicate_operation_names_are_rejected() {
        let spec = || OperationSpec::new("average", "", vec![]);
        let result = Catalog::new(vec![spec(), spec()]);
        assert_eq!(result.err(), Some(CatalogError::DuplicateOperation("average".to_string())));
    }

    #[test]
    fn required_parameter_with_default_is_rejected() {
        let mut parameter = ParameterSpec::required("range", ParamKind::TimeRange);
        parameter.default = Some("last week".to_string());
        let result = Catalog::new(vec![OperationSpec::new("average", "", vec![parameter])]);
        assert!(matches!(result, Err(CatalogError::DefaultOnRequired { .. })));
    }

    #[test]
    fn optional_parameter_without_default_is_rejected() {
        let mut parameter = ParameterSpec::optional("statistic", ParamKind::Statistic, "mean");
        parameter.default = None;
        let result = Catalog::new(vec![OperationSpec::new("aggregate", "", vec![parameter])]);
        assert!(matches!(result, Err(CatalogError::OptionalWithoutDefault { .. })));
    }
}
