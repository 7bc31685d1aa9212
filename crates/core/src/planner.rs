//! The plan validator: the single trust boundary between probabilistic
//! language output and deterministic computation.
//!
//! Every invariant the engine relies on is established here exactly once:
//! the operation exists in the catalog, every required parameter is bound to
//! a coerced value that passed its validity predicate, optional parameters
//! carry their declared defaults, and nothing beyond the declared set leaks
//! through. How the candidate was produced is irrelevant; a rule-based parser
//! could replace the LLM without touching this module.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::catalog::{Catalog, ParamKind, ParameterSpec};
use crate::config::BuildingProfile;
use crate::domain::{Cadence, CandidateTask, ExecutionPlan, ParamValue, SensorId, Statistic};
use crate::errors::ValidationError;
use crate::timerange::parse_time_range;

pub struct Planner {
    catalog: Arc<Catalog>,
    profile: Arc<BuildingProfile>,
}

impl Planner {
    pub fn new(catalog: Arc<Catalog>, profile: Arc<BuildingProfile>) -> Self {
        Self { catalog, profile }
    }

    pub fn validate(&self, task: &CandidateTask) -> Result<ExecutionPlan, ValidationError> {
        self.validate_at(task, Utc::now())
    }

    /// Validates against an explicit `now` so relative ranges and the
    /// retention check are reproducible.
    pub fn validate_at(
        &self,
        task: &CandidateTask,
        now: DateTime<Utc>,
    ) -> Result<ExecutionPlan, ValidationError> {
        let operation = self
            .catalog
            .lookup(&task.operation)
            .ok_or_else(|| ValidationError::UnknownOperation(task.operation.clone()))?;

        let mut bindings = BTreeMap::new();
        for parameter in &operation.parameters {
            let raw = task.parameters.get(&parameter.name).map(String::as_str);
            let raw = match (raw, &parameter.default) {
                (Some(raw), _) => raw,
                (None, Some(default)) => default.as_str(),
                (None, None) => {
                    return Err(ValidationError::MissingParameter {
                        which: parameter.name.clone(),
                    })
                }
            };
            let value = self.coerce(parameter, raw, now).map_err(|reason| {
                ValidationError::InvalidParameter { which: parameter.name.clone(), reason }
            })?;
            bindings.insert(parameter.name.clone(), value);
        }

        // Silent over-specification must not leak into execution.
        for name in task.parameters.keys() {
            if operation.parameter(name).is_none() {
                return Err(ValidationError::UnexpectedParameter { which: name.clone() });
            }
        }

        tracing::debug!(
            operation = %operation.name,
            bindings = bindings.len(),
            "candidate task validated into execution plan"
        );
        Ok(ExecutionPlan::new(operation.name.clone(), bindings))
    }

    fn coerce(
        &self,
        parameter: &ParameterSpec,
        raw: &str,
        now: DateTime<Utc>,
    ) -> Result<ParamValue, String> {
        match parameter.kind {
            ParamKind::SensorId => {
                let sensor = self.resolve_sensor(raw)?;
                Ok(ParamValue::SensorId(sensor))
            }
            ParamKind::SensorIdList => {
                let mut ids: Vec<SensorId> = Vec::new();
                for mention in raw.split(',') {
                    let sensor = self.resolve_sensor(mention)?;
                    if !ids.contains(&sensor) {
                        ids.push(sensor);
                    }
                }
                if ids.len() < 2 {
                    return Err("comparison requires at least two distinct sensors".to_string());
                }
                Ok(ParamValue::SensorIdList(ids))
            }
            ParamKind::TimeRange => {
                let range = parse_time_range(raw, now)?;
                if range.end > now {
                    return Err(format!("range `{raw}` ends in the future"));
                }
                let retention = self
                    .profile
                    .retention_window(now)
                    .ok_or_else(|| "retention window is not configured".to_string())?;
                if range.start < retention.start {
                    return Err(format!(
                        "range `{raw}` starts before the {}-day retention window",
                        self.profile.retention_days
                    ));
                }
                Ok(ParamValue::TimeRange(range))
            }
            ParamKind::Statistic => Statistic::parse(raw)
                .map(ParamValue::Statistic)
                .ok_or_else(|| format!("`{raw}` is not one of mean, min, max, sum")),
            ParamKind::Cadence => Cadence::parse(raw)
                .map(ParamValue::Cadence)
                .ok_or_else(|| format!("`{raw}` is not one of hourly, daily, weekly")),
            ParamKind::Threshold => {
                let threshold = raw
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| format!("`{raw}` is not a number"))?;
                if !threshold.is_finite() {
                    return Err("threshold must be finite".to_string());
                }
                if threshold < self.profile.threshold_min || threshold > self.profile.threshold_max
                {
                    return Err(format!(
                        "threshold {threshold} outside sane bounds [{}, {}]",
                        self.profile.threshold_min, self.profile.threshold_max
                    ));
                }
                Ok(ParamValue::Threshold(threshold))
            }
        }
    }

    fn resolve_sensor(&self, mention: &str) -> Result<SensorId, String> {
        self.profile
            .resolve(mention)
            .map(|sensor| sensor.id.clone())
            .ok_or_else(|| format!("`{}` is not a known sensor or location", mention.trim()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};

    use super::Planner;
    use crate::catalog::Catalog;
    use crate::config::BuildingProfile;
    use crate::domain::{CandidateTask, ParamValue, SensorId, Statistic};
    use crate::errors::ValidationError;

    fn planner() -> Planner {
        Planner::new(
            Arc::new(Catalog::builtin().expect("builtin catalog")),
            Arc::new(BuildingProfile::demo()),
        )
    }

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 21, 10, 0, 0).unwrap()
    }

    #[test]
    fn binds_average_over_room_and_relative_range() {
        let task = CandidateTask::new("average")
            .with_parameter("sensor_id", "204")
            .with_parameter("range", "last week");

        let plan = planner().validate_at(&task, now()).unwrap();
        assert_eq!(plan.operation(), "average");
        assert_eq!(
            plan.binding("sensor_id").and_then(ParamValue::as_sensor_id),
            Some(&SensorId("temp-204".to_string()))
        );
        let range = plan.binding("range").and_then(ParamValue::as_time_range).unwrap();
        assert_eq!(range.start, now() - Duration::days(7));
        assert_eq!(range.end, now());
    }

    #[test]
    fn plan_is_well_formed_for_every_builtin_operation() {
        let catalog = Catalog::builtin().expect("builtin catalog");
        let planner = planner();
        let fill = |name: &str| {
            let mut task = CandidateTask::new(name);
            for parameter in &catalog.lookup(name).unwrap().parameters {
                let raw = match parameter.name.as_str() {
                    "sensor_id" => "temp-204",
                    "sensor_ids" => "temp-204,temp-301",
                    "range" => "yesterday",
                    "cadence" => "hourly",
                    "statistic" => "max",
                    "threshold" => "72.5",
                    other => panic!("unhandled parameter {other}"),
                };
                task = task.with_parameter(parameter.name.clone(), raw);
            }
            task
        };

        for operation in catalog.operations() {
            let plan = planner.validate_at(&fill(&operation.name), now()).unwrap();
            for parameter in &operation.parameters {
                assert!(
                    plan.binding(&parameter.name).is_some(),
                    "{} missing binding for {}",
                    operation.name,
                    parameter.name
                );
            }
            assert_eq!(plan.bindings().len(), operation.parameters.len());
        }
    }

    #[test]
    fn unknown_operation_is_rejected() {
        let task = CandidateTask::new("reboot_hvac");
        assert_eq!(
            planner().validate_at(&task, now()),
            Err(ValidationError::UnknownOperation("reboot_hvac".to_string()))
        );
    }

    #[test]
    fn unrecognized_sentinel_funnels_into_unknown_operation() {
        let task = CandidateTask::unrecognized();
        assert!(matches!(
            planner().validate_at(&task, now()),
            Err(ValidationError::UnknownOperation(_))
        ));
    }

    #[test]
    fn missing_required_parameter_never_reaches_execution() {
        let task = CandidateTask::new("average").with_parameter("sensor_id", "204");
        assert_eq!(
            planner().validate_at(&task, now()),
            Err(ValidationError::MissingParameter { which: "range".to_string() })
        );
    }

    #[test]
    fn undeclared_parameter_is_rejected() {
        let task = CandidateTask::new("average")
            .with_parameter("sensor_id", "204")
            .with_parameter("range", "last week")
            .with_parameter("mode", "turbo");
        assert_eq!(
            planner().validate_at(&task, now()),
            Err(ValidationError::UnexpectedParameter { which: "mode".to_string() })
        );
    }

    #[test]
    fn nonexistent_sensor_is_an_invalid_parameter() {
        let task = CandidateTask::new("average")
            .with_parameter("sensor_id", "room 999")
            .with_parameter("range", "last week");
        let error = planner().validate_at(&task, now()).unwrap_err();
        assert!(matches!(
            error,
            ValidationError::InvalidParameter { ref which, .. } if which == "sensor_id"
        ));
    }

    #[test]
    fn optional_statistic_binds_its_default() {
        let task = CandidateTask::new("compare")
            .with_parameter("sensor_ids", "temp-204,temp-301")
            .with_parameter("range", "last week");
        let plan = planner().validate_at(&task, now()).unwrap();
        assert_eq!(
            plan.binding("statistic").and_then(ParamValue::as_statistic),
            Some(Statistic::Mean)
        );
    }

    #[test]
    fn comparison_needs_two_distinct_sensors() {
        let task = CandidateTask::new("compare")
            .with_parameter("sensor_ids", "temp-204,temp-204")
            .with_parameter("range", "last week");
        let error = planner().validate_at(&task, now()).unwrap_err();
        assert!(matches!(
            error,
            ValidationError::InvalidParameter { ref which, .. } if which == "sensor_ids"
        ));
    }

    #[test]
    fn threshold_outside_bounds_is_rejected() {
        let task = CandidateTask::new("count_above")
            .with_parameter("sensor_id", "204")
            .with_parameter("range", "last week")
            .with_parameter("threshold", "1e12");
        let error = planner().validate_at(&task, now()).unwrap_err();
        assert!(matches!(
            error,
            ValidationError::InvalidParameter { ref which, .. } if which == "threshold"
        ));
    }

    #[test]
    fn future_and_pre_retention_ranges_are_rejected() {
        let future = CandidateTask::new("average")
            .with_parameter("sensor_id", "204")
            .with_parameter("range", "2026-08-20T00:00:00Z/2026-09-01T00:00:00Z");
        assert!(matches!(
            planner().validate_at(&future, now()),
            Err(ValidationError::InvalidParameter { ref which, .. }) if which == "range"
        ));

        let ancient = CandidateTask::new("average")
            .with_parameter("sensor_id", "204")
            .with_parameter("range", "2025-01-01T00:00:00Z/2025-01-02T00:00:00Z");
        assert!(matches!(
            planner().validate_at(&ancient, now()),
            Err(ValidationError::InvalidParameter { ref which, .. }) if which == "range"
        ));
    }

    #[test]
    fn revalidating_a_valid_plan_is_idempotent() {
        let task = CandidateTask::new("aggregate")
            .with_parameter("sensor_id", "204")
            .with_parameter("range", "last week")
            .with_parameter("cadence", "daily");

        let planner = planner();
        let plan = planner.validate_at(&task, now()).unwrap();
        let replanned = planner.validate_at(&plan.as_candidate(), now()).unwrap();
        assert_eq!(plan, replanned);
    }
}
