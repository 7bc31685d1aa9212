//! Deterministic execution of validated plans.
//!
//! Dispatch is a closed match over the plan's operation name; each operation
//! maps to exactly one pure computation over fetched sensor data. The engine
//! records one trace step per logical stage (fetch, filter, aggregate,
//! finalize) with the point counts consumed, so a result can be audited
//! without re-running the query. It never retries, and never calls back into
//! the LLM or the planner.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::BuildingProfile;
use crate::domain::{
    Bucket, Cadence, ComparisonRow, ExecutionPlan, ExecutionResult, ParamValue, ResultValue,
    SensorId, SensorSeries, Statistic, SummaryStats, TimeRange,
};
use crate::errors::ExecutionError;
use crate::ports::SensorStore;
use crate::stats;
use crate::trace::{TraceRecorder, TraceStep};

pub struct Engine {
    store: Arc<dyn SensorStore>,
    profile: Arc<BuildingProfile>,
}

impl Engine {
    pub fn new(store: Arc<dyn SensorStore>, profile: Arc<BuildingProfile>) -> Self {
        Self { store, profile }
    }

    pub async fn execute(&self, plan: &ExecutionPlan) -> Result<ExecutionResult, ExecutionError> {
        self.execute_with_trace(plan, TraceRecorder::new()).await
    }

    /// Runs the plan, appending engine stages to a recorder the caller may
    /// have seeded with earlier pipeline stages.
    pub async fn execute_with_trace(
        &self,
        plan: &ExecutionPlan,
        mut trace: TraceRecorder,
    ) -> Result<ExecutionResult, ExecutionError> {
        let sensor_ids = plan_sensor_ids(plan)?;
        let range = *binding(plan, "range")?
            .as_time_range()
            .ok_or_else(|| ExecutionError::MalformedPlan("range".to_string()))?;

        let mut series = self.store.fetch(&sensor_ids, &range).await?;
        let fetched: usize = series.iter().map(|s| s.points.len()).sum();
        trace.record(
            TraceStep::new("fetch")
                .with_detail("series", series.len().to_string())
                .with_detail("points_fetched", fetched.to_string()),
        );

        let remaining = filter_series(&mut series, &range);
        trace.record(
            TraceStep::new("filter")
                .with_detail("points_dropped", (fetched - remaining).to_string())
                .with_detail("points_remaining", remaining.to_string()),
        );
        if remaining == 0 {
            return Err(ExecutionError::NoData);
        }

        let value = compute(plan, &series)?;
        trace.record(
            TraceStep::new("aggregate")
                .with_detail("operation", plan.operation().to_string())
                .with_detail("points_consumed", remaining.to_string()),
        );

        // A count is dimensionless; everything else is in the sensor's unit.
        let unit = if plan.operation() == "count_above" {
            None
        } else {
            sensor_ids
                .first()
                .and_then(|id| self.profile.sensor(id))
                .map(|sensor| sensor.unit.clone())
        };
        trace.record(TraceStep::new("finalize").with_detail("result_kind", value.kind()));

        tracing::debug!(
            operation = plan.operation(),
            points = remaining,
            result_kind = value.kind(),
            "plan executed"
        );
        Ok(ExecutionResult {
            operation: plan.operation().to_string(),
            unit,
            value,
            trace: trace.freeze(),
        })
    }
}

fn binding<'a>(plan: &'a ExecutionPlan, name: &str) -> Result<&'a ParamValue, ExecutionError> {
    plan.binding(name).ok_or_else(|| ExecutionError::MalformedPlan(name.to_string()))
}

fn plan_sensor_ids(plan: &ExecutionPlan) -> Result<Vec<SensorId>, ExecutionError> {
    if let Some(value) = plan.binding("sensor_ids") {
        let ids = value
            .as_sensor_id_list()
            .ok_or_else(|| ExecutionError::MalformedPlan("sensor_ids".to_string()))?;
        return Ok(ids.to_vec());
    }
    let id = binding(plan, "sensor_id")?
        .as_sensor_id()
        .ok_or_else(|| ExecutionError::MalformedPlan("sensor_id".to_string()))?;
    Ok(vec![id.clone()])
}

/// Drops out-of-range and non-finite points, then time-orders what is left.
/// Returns the remaining point count.
fn filter_series(series: &mut [SensorSeries], range: &TimeRange) -> usize {
    for entry in series.iter_mut() {
        entry.points.retain(|point| point.value.is_finite() && range.contains(point.timestamp));
        entry.points.sort_by_key(|point| point.timestamp);
    }
    series.iter().map(|entry| entry.points.len()).sum()
}

fn compute(plan: &ExecutionPlan, series: &[SensorSeries]) -> Result<ResultValue, ExecutionError> {
    match plan.operation() {
        "average" => scalar(series, Statistic::Mean),
        "minimum" => scalar(series, Statistic::Min),
        "maximum" => scalar(series, Statistic::Max),
        "total" => scalar(series, Statistic::Sum),
        "stddev" => {
            let values = flatten(series);
            stats::sample_std_dev(&values).map(ResultValue::Scalar).ok_or_else(|| {
                ExecutionError::InsufficientData(
                    "standard deviation requires at least two readings".to_string(),
                )
            })
        }
        "count_above" => {
            let threshold = binding(plan, "threshold")?
                .as_threshold()
                .ok_or_else(|| ExecutionError::MalformedPlan("threshold".to_string()))?;
            let values = flatten(series);
            Ok(ResultValue::Scalar(stats::count_above(&values, threshold) as f64))
        }
        "aggregate" => {
            let cadence = binding(plan, "cadence")?
                .as_cadence()
                .ok_or_else(|| ExecutionError::MalformedPlan("cadence".to_string()))?;
            let statistic = plan_statistic(plan)?;
            aggregate(series, cadence, statistic)
        }
        "compare" => compare(series, plan_statistic(plan)?),
        "summary" => summarize(series),
        other => Err(ExecutionError::UnsupportedOperation(other.to_string())),
    }
}

fn plan_statistic(plan: &ExecutionPlan) -> Result<Statistic, ExecutionError> {
    binding(plan, "statistic")?
        .as_statistic()
        .ok_or_else(|| ExecutionError::MalformedPlan("statistic".to_string()))
}

fn flatten(series: &[SensorSeries]) -> Vec<f64> {
    series.iter().flat_map(|entry| entry.points.iter().map(|point| point.value)).collect()
}

fn scalar(series: &[SensorSeries], statistic: Statistic) -> Result<ResultValue, ExecutionError> {
    let values = flatten(series);
    stats::apply_statistic(statistic, &values)
        .map(ResultValue::Scalar)
        .ok_or(ExecutionError::NoData)
}

fn aggregate(
    series: &[SensorSeries],
    cadence: Cadence,
    statistic: Statistic,
) -> Result<ResultValue, ExecutionError> {
    let mut groups: BTreeMap<DateTime<Utc>, Vec<f64>> = BTreeMap::new();
    for entry in series {
        for point in &entry.points {
            groups.entry(stats::bucket_start(point.timestamp, cadence)).or_default().push(point.value);
        }
    }

    let mut buckets = Vec::with_capacity(groups.len());
    for (start, values) in groups {
        let Some(value) = stats::apply_statistic(statistic, &values) else {
            continue;
        };
        buckets.push(Bucket { start, value, point_count: values.len() });
    }
    Ok(ResultValue::Bucketed(buckets))
}

fn compare(series: &[SensorSeries], statistic: Statistic) -> Result<ResultValue, ExecutionError> {
    let mut ranked: Vec<(SensorId, f64)> = Vec::new();
    for entry in series {
        let values: Vec<f64> = entry.points.iter().map(|point| point.value).collect();
        if let Some(value) = stats::apply_statistic(statistic, &values) {
            ranked.push((entry.sensor_id.clone(), value));
        }
    }
    if ranked.len() < 2 {
        return Err(ExecutionError::InsufficientData(
            "comparison requires data from at least two sensors".to_string(),
        ));
    }

    // Descending by value; sensor id breaks ties so the ranking is total.
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.0.cmp(&b.0)));
    let highest = ranked[0].1;
    let rows = ranked
        .into_iter()
        .enumerate()
        .map(|(index, (sensor_id, value))| ComparisonRow {
            sensor_id,
            value,
            rank: index + 1,
            percent_of_highest: if highest != 0.0 { value / highest * 100.0 } else { 0.0 },
        })
        .collect();
    Ok(ResultValue::Comparison(rows))
}

fn summarize(series: &[SensorSeries]) -> Result<ResultValue, ExecutionError> {
    let mut values = flatten(series);
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    if values.is_empty() {
        return Err(ExecutionError::NoData);
    }

    let summary = SummaryStats {
        count: values.len(),
        mean: stats::mean(&values).unwrap_or(0.0),
        std_dev: stats::sample_std_dev(&values),
        min: values[0],
        q1: stats::quantile(&values, 0.25).unwrap_or(values[0]),
        median: stats::quantile(&values, 0.5).unwrap_or(values[0]),
        q3: stats::quantile(&values, 0.75).unwrap_or(values[0]),
        max: values[values.len() - 1],
    };
    Ok(ResultValue::Summary(summary))
}
