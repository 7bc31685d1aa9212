//! End-to-end query orchestration.
//!
//! One pass through the constrained loop per query: extract, validate,
//! execute, explain. The pipeline owns the correlation id for the run and
//! seeds the trace recorder so extraction and validation show up next to the
//! engine's own stages in the frozen trace.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use atrium_core::catalog::Catalog;
use atrium_core::config::BuildingProfile;
use atrium_core::{
    Engine, ExecutionPlan, ExecutionResult, PipelineError, Planner, SensorStore, TraceRecorder,
    TraceStep,
};

use crate::explain::{describe_error, ExplanationGenerator};
use crate::extractor::IntentExtractor;
use crate::llm::LlmClient;

/// Everything a caller can learn from one answered query: the prose answer,
/// the validated plan that ran, and the result with its frozen trace.
#[derive(Debug)]
pub struct QueryOutcome {
    pub answer: String,
    pub plan: ExecutionPlan,
    pub result: ExecutionResult,
}

pub struct Pipeline {
    extractor: IntentExtractor,
    planner: Planner,
    engine: Engine,
    explainer: ExplanationGenerator,
}

impl Pipeline {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        store: Arc<dyn SensorStore>,
        catalog: Arc<Catalog>,
        profile: Arc<BuildingProfile>,
    ) -> Self {
        Self {
            extractor: IntentExtractor::new(llm.clone(), catalog.clone(), profile.clone()),
            planner: Planner::new(catalog, profile.clone()),
            engine: Engine::new(store, profile),
            explainer: ExplanationGenerator::new(llm),
        }
    }

    pub async fn run_query(&self, query: &str) -> Result<QueryOutcome, PipelineError> {
        self.run_query_at(query, Utc::now()).await
    }

    /// Runs one query against an explicit `now`, which anchors relative time
    /// ranges and the retention check.
    pub async fn run_query_at(
        &self,
        query: &str,
        now: DateTime<Utc>,
    ) -> Result<QueryOutcome, PipelineError> {
        let correlation_id = Uuid::new_v4();
        tracing::info!(
            event_name = "query_received",
            correlation_id = %correlation_id,
            query_len = query.len(),
            "processing natural language query"
        );

        let candidate = self.extractor.extract(query, now).await;
        let mut trace = TraceRecorder::new();
        trace.record(
            TraceStep::new("extract")
                .with_detail("operation", candidate.operation.clone())
                .with_detail("parameters", candidate.parameters.len().to_string()),
        );

        let plan = self.planner.validate_at(&candidate, now).map_err(|error| {
            tracing::warn!(
                event_name = "plan_rejected",
                correlation_id = %correlation_id,
                operation = %candidate.operation,
                error = %error,
                "candidate task failed validation"
            );
            PipelineError::from(error)
        })?;
        trace.record(
            TraceStep::new("validate")
                .with_detail("operation", plan.operation().to_string())
                .with_detail("bindings", plan.bindings().len().to_string()),
        );

        let result = self.engine.execute_with_trace(&plan, trace).await.map_err(|error| {
            tracing::warn!(
                event_name = "execution_failed",
                correlation_id = %correlation_id,
                operation = plan.operation(),
                error = %error,
                "plan execution failed"
            );
            PipelineError::from(error)
        })?;

        let answer = self.explainer.explain(query, &result).await;
        tracing::info!(
            event_name = "query_answered",
            correlation_id = %correlation_id,
            operation = %result.operation,
            result_kind = result.value.kind(),
            "query answered"
        );
        Ok(QueryOutcome { answer, plan, result })
    }

    /// Prose for a failed query, suitable for showing to the person who
    /// asked. Kept on the pipeline so callers do not reach into `explain`.
    pub fn describe_failure(&self, query: &str, error: &PipelineError) -> String {
        describe_error(query, error)
    }
}
