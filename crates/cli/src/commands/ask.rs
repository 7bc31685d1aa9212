use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;

use atrium_agent::{LlmClient, OllamaClient, Pipeline};
use atrium_core::catalog::Catalog;
use atrium_core::config::AppConfig;
use atrium_core::{PipelineError, SensorStore};
use atrium_data::{InMemorySensorStore, SensorApiClient};

use super::CommandResult;

pub async fn run(query: &str, config: &AppConfig, offline: bool, with_trace: bool) -> CommandResult {
    let pipeline = match build_pipeline(config, offline) {
        Ok(pipeline) => pipeline,
        Err(error) => return CommandResult::failure("ask", "setup", format!("{error:#}"), 2),
    };

    match pipeline.run_query(query).await {
        Ok(outcome) => {
            if with_trace {
                let detail = serde_json::json!({
                    "operation": outcome.result.operation,
                    "unit": outcome.result.unit,
                    "trace": outcome.result.trace,
                });
                CommandResult::success_with_detail("ask", outcome.answer, detail)
            } else {
                CommandResult::success("ask", outcome.answer)
            }
        }
        Err(error) => {
            let message = pipeline.describe_failure(query, &error);
            let error_class = match &error {
                PipelineError::Validation(_) => "validation",
                PipelineError::Execution(_) => "execution",
            };
            CommandResult::failure("ask", error_class, message, 1)
        }
    }
}

fn build_pipeline(config: &AppConfig, offline: bool) -> anyhow::Result<Pipeline> {
    let catalog = Arc::new(Catalog::builtin().context("operation catalog failed to build")?);
    let profile = Arc::new(config.building.clone());
    let llm: Arc<dyn LlmClient> =
        Arc::new(OllamaClient::from_config(&config.llm).context("llm client failed to build")?);
    let store: Arc<dyn SensorStore> = if offline {
        Arc::new(InMemorySensorStore::demo(&profile, Utc::now()))
    } else {
        Arc::new(
            SensorApiClient::from_config(&config.sensor_api)
                .context("sensor API client failed to build")?,
        )
    };
    Ok(Pipeline::new(llm, store, catalog, profile))
}
