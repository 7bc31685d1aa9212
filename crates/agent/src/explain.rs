//! Natural-language rendering of frozen execution results.
//!
//! Pure presentation: the numbers come from the `ExecutionResult` and are
//! formatted, never recomputed. When the LLM backend is unavailable the
//! templated rendering stands in, so a query that computed successfully
//! always gets an answer.

use std::fmt::Write as _;
use std::sync::Arc;

use atrium_core::{ExecutionResult, PipelineError, ResultValue, ValidationError};

use crate::llm::LlmClient;
use crate::prompts::explanation_prompt;

pub struct ExplanationGenerator {
    llm: Arc<dyn LlmClient>,
}

impl ExplanationGenerator {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn explain(&self, query: &str, result: &ExecutionResult) -> String {
        let prompt = explanation_prompt(query, result);
        match self.llm.complete(&prompt).await {
            Ok(reply) if !reply.trim().is_empty() => reply.trim().to_string(),
            Ok(_) | Err(_) => {
                tracing::warn!(operation = %result.operation, "falling back to templated explanation");
                format!("In answer to \"{query}\": {}", render_result(result))
            }
        }
    }
}

/// Templated rendering of a result. Also embedded in the explanation prompt
/// as the authoritative statement of the numbers.
pub fn render_result(result: &ExecutionResult) -> String {
    let unit = result.unit.as_deref().unwrap_or("");
    match &result.value {
        ResultValue::Scalar(value) => {
            format!("The {} came out to {}{}{}.", result.operation, format_number(*value), spacer(unit), unit)
        }
        ResultValue::Bucketed(buckets) => {
            let mut text = format!(
                "The {} produced {} buckets:",
                result.operation,
                buckets.len()
            );
            for bucket in buckets {
                let _ = write!(
                    text,
                    "\n- {}: {}{}{} ({} readings)",
                    bucket.start.format("%Y-%m-%d %H:%M"),
                    format_number(bucket.value),
                    spacer(unit),
                    unit,
                    bucket.point_count
                );
            }
            text
        }
        ResultValue::Comparison(rows) => {
            let mut text = format!("The {} ranked {} sensors:", result.operation, rows.len());
            for row in rows {
                let _ = write!(
                    text,
                    "\n{}. {}: {}{}{} ({}% of highest)",
                    row.rank,
                    row.sensor_id,
                    format_number(row.value),
                    spacer(unit),
                    unit,
                    format_number(row.percent_of_highest)
                );
            }
            text
        }
        ResultValue::Summary(summary) => {
            let std_dev = summary
                .std_dev
                .map(format_number)
                .unwrap_or_else(|| "n/a".to_string());
            format!(
                "The {} over {} readings: mean {}, std dev {}, min {}, q1 {}, median {}, q3 {}, max {}{}{}.",
                result.operation,
                summary.count,
                format_number(summary.mean),
                std_dev,
                format_number(summary.min),
                format_number(summary.q1),
                format_number(summary.median),
                format_number(summary.q3),
                format_number(summary.max),
                spacer(unit),
                unit
            )
        }
    }
}

/// Templated message for a failed query, naming the trust zone that failed.
pub fn describe_error(query: &str, error: &PipelineError) -> String {
    match error {
        PipelineError::Validation(ValidationError::UnknownOperation(_)) => format!(
            "I couldn't map \"{query}\" onto a supported analytics operation. \
             Try asking for an average, minimum, maximum, total, comparison, or summary."
        ),
        PipelineError::Validation(validation) => {
            format!("I couldn't run that query: {validation}.")
        }
        PipelineError::Execution(execution) => {
            format!("The query was valid but could not be computed: {execution}.")
        }
    }
}

/// Straightforward display formatting, two decimals at most. Formatting is
/// the only transformation the explanation layer may apply to a number.
fn format_number(value: f64) -> String {
    let text = format!("{value:.2}");
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

fn spacer(unit: &str) -> &'static str {
    if unit.is_empty() {
        ""
    } else {
        " "
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use atrium_core::{
        ExecutionError, ExecutionResult, PipelineError, ResultValue, TraceRecorder,
        ValidationError,
    };

    use super::{describe_error, format_number, render_result, ExplanationGenerator};
    use crate::llm::{LlmClient, LlmError};

    struct DeadLlm;

    #[async_trait]
    impl LlmClient for DeadLlm {
        async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            Err(LlmError::Timeout)
        }
    }

    fn scalar_result(value: f64) -> ExecutionResult {
        ExecutionResult {
            operation: "average".to_string(),
            unit: Some("°F".to_string()),
            value: ResultValue::Scalar(value),
            trace: TraceRecorder::new().freeze(),
        }
    }

    #[test]
    fn scalar_rendering_names_operation_value_and_unit() {
        let text = render_result(&scalar_result(71.3));
        assert!(text.contains("average"));
        assert!(text.contains("71.3"));
        assert!(text.contains("°F"));
    }

    #[test]
    fn count_rendering_carries_no_physical_unit() {
        let result = ExecutionResult {
            operation: "count_above".to_string(),
            unit: None,
            value: ResultValue::Scalar(2.0),
            trace: TraceRecorder::new().freeze(),
        };
        assert_eq!(render_result(&result), "The count_above came out to 2.");
    }

    #[test]
    fn number_formatting_trims_trailing_zeros_only() {
        assert_eq!(format_number(71.3), "71.3");
        assert_eq!(format_number(72.0), "72");
        assert_eq!(format_number(71.25), "71.25");
        assert_eq!(format_number(0.0), "0");
    }

    #[tokio::test]
    async fn dead_llm_falls_back_to_the_template_and_echoes_the_query() {
        let generator = ExplanationGenerator::new(Arc::new(DeadLlm));
        let answer = generator
            .explain("average temperature in room 204 last week", &scalar_result(71.3))
            .await;
        assert!(answer.contains("room 204"));
        assert!(answer.contains("71.3"));
    }

    #[test]
    fn no_data_error_gets_a_templated_message() {
        let text = describe_error(
            "average temperature in room 204 last week",
            &PipelineError::Execution(ExecutionError::NoData),
        );
        assert!(text.contains("no data available"));
    }

    #[test]
    fn validation_error_message_names_the_parameter() {
        let text = describe_error(
            "average temperature on the moon",
            &PipelineError::Validation(ValidationError::InvalidParameter {
                which: "sensor_id".to_string(),
                reason: "`moon` is not a known sensor or location".to_string(),
            }),
        );
        assert!(text.contains("sensor_id"));
        assert!(text.contains("moon"));
    }
}
