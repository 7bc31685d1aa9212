//! Prompt templates for the two LLM calls.
//!
//! The extraction prompt carries the full operation and parameter
//! enumeration, the known sensors, and the data window, so the model has no
//! room to invent operations outside the catalog. Its reply is still treated
//! as untrusted; the planner re-checks everything.

use chrono::{DateTime, Utc};

use atrium_core::catalog::{Catalog, ParameterSpec};
use atrium_core::config::BuildingProfile;
use atrium_core::ExecutionResult;

use crate::explain::render_result;

pub fn intent_extraction_prompt(
    query: &str,
    catalog: &Catalog,
    profile: &BuildingProfile,
    now: DateTime<Utc>,
) -> String {
    let mut operations = String::new();
    for operation in catalog.operations() {
        let parameters = operation
            .parameters
            .iter()
            .map(describe_parameter)
            .collect::<Vec<_>>()
            .join(", ");
        operations.push_str(&format!("- {}({}): {}\n", operation.name, parameters, operation.summary));
    }

    let mut sensors = String::new();
    for sensor in &profile.sensors {
        sensors.push_str(&format!(
            "- {} ({} in {}, unit {})\n",
            sensor.id, sensor.kind, sensor.location, sensor.unit
        ));
    }

    format!(
        "You are a task extraction assistant for a building analytics system.\n\
         Convert the user's question into a structured JSON task.\n\n\
         OPERATIONS (the only ones that exist):\n{operations}\n\
         SENSORS (the only ones that exist):\n{sensors}\n\
         Data is retained for the last {retention} days. Current instant: {now}.\n\n\
         USER QUESTION:\n{query}\n\n\
         Reply with ONLY a JSON object, no markdown, no commentary:\n\
         {{\"operation\": \"<operation name>\", \"parameters\": {{\"<name>\": \"<value>\"}}}}\n\n\
         Time ranges may be an RFC 3339 pair like \
         \"2026-08-01T00:00:00Z/2026-08-08T00:00:00Z\" or a phrase like \
         \"last week\", \"yesterday\", \"last 24 hours\".\n\
         For compare, pass sensor_ids as a comma-separated list.",
        operations = operations,
        sensors = sensors,
        retention = profile.retention_days,
        now = now.to_rfc3339(),
        query = query,
    )
}

fn describe_parameter(parameter: &ParameterSpec) -> String {
    match &parameter.default {
        Some(default) => {
            format!("{}: {} (optional, default {})", parameter.name, parameter.kind.as_str(), default)
        }
        None => format!("{}: {}", parameter.name, parameter.kind.as_str()),
    }
}

pub fn explanation_prompt(query: &str, result: &ExecutionResult) -> String {
    format!(
        "You are explaining a computed analytics result from a building sensor system.\n\n\
         ORIGINAL QUESTION:\n{query}\n\n\
         COMPUTED RESULT (authoritative, do not change any number):\n{rendered}\n\n\
         Write two or three conversational sentences answering the question.\n\
         Mention the operation name `{operation}` and repeat the numbers exactly \
         as given, with their units. Do not recompute, round further, or invent \
         information not present in the result.",
        query = query,
        rendered = render_result(result),
        operation = result.operation,
    )
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use atrium_core::catalog::Catalog;
    use atrium_core::config::BuildingProfile;

    use super::intent_extraction_prompt;

    #[test]
    fn extraction_prompt_enumerates_catalog_and_sensors() {
        let catalog = Catalog::builtin().expect("builtin catalog");
        let profile = BuildingProfile::demo();
        let now = Utc.with_ymd_and_hms(2026, 8, 21, 10, 0, 0).unwrap();

        let prompt = intent_extraction_prompt("how warm is room 204?", &catalog, &profile, now);

        for operation in catalog.operations() {
            assert!(prompt.contains(&operation.name), "prompt missing {}", operation.name);
        }
        assert!(prompt.contains("temp-204"));
        assert!(prompt.contains("90 days"));
        assert!(prompt.contains("how warm is room 204?"));
    }
}
