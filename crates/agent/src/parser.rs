//! Defensive parsing of LLM replies into candidate tasks.
//!
//! Models wrap JSON in markdown fences, prepend prose, emit numbers where
//! strings were asked for, or return lists. This module tolerates all of
//! that and normalizes into the raw string parameters the planner expects.
//! Anything unusable yields `None`; the extractor maps that to the sentinel
//! candidate rather than an error.

use serde_json::Value;

use atrium_core::CandidateTask;

pub fn parse_candidate(raw: &str) -> Option<CandidateTask> {
    let json = extract_json(raw)?;
    let value: Value = serde_json::from_str(&json).ok()?;
    let operation = value.get("operation")?.as_str()?.trim();
    if operation.is_empty() {
        return None;
    }

    let mut candidate = CandidateTask::new(operation);
    if let Some(parameters) = value.get("parameters").and_then(Value::as_object) {
        for (name, parameter) in parameters {
            if let Some(raw_value) = normalize_value(parameter) {
                candidate.parameters.insert(name.clone(), raw_value);
            }
        }
    }
    Some(candidate)
}

/// Flattens a JSON parameter value into the raw string form the planner
/// coerces. Nulls and nested objects are dropped, not guessed at.
fn normalize_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> =
                items.iter().filter_map(normalize_value).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(","))
            }
        }
        Value::Null | Value::Object(_) => None,
    }
}

/// Pulls the first JSON object out of a possibly fenced, possibly prose-laden
/// reply. The brace scan is string-aware so braces inside values do not
/// unbalance it.
fn extract_json(raw: &str) -> Option<String> {
    let body = strip_fences(raw);
    let start = body.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, character) in body[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match character {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(body[start..=start + offset].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.split("```").next().unwrap_or(rest)
}

#[cfg(test)]
mod tests {
    use super::parse_candidate;

    #[test]
    fn parses_bare_json_reply() {
        let candidate = parse_candidate(
            r#"{"operation": "average", "parameters": {"sensor_id": "204", "range": "last week"}}"#,
        )
        .unwrap();
        assert_eq!(candidate.operation, "average");
        assert_eq!(candidate.parameters.get("sensor_id").map(String::as_str), Some("204"));
        assert_eq!(candidate.parameters.get("range").map(String::as_str), Some("last week"));
    }

    #[test]
    fn strips_markdown_fences_and_prose() {
        let reply = "Sure! Here is the task:\n```json\n{\"operation\": \"maximum\", \"parameters\": {\"sensor_id\": \"temp-301\", \"range\": \"yesterday\"}}\n```\nLet me know if that helps.";
        // The fence does not start the reply, so the brace scan does the work.
        let candidate = parse_candidate(reply).unwrap();
        assert_eq!(candidate.operation, "maximum");
        assert_eq!(candidate.parameters.get("range").map(String::as_str), Some("yesterday"));
    }

    #[test]
    fn numbers_and_lists_are_normalized_to_strings() {
        let candidate = parse_candidate(
            r#"{"operation": "count_above", "parameters": {"threshold": 72.5, "sensor_ids": ["temp-204", "temp-301"]}}"#,
        )
        .unwrap();
        assert_eq!(candidate.parameters.get("threshold").map(String::as_str), Some("72.5"));
        assert_eq!(
            candidate.parameters.get("sensor_ids").map(String::as_str),
            Some("temp-204,temp-301")
        );
    }

    #[test]
    fn null_parameters_are_dropped_rather_than_guessed() {
        let candidate = parse_candidate(
            r#"{"operation": "average", "parameters": {"sensor_id": "204", "range": null}}"#,
        )
        .unwrap();
        assert!(!candidate.parameters.contains_key("range"));
    }

    #[test]
    fn unusable_replies_yield_none() {
        assert!(parse_candidate("I could not determine a task.").is_none());
        assert!(parse_candidate("").is_none());
        assert!(parse_candidate(r#"{"parameters": {}}"#).is_none());
        assert!(parse_candidate(r#"{"operation": ""}"#).is_none());
        assert!(parse_candidate(r#"{"operation": "average""#).is_none());
    }

    #[test]
    fn braces_inside_string_values_do_not_unbalance_the_scan() {
        let candidate = parse_candidate(
            r#"{"operation": "average", "parameters": {"sensor_id": "a{b}c"}}"#,
        )
        .unwrap();
        assert_eq!(candidate.parameters.get("sensor_id").map(String::as_str), Some("a{b}c"));
    }
}
