use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use toml::Value;

use atrium_core::config::AppConfig;

use super::CommandResult;

pub fn run(config: &AppConfig, explicit_path: Option<&Path>) -> CommandResult {
    let config_file_path = detect_config_path(explicit_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let source = |key_path: &str, env_key: Option<&str>| {
        field_source(key_path, env_key, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "llm.base_url",
        &config.llm.base_url,
        source("llm.base_url", Some("ATRIUM_LLM_BASE_URL")),
    ));
    lines.push(render_line("llm.model", &config.llm.model, source("llm.model", Some("ATRIUM_LLM_MODEL"))));
    lines.push(render_line(
        "llm.timeout_secs",
        &config.llm.timeout_secs.to_string(),
        source("llm.timeout_secs", None),
    ));

    lines.push(render_line(
        "sensor_api.base_url",
        &config.sensor_api.base_url,
        source("sensor_api.base_url", Some("ATRIUM_SENSOR_API_URL")),
    ));
    let api_token = if config.sensor_api.api_token.is_some() { "<redacted>" } else { "<unset>" };
    lines.push(render_line(
        "sensor_api.api_token",
        api_token,
        source("sensor_api.api_token", Some("ATRIUM_SENSOR_API_TOKEN")),
    ));
    lines.push(render_line(
        "sensor_api.timeout_secs",
        &config.sensor_api.timeout_secs.to_string(),
        source("sensor_api.timeout_secs", None),
    ));

    lines.push(render_line(
        "building.sensors",
        &format!("{} sensors", config.building.sensors.len()),
        source("building.sensors", None),
    ));
    lines.push(render_line(
        "building.retention_days",
        &config.building.retention_days.to_string(),
        source("building.retention_days", None),
    ));
    lines.push(render_line(
        "building.threshold_min",
        &config.building.threshold_min.to_string(),
        source("building.threshold_min", None),
    ));
    lines.push(render_line(
        "building.threshold_max",
        &config.building.threshold_max.to_string(),
        source("building.threshold_max", None),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", Some("ATRIUM_LOG_LEVEL")),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", Some("ATRIUM_LOG_FORMAT")),
    ));

    CommandResult::success("config", lines.join("\n"))
}

/// Mirrors the resolution order the loader uses, so the attribution points at
/// the file that was actually read.
fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = env::var("ATRIUM_CONFIG") {
        return Some(PathBuf::from(path));
    }
    let fallback = PathBuf::from("atrium.toml");
    fallback.exists().then_some(fallback)
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
