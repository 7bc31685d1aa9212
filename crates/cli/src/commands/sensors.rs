use atrium_core::config::AppConfig;

use super::CommandResult;

pub fn run(config: &AppConfig) -> CommandResult {
    let profile = &config.building;
    let mut lines = vec![format!(
        "known sensors (data retained for {} days):",
        profile.retention_days
    )];
    for sensor in &profile.sensors {
        lines.push(format!(
            "- {}: {} in {} ({})",
            sensor.id, sensor.kind, sensor.location, sensor.unit
        ));
    }
    CommandResult::success("sensors", lines.join("\n"))
}
