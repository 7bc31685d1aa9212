use atrium_core::catalog::{Catalog, ParameterSpec};

use super::CommandResult;

pub fn run() -> CommandResult {
    let catalog = match Catalog::builtin() {
        Ok(catalog) => catalog,
        Err(error) => return CommandResult::failure("operations", "catalog", error.to_string(), 2),
    };

    let mut lines = vec!["supported operations:".to_string()];
    for operation in catalog.operations() {
        let parameters = operation
            .parameters
            .iter()
            .map(describe_parameter)
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("- {}({}): {}", operation.name, parameters, operation.summary));
    }
    CommandResult::success("operations", lines.join("\n"))
}

fn describe_parameter(parameter: &ParameterSpec) -> String {
    match &parameter.default {
        Some(default) => {
            format!("{}: {} = {}", parameter.name, parameter.kind.as_str(), default)
        }
        None => format!("{}: {}", parameter.name, parameter.kind.as_str()),
    }
}
