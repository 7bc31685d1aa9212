pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use atrium_core::config::{AppConfig, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "atrium",
    about = "Atrium building analytics CLI",
    long_about = "Ask natural language questions about building sensor telemetry, inspect the \
                  operation catalog, and review effective configuration.",
    after_help = "Examples:\n  atrium ask \"average temperature in room 204 last week\" --offline\n  atrium operations\n  atrium config"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to the atrium.toml config file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Answer a natural language question about building sensor data")]
    Ask {
        query: String,
        #[arg(long, help = "Use the seeded in-memory store instead of the sensor API")]
        offline: bool,
        #[arg(long, help = "Include the execution trace in the output")]
        trace: bool,
    },
    #[command(about = "List the operations the catalog permits, with their parameters")]
    Operations,
    #[command(about = "List the sensors the building profile knows about")]
    Sensors,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
}

fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        LogFormat::Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    // Config loads before anything else; a broken file fails every command
    // the same way.
    let config = match AppConfig::load(config_path) {
        Ok(config) => config,
        Err(error) => {
            let result =
                commands::CommandResult::failure("config", "config", error.to_string(), 2);
            println!("{}", result.output);
            return ExitCode::from(result.exit_code);
        }
    };
    init_logging(&config);

    let result = match cli.command {
        Command::Ask { query, offline, trace } => {
            commands::ask::run(&query, &config, offline, trace).await
        }
        Command::Operations => commands::operations::run(),
        Command::Sensors => commands::sensors::run(&config),
        Command::Config => commands::config::run(&config, config_path),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
