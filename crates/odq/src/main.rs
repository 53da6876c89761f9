use clap::Parser;
use odata_client::localizer::DefaultLocalizer;
use std::process::ExitCode;

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands, ConfigCommands};
use commands::config::{load_config, ConfigSetOptions};
use commands::{CommandContext, CommandError};

/// Environment variable that overrides `RUST_LOG` for odq.
const ENV_LOG: &str = "ODQ_LOG";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                let error_json = serde_json::json!({
                    "error": {
                        "code": error_code(&e),
                        "message": error_message(&e),
                        "status": match &e {
                            CommandError::Query(q) => q.status(),
                            _ => None,
                        },
                    }
                });
                eprintln!("{}", error_json);
            } else {
                eprintln!("Error: {}", error_message(&e));
            }
            error_exit_code(&e)
        }
    }
}

/// Logs go to stderr so table and JSON output stay clean.
fn init_logging(cli: &Cli) {
    let filter = if cli.verbose {
        "debug".to_string()
    } else {
        std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "warn".to_string())
    };

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .compact()
        .with_env_filter(filter)
        .init();
}

async fn run(cli: &Cli) -> commands::Result<()> {
    let ctx = CommandContext::from_cli(cli);

    match &cli.command {
        Commands::Query(args) => {
            let config = load_config()?;
            commands::query::execute(&ctx, args, &config).await
        }
        Commands::Url(args) => {
            let config = load_config()?;
            commands::query::execute_url(&ctx, args, &config)
        }
        Commands::Config { command } => match command {
            None | Some(ConfigCommands::Show) => commands::config::execute_show(&ctx),
            Some(ConfigCommands::Path) => commands::config::execute_path(&ctx),
            Some(ConfigCommands::Set { key, value }) => {
                let opts = ConfigSetOptions {
                    key: key.clone(),
                    value: value.clone(),
                };
                commands::config::execute_set(&ctx, &opts)
            }
        },
        Commands::Completions { shell } => Ok(commands::completions::execute(shell)?),
    }
}

/// Query errors print their localized message; others their display text.
fn error_message(e: &CommandError) -> String {
    match e {
        CommandError::Query(q) => q.localized(&DefaultLocalizer),
        other => other.to_string(),
    }
}

/// Returns the error code string for JSON output.
fn error_code(e: &CommandError) -> &'static str {
    match e {
        CommandError::Filter(_) => "FILTER_ERROR",
        CommandError::Query(q) => q.localization_key(),
        CommandError::Config(_) => "CONFIG_ERROR",
        CommandError::Io(_) => "IO_ERROR",
        CommandError::Json(_) => "JSON_ERROR",
    }
}

/// Returns the exit code for an error.
fn error_exit_code(e: &CommandError) -> ExitCode {
    match e {
        CommandError::Config(_) => ExitCode::from(5),
        CommandError::Filter(_) => ExitCode::from(1),
        CommandError::Query(_) => ExitCode::from(2),
        CommandError::Io(_) => ExitCode::from(3),
        CommandError::Json(_) => ExitCode::from(1),
    }
}
