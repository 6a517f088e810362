pub mod commands;
pub mod render;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use replen_core::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};

use crate::commands::consolidate::ConsolidateArgs;
use crate::commands::export::ExportArgs;
use crate::commands::recommend::RecommendArgs;

#[derive(Debug, Parser)]
#[command(
    name = "replen",
    about = "Purchase recommendation and cost normalization CLI",
    long_about = "Compute per-market reorder recommendations, tax-normalized costs, and the \
                  consolidated cross-market purchase view from loaded data snapshots.",
    after_help = "Examples:\n  replen recommend --market domestic\n  replen consolidate \
                  --informe informe.csv --period-start 2026-01-01 --period-end 2026-01-31\n  \
                  replen config"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a replen.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Log level override (trace|debug|info|warn|error)")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Compute the recommendation table for one market")]
    Recommend(RecommendArgs),
    #[command(about = "Merge both markets into the consolidated purchase view")]
    Consolidate(ConsolidateArgs),
    #[command(about = "Write the consolidated view to a CSV file")]
    Export(ExportArgs),
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load(LoadOptions {
        config_path: cli.config.clone(),
        require_file: cli.config.is_some(),
        overrides: ConfigOverrides { log_level: cli.log_level.clone(), ..Default::default() },
    }) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("error (config): {error}");
            return ExitCode::from(2);
        }
    };

    init_tracing(&config);
    tracing::debug!(command = ?cli.command, "dispatching");

    let result = match cli.command {
        Command::Recommend(args) => commands::recommend::run(&args, &config),
        Command::Consolidate(args) => commands::consolidate::run(&args, &config),
        Command::Export(args) => commands::export::run(&args, &config),
        Command::Config => commands::config::run(cli.config.as_deref()),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal());

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
