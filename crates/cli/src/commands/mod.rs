pub mod config;
pub mod consolidate;
pub mod export;
pub mod recommend;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::Args;

use replen_core::{AppConfig, Period};
use replen_ingest::{load_domestic_snapshot, load_informe, DomesticSnapshot, InformeSnapshot};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

impl CommandResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }

    pub fn failure(error_class: &str, message: impl Into<String>, exit_code: u8) -> Self {
        Self { exit_code, output: format!("error ({error_class}): {}", message.into()) }
    }
}

/// Flags locating the cross-border informe export and the reporting window
/// it covers. The sheet itself does not state its period.
#[derive(Debug, Args)]
pub struct InformeArgs {
    #[arg(long, help = "Path to the cross-border informe CSV export")]
    pub informe: Option<PathBuf>,
    #[arg(long, help = "First day of the period the informe covers (YYYY-MM-DD)")]
    pub period_start: Option<NaiveDate>,
    #[arg(long, help = "Last day of the period the informe covers (YYYY-MM-DD)")]
    pub period_end: Option<NaiveDate>,
}

impl InformeArgs {
    fn resolve(&self) -> Result<(&Path, Period), String> {
        let path = self
            .informe
            .as_deref()
            .ok_or("--informe is required for cross-border data")?;
        let (start, end) = match (self.period_start, self.period_end) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err("--period-start and --period-end are required with --informe".into()),
        };
        let period =
            Period::new(start, end).map_err(|error| format!("invalid informe period: {error}"))?;
        Ok((path, period))
    }
}

pub(crate) fn domestic_snapshot(
    config: &AppConfig,
    snapshot_dir: Option<&Path>,
) -> Result<DomesticSnapshot, CommandResult> {
    let dir = snapshot_dir.unwrap_or(&config.data.snapshot_dir);
    load_domestic_snapshot(dir)
        .map_err(|error| CommandResult::failure("load", error.to_string(), 1))
}

pub(crate) fn informe_snapshot(
    config: &AppConfig,
    args: &InformeArgs,
) -> Result<InformeSnapshot, CommandResult> {
    let (path, period) =
        args.resolve().map_err(|message| CommandResult::failure("usage", message, 2))?;
    load_informe(path, &config.data.informe, period)
        .map_err(|error| CommandResult::failure("load", error.to_string(), 1))
}
