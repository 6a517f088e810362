use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use replen_core::{
    AppConfig, ConsolidatedReport, ConsolidatedRow, Market, MarketSnapshot, ReplenishmentRuntime,
};

use crate::commands::recommend::{json_failures, JsonFailure};
use crate::commands::{self, CommandResult, InformeArgs};
use crate::render;

#[derive(Debug, Args)]
pub struct ConsolidateArgs {
    #[arg(long, help = "Directory holding sales.csv, stock.csv, and costs.csv")]
    pub snapshot_dir: Option<PathBuf>,
    #[command(flatten)]
    pub informe: InformeArgs,
    #[arg(long, help = "Drop this customer's sales from the demand signal")]
    pub exclude_customer: Option<String>,
    #[arg(long, help = "Emit machine-readable JSON output")]
    pub json: bool,
}

#[derive(Serialize)]
struct JsonConsolidated<'a> {
    rows: &'a [ConsolidatedRow],
    domestic_failures: Vec<JsonFailure>,
    cross_border_failures: Vec<JsonFailure>,
}

pub fn run(args: &ConsolidateArgs, config: &AppConfig) -> CommandResult {
    let report = match consolidated_report(
        config,
        args.snapshot_dir.as_deref(),
        &args.informe,
        args.exclude_customer.as_deref(),
    ) {
        Ok(report) => report,
        Err(failure) => return failure,
    };

    if args.json {
        let payload = JsonConsolidated {
            rows: &report.rows,
            domestic_failures: json_failures(&report.domestic.failures),
            cross_border_failures: json_failures(&report.cross_border.failures),
        };
        match serde_json::to_string_pretty(&payload) {
            Ok(json) => CommandResult::success(json),
            Err(error) => CommandResult::failure("serialization", error.to_string(), 1),
        }
    } else {
        let mut failures = report.domestic.failures.clone();
        failures.extend(report.cross_border.failures.clone());
        CommandResult::success(render::consolidated_table(&report.rows, &failures))
    }
}

/// Shared by `consolidate` and `export`: load both snapshots and run the
/// full pipeline.
pub(crate) fn consolidated_report(
    config: &AppConfig,
    snapshot_dir: Option<&std::path::Path>,
    informe: &InformeArgs,
    exclude_customer: Option<&str>,
) -> Result<ConsolidatedReport, CommandResult> {
    let runtime = ReplenishmentRuntime::from_config(&config.engine)
        .map_err(|error| CommandResult::failure("config", error.to_string(), 2))?;

    let domestic = commands::domestic_snapshot(config, snapshot_dir)?;
    let cross_border = commands::informe_snapshot(config, informe)?;

    Ok(runtime.consolidated_report(
        MarketSnapshot {
            market: Market::Domestic,
            sales: &domestic.sales,
            stock: &domestic.stock,
            costs: &domestic.costs,
        },
        MarketSnapshot {
            market: Market::CrossBorder,
            sales: &cross_border.sales,
            stock: &cross_border.stock,
            costs: &[],
        },
        exclude_customer,
    ))
}
