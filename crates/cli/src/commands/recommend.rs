use std::path::PathBuf;

use clap::{Args, ValueEnum};
use serde::Serialize;

use replen_core::{
    AppConfig, Market, MarketReport, MarketSnapshot, RecommendationRow, ReplenishmentRuntime,
    RowFailure,
};

use crate::commands::{self, CommandResult, InformeArgs};
use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MarketArg {
    Domestic,
    CrossBorder,
}

#[derive(Debug, Args)]
pub struct RecommendArgs {
    #[arg(long, value_enum, default_value = "domestic")]
    pub market: MarketArg,
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
pub(crate) struct JsonFailure {
    product_id: String,
    error: String,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    market: Market,
    rows: &'a [RecommendationRow],
    failures: Vec<JsonFailure>,
}

pub fn run(args: &RecommendArgs, config: &AppConfig) -> CommandResult {
    let runtime = match ReplenishmentRuntime::from_config(&config.engine) {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::failure("config", error.to_string(), 2),
    };

    let report = match args.market {
        MarketArg::Domestic => {
            let snapshot = match commands::domestic_snapshot(config, args.snapshot_dir.as_deref())
            {
                Ok(snapshot) => snapshot,
                Err(failure) => return failure,
            };
            runtime.market_report(
                MarketSnapshot {
                    market: Market::Domestic,
                    sales: &snapshot.sales,
                    stock: &snapshot.stock,
                    costs: &snapshot.costs,
                },
                args.exclude_customer.as_deref(),
            )
        }
        MarketArg::CrossBorder => {
            let snapshot = match commands::informe_snapshot(config, &args.informe) {
                Ok(snapshot) => snapshot,
                Err(failure) => return failure,
            };
            runtime.market_report(
                MarketSnapshot {
                    market: Market::CrossBorder,
                    sales: &snapshot.sales,
                    stock: &snapshot.stock,
                    costs: &[],
                },
                args.exclude_customer.as_deref(),
            )
        }
    };

    if args.json {
        json_output(&report)
    } else {
        CommandResult::success(render::market_table(&report))
    }
}

fn json_output(report: &MarketReport) -> CommandResult {
    let payload = JsonReport {
        market: report.market,
        rows: &report.rows,
        failures: json_failures(&report.failures),
    };
    match serde_json::to_string_pretty(&payload) {
        Ok(json) => CommandResult::success(json),
        Err(error) => CommandResult::failure("serialization", error.to_string(), 1),
    }
}

pub(crate) fn json_failures(failures: &[RowFailure]) -> Vec<JsonFailure> {
    failures
        .iter()
        .map(|failure| JsonFailure {
            product_id: failure.product_id.as_str().to_string(),
            error: failure.error.to_string(),
        })
        .collect()
}
