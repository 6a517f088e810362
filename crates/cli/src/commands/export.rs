use std::path::PathBuf;

use clap::Args;

use replen_core::{AppConfig, ConsolidatedRow};

use crate::commands::consolidate::consolidated_report;
use crate::commands::{CommandResult, InformeArgs};

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[arg(long, help = "Destination CSV file")]
    pub output: PathBuf,
    #[arg(long, help = "Directory holding sales.csv, stock.csv, and costs.csv")]
    pub snapshot_dir: Option<PathBuf>,
    #[command(flatten)]
    pub informe: InformeArgs,
    #[arg(long, help = "Drop this customer's sales from the demand signal")]
    pub exclude_customer: Option<String>,
}

pub fn run(args: &ExportArgs, config: &AppConfig) -> CommandResult {
    let report = match consolidated_report(
        config,
        args.snapshot_dir.as_deref(),
        &args.informe,
        args.exclude_customer.as_deref(),
    ) {
        Ok(report) => report,
        Err(failure) => return failure,
    };

    if let Err(error) = write_csv(&args.output, &report.rows) {
        return CommandResult::failure("export", error.to_string(), 1);
    }

    let failures = report.domestic.failures.len() + report.cross_border.failures.len();
    let mut message =
        format!("wrote {} consolidated rows to {}", report.rows.len(), args.output.display());
    if failures > 0 {
        message.push_str(&format!(" ({failures} row(s) failed, not exported)"));
    }
    CommandResult::success(message)
}

// Plain decimal strings in the export; pt-BR formatting is display-only.
fn write_csv(path: &std::path::Path, rows: &[ConsolidatedRow]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "canonical_id",
        "product_id",
        "brand",
        "category",
        "domestic_stock",
        "domestic_recommended",
        "domestic_surplus",
        "cross_border_stock",
        "cross_border_recommended",
        "recommended_qty",
        "purchase_qty",
        "transfer_from_domestic",
        "unit_cost",
        "projected_cost",
        "provenance",
    ])?;

    for row in rows {
        writer.write_record([
            row.canonical_id.as_str().to_string(),
            row.product_id.as_str().to_string(),
            row.brand.clone(),
            row.category.clone(),
            row.domestic_stock.to_string(),
            row.domestic_recommended.to_string(),
            row.domestic_surplus.to_string(),
            row.cross_border_stock.to_string(),
            row.cross_border_recommended.to_string(),
            row.recommended_qty.to_string(),
            row.purchase_qty.to_string(),
            row.transfer_from_domestic.to_string(),
            row.unit_cost.map(|cost| cost.to_string()).unwrap_or_default(),
            row.projected_cost.to_string(),
            row.provenance.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
