//! Domestic snapshot loaders: sales, stock, and purchase-cost CSVs.
//!
//! The relational source exports one CSV per table, already filtered by
//! branch/date/category as requested. These loaders only shape rows into
//! domain records; all business logic lives in `replen-core`.

use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use replen_core::{
    BranchCode, Market, Period, ProductId, ProductSalesRecord, PurchaseCostRecord, StockRecord,
    TaxOperationCode,
};

use crate::error::{IngestError, Result};

#[derive(Debug, Deserialize)]
struct SalesRow {
    product_id: String,
    brand: String,
    category: String,
    period_start: NaiveDate,
    period_end: NaiveDate,
    quantity_sold: u64,
    gross_revenue: Decimal,
    #[serde(default)]
    customer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StockRow {
    product_id: String,
    branch: String,
    on_hand: i64,
}

#[derive(Debug, Deserialize)]
struct CostRow {
    product_id: String,
    raw_unit_cost: Decimal,
    tax_code: String,
}

/// All three domestic exports, loaded from one directory.
#[derive(Clone, Debug)]
pub struct DomesticSnapshot {
    pub sales: Vec<ProductSalesRecord>,
    pub stock: Vec<StockRecord>,
    pub costs: Vec<PurchaseCostRecord>,
}

/// Load `sales.csv`, `stock.csv`, and `costs.csv` from `dir`.
pub fn load_domestic_snapshot(dir: &Path) -> Result<DomesticSnapshot> {
    let snapshot = DomesticSnapshot {
        sales: load_sales(&dir.join("sales.csv"))?,
        stock: load_stock(&dir.join("stock.csv"))?,
        costs: load_costs(&dir.join("costs.csv"), Market::Domestic)?,
    };
    tracing::info!(
        dir = %dir.display(),
        sales = snapshot.sales.len(),
        stock = snapshot.stock.len(),
        costs = snapshot.costs.len(),
        "loaded domestic snapshot"
    );
    Ok(snapshot)
}

pub fn load_sales(path: &Path) -> Result<Vec<ProductSalesRecord>> {
    let mut records = Vec::new();

    for (row, parsed) in reader(path)?.deserialize::<SalesRow>().enumerate() {
        let row = data_row(row);
        let sales_row =
            parsed.map_err(|source| IngestError::Csv { path: path.to_path_buf(), source })?;

        let period = Period::new(sales_row.period_start, sales_row.period_end).map_err(|_| {
            IngestError::InvalidField {
                field: "period",
                value: format!("{}..{}", sales_row.period_start, sales_row.period_end),
                path: path.to_path_buf(),
                row,
            }
        })?;

        records.push(ProductSalesRecord {
            product_id: ProductId(sales_row.product_id),
            brand: sales_row.brand,
            category: sales_row.category,
            period,
            quantity_sold: sales_row.quantity_sold,
            gross_revenue: sales_row.gross_revenue,
            customer: sales_row.customer.filter(|customer| !customer.trim().is_empty()),
        });
    }

    tracing::debug!(path = %path.display(), rows = records.len(), "loaded sales records");
    Ok(records)
}

pub fn load_stock(path: &Path) -> Result<Vec<StockRecord>> {
    let mut records = Vec::new();

    for parsed in reader(path)?.deserialize::<StockRow>() {
        let stock_row =
            parsed.map_err(|source| IngestError::Csv { path: path.to_path_buf(), source })?;
        if stock_row.on_hand < 0 {
            tracing::warn!(
                product = %stock_row.product_id,
                on_hand = stock_row.on_hand,
                "negative stock in snapshot, engine will clamp and annotate"
            );
        }
        records.push(StockRecord {
            product_id: ProductId(stock_row.product_id),
            branch: BranchCode(stock_row.branch),
            on_hand: stock_row.on_hand,
        });
    }

    tracing::debug!(path = %path.display(), rows = records.len(), "loaded stock records");
    Ok(records)
}

/// Costs are expected in chronological purchase order; the engine keeps the
/// most recent entry per product.
pub fn load_costs(path: &Path, market: Market) -> Result<Vec<PurchaseCostRecord>> {
    let mut records = Vec::new();

    for parsed in reader(path)?.deserialize::<CostRow>() {
        let cost_row =
            parsed.map_err(|source| IngestError::Csv { path: path.to_path_buf(), source })?;
        records.push(PurchaseCostRecord {
            product_id: ProductId(cost_row.product_id),
            raw_unit_cost: cost_row.raw_unit_cost,
            market,
            tax_code: TaxOperationCode(cost_row.tax_code),
        });
    }

    tracing::debug!(path = %path.display(), rows = records.len(), "loaded cost records");
    Ok(records)
}

fn reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| IngestError::Csv { path: path.to_path_buf(), source })
}

// Row numbers reported to users are 1-based and count the header line.
fn data_row(index: usize) -> usize {
    index + 2
}
