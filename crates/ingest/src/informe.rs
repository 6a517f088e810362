//! Cross-border "informe" loader.
//!
//! The cross-border system exports a spreadsheet with decorative header
//! rows and no usable column names, so fields are picked by position per
//! the configured [`InformeLayout`]. Rows without a product code are
//! dropped; unparseable numeric cells are coerced to zero with a warning,
//! matching how the upstream export is handled operationally.

use std::path::Path;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use replen_core::config::InformeLayout;
use replen_core::{BranchCode, Market, Period, ProductId, ProductSalesRecord, StockRecord};

use crate::error::{IngestError, Result};

/// Parsed informe contents. The export carries sales and stock for the
/// cross-border market but no usable cost column.
#[derive(Clone, Debug)]
pub struct InformeSnapshot {
    pub sales: Vec<ProductSalesRecord>,
    pub stock: Vec<StockRecord>,
}

/// Load an informe export. `period` is the reporting window the sheet
/// covers; the sheet itself does not state it.
pub fn load_informe(path: &Path, layout: &InformeLayout, period: Period) -> Result<InformeSnapshot> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| IngestError::Csv { path: path.to_path_buf(), source })?;

    let min_columns = [
        layout.code_column,
        layout.product_column,
        layout.brand_column,
        layout.quantity_column,
        layout.stock_column,
    ]
    .into_iter()
    .max()
    .unwrap_or(0)
        + 1;

    let mut sales = Vec::new();
    let mut stock = Vec::new();
    let mut dropped = 0usize;

    for (index, record) in reader.records().enumerate() {
        if index < layout.skip_rows {
            continue;
        }
        let row = index + 1;
        let record =
            record.map_err(|source| IngestError::Csv { path: path.to_path_buf(), source })?;

        let code = record.get(layout.code_column).unwrap_or("").trim();
        if code.is_empty() {
            dropped += 1;
            continue;
        }

        if record.len() < min_columns {
            return Err(IngestError::ShortRow {
                path: path.to_path_buf(),
                row,
                found: record.len(),
                expected: min_columns,
            });
        }

        let product = record.get(layout.product_column).unwrap_or("").trim().to_string();
        let brand = record.get(layout.brand_column).unwrap_or("").trim().to_string();
        let quantity = lenient_quantity(record.get(layout.quantity_column).unwrap_or(""), row);
        let on_hand = lenient_stock(record.get(layout.stock_column).unwrap_or(""), row);

        let product_id = ProductId(code.to_string());
        sales.push(ProductSalesRecord {
            product_id: product_id.clone(),
            brand: brand.clone(),
            category: product,
            period,
            quantity_sold: quantity,
            gross_revenue: Decimal::ZERO,
            customer: None,
        });
        stock.push(StockRecord {
            product_id,
            branch: BranchCode("informe".to_string()),
            on_hand,
        });
    }

    tracing::info!(
        path = %path.display(),
        rows = sales.len(),
        dropped,
        market = %Market::CrossBorder,
        "loaded informe"
    );

    Ok(InformeSnapshot { sales, stock })
}

fn lenient_quantity(raw: &str, row: usize) -> u64 {
    parse_lenient(raw)
        .and_then(|value| value.max(Decimal::ZERO).trunc().to_u64())
        .unwrap_or_else(|| {
            coercion_warning(raw, row);
            0
        })
}

fn lenient_stock(raw: &str, row: usize) -> i64 {
    parse_lenient(raw).and_then(|value| value.trunc().to_i64()).unwrap_or_else(|| {
        coercion_warning(raw, row);
        0
    })
}

// The export mixes "1.234", "1234,5", and plain integers. Thousands dots
// are stripped when a decimal comma is present; a lone dot is kept as the
// decimal separator.
fn parse_lenient(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(Decimal::ZERO);
    }

    let normalized = if trimmed.contains(',') {
        trimmed.replace('.', "").replace(',', ".")
    } else {
        trimmed.to_string()
    };

    normalized.parse::<Decimal>().ok()
}

fn coercion_warning(raw: &str, row: usize) {
    if !raw.trim().is_empty() {
        tracing::warn!(value = raw, row, "unparseable informe numeric coerced to 0");
    }
}
