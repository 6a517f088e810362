//! Table rendering and pt-BR number formatting for engine output.

use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use rust_decimal::{Decimal, RoundingStrategy};

use replen_core::{ConsolidatedRow, MarketReport, RowFailure};

/// pt-BR currency: `R$ 1.234,56`, `R$ -` for an absent value.
pub fn format_money(value: Option<Decimal>) -> String {
    let Some(value) = value else {
        return "R$ -".to_string();
    };
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() { "-" } else { "" };
    let formatted = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
    format!("R$ {sign}{},{frac_part}", group_thousands(int_part))
}

/// pt-BR integer: `1.234`.
pub fn format_int(value: u64) -> String {
    group_thousands(&value.to_string())
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped
}

pub fn market_table(report: &MarketReport) -> String {
    let mut table = new_table(vec![
        "Product", "Brand", "Category", "Velocity", "Stock", "Recommended", "Surplus",
        "Unit cost", "Projected", "Notes",
    ]);
    for column in [3, 4, 5, 6, 7, 8] {
        align_right(&mut table, column);
    }

    for row in &report.rows {
        table.add_row(vec![
            Cell::new(row.product_id.as_str()),
            Cell::new(&row.brand),
            Cell::new(&row.category),
            Cell::new(format!("{:.2}", row.velocity)),
            Cell::new(format_int(row.current_stock)),
            Cell::new(format_int(row.recommended_qty)),
            Cell::new(format_int(row.surplus_qty)),
            Cell::new(format_money(row.unit_cost)),
            Cell::new(format_money(Some(row.projected_cost))),
            Cell::new(annotation_notes(&row.annotations)),
        ]);
    }

    let mut output = format!("{} market: {} products\n{table}", report.market, report.rows.len());
    push_failures(&mut output, &report.failures);
    output
}

pub fn consolidated_table(rows: &[ConsolidatedRow], failures: &[RowFailure]) -> String {
    let mut table = new_table(vec![
        "Product", "Brand", "Stock BR", "Rec BR", "Stock PY", "Rec PY", "Transfer", "Purchase",
        "Projected", "Source",
    ]);
    for column in [2, 3, 4, 5, 6, 7, 8] {
        align_right(&mut table, column);
    }

    let mut total_purchase = 0u64;
    let mut total_cost = Decimal::ZERO;
    for row in rows {
        total_purchase += row.purchase_qty;
        total_cost += row.projected_cost;
        table.add_row(vec![
            Cell::new(row.product_id.as_str()),
            Cell::new(&row.brand),
            Cell::new(format_int(row.domestic_stock)),
            Cell::new(format_int(row.domestic_recommended)),
            Cell::new(format_int(row.cross_border_stock)),
            Cell::new(format_int(row.cross_border_recommended)),
            Cell::new(format_int(row.transfer_from_domestic)),
            Cell::new(format_int(row.purchase_qty)),
            Cell::new(format_money(Some(row.projected_cost))),
            Cell::new(row.provenance.to_string()),
        ]);
    }

    let mut output = format!(
        "consolidated view: {} products, purchase {} units, projected {}\n{table}",
        rows.len(),
        format_int(total_purchase),
        format_money(Some(total_cost)),
    );
    push_failures(&mut output, failures);
    output
}

fn annotation_notes(annotations: &[replen_core::RowAnnotation]) -> String {
    annotations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

fn push_failures(output: &mut String, failures: &[RowFailure]) {
    if failures.is_empty() {
        return;
    }
    output.push_str(&format!("\n{} row(s) failed:", failures.len()));
    for failure in failures {
        output.push_str(&format!("\n  - {}: {}", failure.product_id.as_str(), failure.error));
    }
}

fn new_table(headers: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers);
    table
}

fn align_right(table: &mut Table, index: usize) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(CellAlignment::Right);
    }
}
