use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::domain::market::Provenance;
use crate::domain::product::CanonicalProductId;
use crate::domain::recommendation::{ConsolidatedRow, RecommendationRow};

#[derive(Default)]
struct SidePair<'a> {
    domestic: Option<&'a RecommendationRow>,
    cross_border: Option<&'a RecommendationRow>,
}

/// Reconcile the two markets' recommendation tables into one consolidated
/// view, matched on the canonical product identifier.
///
/// A product present in only one market keeps that market's figures and
/// zeroes the other side. A product present in both sums quantities and
/// projected costs; projected costs are built from normalized unit costs
/// upstream, so the sums stay on a comparable basis. Output is ordered by
/// canonical id ascending, making re-runs over the same snapshots
/// byte-identical.
pub fn merge(
    domestic_rows: &[RecommendationRow],
    cross_border_rows: &[RecommendationRow],
) -> Vec<ConsolidatedRow> {
    let mut pairs: BTreeMap<CanonicalProductId, SidePair<'_>> = BTreeMap::new();

    for row in domestic_rows {
        pairs.entry(row.canonical_id.clone()).or_default().domestic = Some(row);
    }
    for row in cross_border_rows {
        pairs.entry(row.canonical_id.clone()).or_default().cross_border = Some(row);
    }

    pairs
        .into_iter()
        .filter_map(|(canonical_id, pair)| consolidate(canonical_id, pair))
        .collect()
}

fn consolidate(canonical_id: CanonicalProductId, pair: SidePair<'_>) -> Option<ConsolidatedRow> {
    // Display attributes come from the domestic side when available; its
    // identifiers are the ones purchasing works with.
    let (display, provenance) = match (pair.domestic, pair.cross_border) {
        (Some(domestic), Some(_)) => (domestic, Provenance::Both),
        (Some(domestic), None) => (domestic, Provenance::Domestic),
        (None, Some(cross_border)) => (cross_border, Provenance::CrossBorder),
        (None, None) => return None,
    };

    let domestic_recommended = pair.domestic.map_or(0, |row| row.recommended_qty);
    let domestic_surplus = pair.domestic.map_or(0, |row| row.surplus_qty);
    let cross_border_recommended = pair.cross_border.map_or(0, |row| row.recommended_qty);

    let recommended_qty = domestic_recommended + cross_border_recommended;
    // Domestic shelf surplus can cover cross-border demand before any new
    // purchase: transfer what the surplus covers, buy the remainder.
    let transfer_from_domestic = cross_border_recommended.min(domestic_surplus);
    let purchase_qty = recommended_qty.saturating_sub(domestic_surplus);

    let unit_cost = pair
        .domestic
        .and_then(|row| row.unit_cost)
        .or_else(|| pair.cross_border.and_then(|row| row.unit_cost));
    let projected_cost = pair.domestic.map_or(Decimal::ZERO, |row| row.projected_cost)
        + pair.cross_border.map_or(Decimal::ZERO, |row| row.projected_cost);

    let mut annotations = Vec::new();
    if let Some(row) = pair.domestic {
        annotations.extend(row.annotations.iter().cloned());
    }
    if let Some(row) = pair.cross_border {
        annotations.extend(row.annotations.iter().cloned());
    }

    Some(ConsolidatedRow {
        canonical_id,
        product_id: display.product_id.clone(),
        brand: display.brand.clone(),
        category: display.category.clone(),
        domestic_stock: pair.domestic.map_or(0, |row| row.current_stock),
        domestic_recommended,
        domestic_surplus,
        cross_border_stock: pair.cross_border.map_or(0, |row| row.current_stock),
        cross_border_recommended,
        recommended_qty,
        purchase_qty,
        transfer_from_domestic,
        unit_cost,
        projected_cost,
        provenance,
        annotations,
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::merge;
    use crate::domain::market::{Market, Provenance};
    use crate::domain::product::{CanonicalizationRule, ProductId};
    use crate::domain::recommendation::RecommendationRow;

    fn row(
        id: &str,
        market: Market,
        recommended: u64,
        surplus: u64,
        stock: u64,
        projected_cost: Decimal,
    ) -> RecommendationRow {
        let product_id = ProductId(id.to_string());
        RecommendationRow {
            canonical_id: product_id.canonicalize(CanonicalizationRule::AlphanumericUpper),
            product_id,
            brand: "Acme".to_string(),
            category: "General".to_string(),
            velocity: Decimal::ZERO,
            current_stock: stock,
            recommended_qty: recommended,
            surplus_qty: surplus,
            unit_cost: Some(Decimal::new(1_000, 2)),
            projected_cost,
            market,
            annotations: Vec::new(),
        }
    }

    #[test]
    fn differently_formatted_ids_merge_into_one_row() {
        // "A-100" and "a100" are the same product to the two systems.
        let domestic = vec![row("A-100", Market::Domestic, 5, 0, 0, Decimal::new(5_000, 2))];
        let cross = vec![row("a100", Market::CrossBorder, 3, 0, 0, Decimal::new(2_000, 2))];

        let merged = merge(&domestic, &cross);
        assert_eq!(merged.len(), 1);

        let consolidated = &merged[0];
        assert_eq!(consolidated.canonical_id.as_str(), "A100");
        assert_eq!(consolidated.recommended_qty, 8);
        assert_eq!(consolidated.projected_cost, Decimal::new(7_000, 2));
        assert_eq!(consolidated.provenance, Provenance::Both);
    }

    #[test]
    fn single_market_product_zeroes_the_other_side() {
        let domestic = vec![row("B-200", Market::Domestic, 4, 0, 2, Decimal::new(4_000, 2))];

        let merged = merge(&domestic, &[]);
        assert_eq!(merged.len(), 1);

        let consolidated = &merged[0];
        assert_eq!(consolidated.provenance, Provenance::Domestic);
        assert_eq!(consolidated.domestic_recommended, 4);
        assert_eq!(consolidated.cross_border_recommended, 0);
        assert_eq!(consolidated.cross_border_stock, 0);
        assert_eq!(consolidated.projected_cost, Decimal::new(4_000, 2));
    }

    #[test]
    fn domestic_surplus_covers_cross_border_demand_first() {
        // Domestic holds 10 beyond target; cross-border needs 4. Transfer
        // the 4 and buy nothing.
        let domestic = vec![row("C-300", Market::Domestic, 0, 10, 25, Decimal::ZERO)];
        let cross = vec![row("C300", Market::CrossBorder, 4, 0, 1, Decimal::ZERO)];

        let merged = merge(&domestic, &cross);
        let consolidated = &merged[0];
        assert_eq!(consolidated.transfer_from_domestic, 4);
        assert_eq!(consolidated.purchase_qty, 0);
        assert_eq!(consolidated.recommended_qty, 4);
    }

    #[test]
    fn purchase_covers_demand_beyond_the_surplus() {
        let domestic = vec![row("C-300", Market::Domestic, 2, 0, 1, Decimal::ZERO)];
        let cross = vec![row("C300", Market::CrossBorder, 7, 0, 0, Decimal::ZERO)];

        let merged = merge(&domestic, &cross);
        let consolidated = &merged[0];
        // No domestic surplus: everything recommended is purchased.
        assert_eq!(consolidated.transfer_from_domestic, 0);
        assert_eq!(consolidated.purchase_qty, 9);
    }

    #[test]
    fn output_is_ordered_by_canonical_id() {
        let domestic = vec![
            row("Z-900", Market::Domestic, 1, 0, 0, Decimal::ZERO),
            row("A-100", Market::Domestic, 1, 0, 0, Decimal::ZERO),
        ];
        let cross = vec![row("M-500", Market::CrossBorder, 1, 0, 0, Decimal::ZERO)];

        let merged = merge(&domestic, &cross);
        let ids: Vec<&str> = merged.iter().map(|row| row.canonical_id.as_str()).collect();
        assert_eq!(ids, vec!["A100", "M500", "Z900"]);
    }

    #[test]
    fn rerunning_the_merge_is_byte_identical() {
        let domestic = vec![
            row("A-100", Market::Domestic, 5, 0, 3, Decimal::new(5_000, 2)),
            row("B-200", Market::Domestic, 0, 6, 9, Decimal::ZERO),
        ];
        let cross = vec![row("a100", Market::CrossBorder, 3, 0, 1, Decimal::new(2_000, 2))];

        assert_eq!(merge(&domestic, &cross), merge(&domestic, &cross));
    }

    #[test]
    fn empty_inputs_merge_to_empty_output() {
        assert!(merge(&[], &[]).is_empty());
    }
}
