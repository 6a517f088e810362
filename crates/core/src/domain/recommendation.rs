use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::market::{Market, Provenance};
use crate::domain::product::{CanonicalProductId, ProductId};

/// Data-quality anomaly recovered in place. Surfaced on the row instead of
/// silently absorbed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RowAnnotation {
    NegativeStockClamped { observed: i64 },
}

impl std::fmt::Display for RowAnnotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeStockClamped { observed } => {
                write!(f, "negative stock {observed} clamped to 0")
            }
        }
    }
}

/// Per-product engine output for one market. Derived, never persisted;
/// lives for one render cycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationRow {
    pub product_id: ProductId,
    pub canonical_id: CanonicalProductId,
    pub brand: String,
    pub category: String,
    /// Mean quantity sold per period over the lookback window, dry spells
    /// included.
    pub velocity: Decimal,
    pub current_stock: u64,
    /// Never negative: a surplus clamps to zero here and shows up in
    /// `surplus_qty` instead.
    pub recommended_qty: u64,
    /// Units on hand beyond the target stock level. At most one of
    /// `recommended_qty` and `surplus_qty` is nonzero.
    pub surplus_qty: u64,
    /// Tax-normalized unit cost; `None` when the source carried no cost
    /// record for the product.
    pub unit_cost: Option<Decimal>,
    pub projected_cost: Decimal,
    pub market: Market,
    pub annotations: Vec<RowAnnotation>,
}

/// One product across both markets, matched on the canonical identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedRow {
    pub canonical_id: CanonicalProductId,
    pub product_id: ProductId,
    pub brand: String,
    pub category: String,
    pub domestic_stock: u64,
    pub domestic_recommended: u64,
    pub domestic_surplus: u64,
    pub cross_border_stock: u64,
    pub cross_border_recommended: u64,
    /// Sum of both markets' recommendations, before netting surplus.
    pub recommended_qty: u64,
    /// What actually needs buying once domestic surplus is netted out.
    pub purchase_qty: u64,
    /// Units the cross-border market can take from domestic shelf stock
    /// instead of purchasing.
    pub transfer_from_domestic: u64,
    pub unit_cost: Option<Decimal>,
    pub projected_cost: Decimal,
    pub provenance: Provenance,
    pub annotations: Vec<RowAnnotation>,
}
