use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BranchCode(pub String);

/// Quantity on hand for one (product, branch) pair. Negative on-hand is
/// representable so the data-quality anomaly path stays testable; the
/// engine clamps it and annotates the output row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    pub product_id: ProductId,
    pub branch: BranchCode,
    pub on_hand: i64,
}
