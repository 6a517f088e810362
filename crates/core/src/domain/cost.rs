use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::market::Market;
use crate::domain::product::ProductId;

/// Fiscal operation class recorded on a purchase. Selects the reverse-tax
/// treatment; never interpreted beyond table lookup.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaxOperationCode(pub String);

impl std::fmt::Display for TaxOperationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseCostRecord {
    pub product_id: ProductId,
    pub raw_unit_cost: Decimal,
    pub market: Market,
    pub tax_code: TaxOperationCode,
}
