use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::cost::{PurchaseCostRecord, TaxOperationCode};
use crate::errors::EngineError;

/// Currency values are kept at cent precision end to end.
const CURRENCY_SCALE: u32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxRegime {
    /// Raw cost embeds the tax; reverse-calculate the exclusive baseline.
    Inclusive,
    /// Raw cost is already on the comparable baseline.
    Exclusive,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxTreatment {
    pub regime: TaxRegime,
    /// Net tax rate for the operation class, e.g. 0.18 for 18%. Ignored
    /// for exclusive codes.
    #[serde(default)]
    pub factor: Decimal,
}

/// Configured mapping from tax-operation code to reverse-tax treatment.
/// Which codes are inclusive vs exclusive is configuration, never inferred.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReverseTaxTable(BTreeMap<String, TaxTreatment>);

impl ReverseTaxTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: impl Into<String>, treatment: TaxTreatment) {
        self.0.insert(code.into(), treatment);
    }

    pub fn get(&self, code: &TaxOperationCode) -> Option<&TaxTreatment> {
        self.0.get(&code.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TaxTreatment)> {
        self.0.iter()
    }

    /// Inclusive codes with a non-positive factor would divide the cost by
    /// one or less and misstate it; reject them at configuration time.
    pub fn validate(&self) -> Result<(), EngineError> {
        for (code, treatment) in &self.0 {
            if treatment.regime == TaxRegime::Inclusive && treatment.factor <= Decimal::ZERO {
                return Err(EngineError::NonPositiveTaxFactor {
                    code: TaxOperationCode(code.clone()),
                    factor: treatment.factor,
                });
            }
        }
        Ok(())
    }
}

/// Reverse-calculate the tax-exclusive baseline cost for one raw unit cost.
///
/// Inclusive codes divide by `1 + factor` and round half-up to cents;
/// exclusive codes are the identity. A code missing from the table is an
/// error, never a defaulted factor.
pub fn normalize_cost(
    raw_unit_cost: Decimal,
    code: &TaxOperationCode,
    table: &ReverseTaxTable,
) -> Result<Decimal, EngineError> {
    let treatment =
        table.get(code).ok_or_else(|| EngineError::UnknownTaxCode(code.clone()))?;

    match treatment.regime {
        TaxRegime::Exclusive => Ok(raw_unit_cost),
        TaxRegime::Inclusive => {
            let divisor = Decimal::ONE + treatment.factor;
            Ok((raw_unit_cost / divisor)
                .round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero))
        }
    }
}

pub trait CostNormalizer: Send + Sync {
    fn normalize(&self, record: &PurchaseCostRecord) -> Result<Decimal, EngineError>;
}

/// Table-driven normalizer; the only behavior it adds over
/// [`normalize_cost`] is carrying the configured table.
#[derive(Clone, Debug, Default)]
pub struct TableCostNormalizer {
    table: ReverseTaxTable,
}

impl TableCostNormalizer {
    pub fn new(table: ReverseTaxTable) -> Self {
        Self { table }
    }
}

impl CostNormalizer for TableCostNormalizer {
    fn normalize(&self, record: &PurchaseCostRecord) -> Result<Decimal, EngineError> {
        normalize_cost(record.raw_unit_cost, &record.tax_code, &self.table)
    }
}
