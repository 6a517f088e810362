use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::cost::TaxOperationCode;
use crate::domain::product::ProductId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Fatal for the affected row: defaulting the factor to zero would
    /// misstate the cost by the full tax amount.
    #[error("unknown tax operation code `{0}`")]
    UnknownTaxCode(TaxOperationCode),
    #[error("reposition factor must be positive, got {0}")]
    NonPositiveRepositionFactor(Decimal),
    #[error("tax code `{code}` is inclusive but has non-positive factor {factor}")]
    NonPositiveTaxFactor { code: TaxOperationCode, factor: Decimal },
    #[error("period end {end} precedes start {start}")]
    InvalidPeriod { start: NaiveDate, end: NaiveDate },
}

/// One product's failure inside an otherwise successful batch. Returned
/// alongside the computed rows so callers can render partial results with
/// visible diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowFailure {
    pub product_id: ProductId,
    pub error: EngineError,
}
