use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;
use crate::errors::EngineError;

/// Closed date range a sales figure was aggregated over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    start: NaiveDate,
    end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, EngineError> {
        if end < start {
            return Err(EngineError::InvalidPeriod { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

/// One product's sales over one period, as supplied by a loader.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductSalesRecord {
    pub product_id: ProductId,
    pub brand: String,
    pub category: String,
    pub period: Period,
    pub quantity_sold: u64,
    pub gross_revenue: Decimal,
    /// Customer attribution, when the source carries it. Drives the
    /// exclude-customer variant of the demand signal.
    pub customer: Option<String>,
}
