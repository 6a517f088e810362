use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::domain::product::{CanonicalProductId, CanonicalizationRule, ProductId};
use crate::domain::recommendation::RowAnnotation;
use crate::domain::sales::{Period, ProductSalesRecord};
use crate::errors::EngineError;

/// Ordered list of periods the demand signal is computed over. Periods
/// with no sales count as zero, so the velocity reflects the true demand
/// rate including dry spells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LookbackWindow {
    periods: Vec<Period>,
}

impl LookbackWindow {
    pub fn new(periods: Vec<Period>) -> Self {
        Self { periods }
    }

    /// Window spanning every distinct period observed in a batch of sales
    /// records, ordered by start date.
    pub fn from_sales(records: &[ProductSalesRecord]) -> Self {
        let mut periods: Vec<Period> = records.iter().map(|r| r.period).collect();
        periods.sort();
        periods.dedup();
        Self { periods }
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    fn index_of(&self, period: &Period) -> Option<usize> {
        self.periods.iter().position(|p| p == period)
    }
}

/// Mean quantity sold per period. Empty history means no demand signal.
pub fn sales_velocity(history: &[u64]) -> Decimal {
    if history.is_empty() {
        return Decimal::ZERO;
    }
    let total: u64 = history.iter().sum();
    Decimal::from(total) / Decimal::from(history.len() as u64)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recommendation {
    pub velocity: Decimal,
    pub stock_on_hand: u64,
    pub recommended_qty: u64,
    pub surplus_qty: u64,
    pub annotations: Vec<RowAnnotation>,
}

/// Core reorder formula.
///
/// Target stock is `velocity * reposition_factor`, rounded up to whole
/// units so the engine never under-recommends. The recommendation is the
/// shortfall against that target, clamped at zero; stock beyond the target
/// is reported as surplus instead. Negative on-hand is a data anomaly:
/// clamped to zero and annotated rather than inflating the recommendation
/// silently.
pub fn compute_recommendation(
    history: &[u64],
    on_hand: i64,
    reposition_factor: Decimal,
) -> Result<Recommendation, EngineError> {
    if reposition_factor <= Decimal::ZERO {
        return Err(EngineError::NonPositiveRepositionFactor(reposition_factor));
    }

    let mut annotations = Vec::new();
    let stock = if on_hand < 0 {
        annotations.push(RowAnnotation::NegativeStockClamped { observed: on_hand });
        0u64
    } else {
        on_hand as u64
    };

    let velocity = sales_velocity(history);
    let target = (velocity * reposition_factor).ceil();
    let stock_dec = Decimal::from(stock);

    Ok(Recommendation {
        velocity,
        stock_on_hand: stock,
        recommended_qty: whole_units((target - stock_dec).max(Decimal::ZERO)),
        surplus_qty: whole_units((stock_dec - target).max(Decimal::ZERO)),
        annotations,
    })
}

// Inputs are whole non-negative decimals; saturate on magnitudes beyond u64.
fn whole_units(value: Decimal) -> u64 {
    value.to_u64().unwrap_or(u64::MAX)
}

/// Demand signal for one product: per-period quantities plus the display
/// attributes carried along from the sales records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DemandSignal {
    pub product_id: ProductId,
    pub brand: String,
    pub category: String,
    pub history: Vec<u64>,
}

/// Bucket sales records into the window per canonical product id.
///
/// The exclude-customer filter applies here, upstream of the
/// recommendation formula: dropping a customer changes the demand signal
/// itself, not just the displayed rows.
pub fn demand_by_product(
    sales: &[ProductSalesRecord],
    window: &LookbackWindow,
    rule: CanonicalizationRule,
    exclude_customer: Option<&str>,
) -> BTreeMap<CanonicalProductId, DemandSignal> {
    let mut signals: BTreeMap<CanonicalProductId, DemandSignal> = BTreeMap::new();

    for record in sales {
        if let Some(excluded) = exclude_customer {
            let matches = record
                .customer
                .as_deref()
                .is_some_and(|c| c.trim().eq_ignore_ascii_case(excluded.trim()));
            if matches {
                continue;
            }
        }
        let Some(slot) = window.index_of(&record.period) else {
            continue;
        };

        let key = record.product_id.canonicalize(rule);
        let signal = signals.entry(key).or_insert_with(|| DemandSignal {
            product_id: record.product_id.clone(),
            brand: record.brand.clone(),
            category: record.category.clone(),
            history: vec![0; window.len()],
        });
        signal.history[slot] += record.quantity_sold;
    }

    signals
}

pub trait Recommender: Send + Sync {
    fn recommend(&self, history: &[u64], on_hand: i64) -> Result<Recommendation, EngineError>;
}

/// Recommender parameterized by the configured stock-cover multiple.
#[derive(Clone, Debug)]
pub struct RepositionRecommender {
    factor: Decimal,
}

impl RepositionRecommender {
    pub fn new(factor: Decimal) -> Result<Self, EngineError> {
        if factor <= Decimal::ZERO {
            return Err(EngineError::NonPositiveRepositionFactor(factor));
        }
        Ok(Self { factor })
    }

    pub fn factor(&self) -> Decimal {
        self.factor
    }
}

impl Recommender for RepositionRecommender {
    fn recommend(&self, history: &[u64], on_hand: i64) -> Result<Recommendation, EngineError> {
        compute_recommendation(history, on_hand, self.factor)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{compute_recommendation, demand_by_product, sales_velocity, LookbackWindow};
    use crate::domain::product::{CanonicalizationRule, ProductId};
    use crate::domain::recommendation::RowAnnotation;
    use crate::domain::sales::{Period, ProductSalesRecord};
    use crate::errors::EngineError;

    fn factor(units: i64, scale: u32) -> Decimal {
        Decimal::new(units, scale)
    }

    #[test]
    fn four_period_history_with_stock_cover_three() {
        // velocity = (10+0+10+0)/4 = 5, target = 15, stock = 5 -> 10
        let rec = compute_recommendation(&[10, 0, 10, 0], 5, factor(3, 0)).unwrap();
        assert_eq!(rec.velocity, Decimal::from(5u64));
        assert_eq!(rec.recommended_qty, 10);
        assert_eq!(rec.surplus_qty, 0);
        assert!(rec.annotations.is_empty());
    }

    #[test]
    fn empty_history_never_reorders() {
        let rec = compute_recommendation(&[], 0, factor(11, 1)).unwrap();
        assert_eq!(rec.recommended_qty, 0);

        let rec = compute_recommendation(&[], 40, factor(11, 1)).unwrap();
        assert_eq!(rec.recommended_qty, 0);
    }

    #[test]
    fn all_zero_history_never_reorders() {
        let rec = compute_recommendation(&[0, 0, 0], 0, factor(3, 0)).unwrap();
        assert_eq!(rec.recommended_qty, 0);
    }

    #[test]
    fn stock_without_demand_is_pure_surplus() {
        let rec = compute_recommendation(&[0, 0], 7, factor(3, 0)).unwrap();
        assert_eq!(rec.recommended_qty, 0);
        assert_eq!(rec.surplus_qty, 7);
    }

    #[test]
    fn fractional_target_rounds_up_not_down() {
        // velocity = 1.5, factor = 1.1 -> target 1.65 -> 2 units
        let rec = compute_recommendation(&[1, 2], 0, factor(11, 1)).unwrap();
        assert_eq!(rec.recommended_qty, 2);
    }

    #[test]
    fn negative_stock_is_clamped_and_annotated() {
        let rec = compute_recommendation(&[10, 0, 10, 0], -3, factor(3, 0)).unwrap();
        assert_eq!(rec.stock_on_hand, 0);
        assert_eq!(rec.recommended_qty, 15);
        assert_eq!(
            rec.annotations,
            vec![RowAnnotation::NegativeStockClamped { observed: -3 }]
        );
    }

    #[test]
    fn surplus_clamps_recommendation_to_zero() {
        // target = 15, stock = 40 -> no negative recommendation
        let rec = compute_recommendation(&[10, 0, 10, 0], 40, factor(3, 0)).unwrap();
        assert_eq!(rec.recommended_qty, 0);
        assert_eq!(rec.surplus_qty, 25);
    }

    #[test]
    fn non_positive_factor_is_rejected() {
        let error = compute_recommendation(&[1], 0, Decimal::ZERO).unwrap_err();
        assert!(matches!(error, EngineError::NonPositiveRepositionFactor(_)));
    }

    #[test]
    fn velocity_counts_dry_spells() {
        assert_eq!(sales_velocity(&[10, 0, 10, 0]), Decimal::from(5u64));
        assert_eq!(sales_velocity(&[]), Decimal::ZERO);
    }

    fn month(month: u32) -> Period {
        Period::new(
            NaiveDate::from_ymd_opt(2026, month, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, month, 28).unwrap(),
        )
        .unwrap()
    }

    fn sale(id: &str, period: Period, qty: u64, customer: Option<&str>) -> ProductSalesRecord {
        ProductSalesRecord {
            product_id: ProductId(id.to_string()),
            brand: "Acme".to_string(),
            category: "General".to_string(),
            period,
            quantity_sold: qty,
            gross_revenue: Decimal::ZERO,
            customer: customer.map(str::to_string),
        }
    }

    #[test]
    fn demand_buckets_missing_periods_as_zero() {
        let window = LookbackWindow::new(vec![month(1), month(2), month(3)]);
        let sales = vec![sale("A-100", month(1), 4, None), sale("a100", month(3), 6, None)];

        let signals = demand_by_product(
            &sales,
            &window,
            CanonicalizationRule::AlphanumericUpper,
            None,
        );

        assert_eq!(signals.len(), 1);
        let signal = signals.values().next().unwrap();
        assert_eq!(signal.history, vec![4, 0, 6]);
    }

    #[test]
    fn excluding_a_customer_changes_the_signal_itself() {
        let window = LookbackWindow::new(vec![month(1), month(2)]);
        let sales = vec![
            sale("A-100", month(1), 10, Some("Stanley Hair")),
            sale("A-100", month(1), 2, Some("Walk-in")),
            sale("A-100", month(2), 2, None),
        ];

        let all = demand_by_product(
            &sales,
            &window,
            CanonicalizationRule::AlphanumericUpper,
            None,
        );
        let without = demand_by_product(
            &sales,
            &window,
            CanonicalizationRule::AlphanumericUpper,
            Some("stanley hair"),
        );

        assert_eq!(all.values().next().unwrap().history, vec![12, 2]);
        assert_eq!(without.values().next().unwrap().history, vec![2, 2]);
    }

    #[test]
    fn window_from_sales_sorts_and_dedups() {
        let sales = vec![
            sale("A", month(3), 1, None),
            sale("B", month(1), 1, None),
            sale("C", month(3), 1, None),
        ];
        let window = LookbackWindow::from_sales(&sales);
        assert_eq!(window.len(), 2);
        assert_eq!(window.index_of(&month(1)), Some(0));
        assert_eq!(window.index_of(&month(3)), Some(1));
    }
}
