pub mod merge;
pub mod recommendation;
pub mod tax;

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::config::EngineConfig;
use crate::domain::cost::PurchaseCostRecord;
use crate::domain::market::Market;
use crate::domain::product::{CanonicalProductId, CanonicalizationRule, ProductId};
use crate::domain::recommendation::{ConsolidatedRow, RecommendationRow};
use crate::domain::sales::ProductSalesRecord;
use crate::domain::stock::StockRecord;
use crate::errors::{EngineError, RowFailure};

use self::{
    recommendation::{demand_by_product, LookbackWindow, Recommender, RepositionRecommender},
    tax::{CostNormalizer, TableCostNormalizer},
};

/// One market's loaded data, as supplied by the loader collaborators.
/// Borrowed for the duration of a single engine run.
#[derive(Clone, Copy, Debug)]
pub struct MarketSnapshot<'a> {
    pub market: Market,
    pub sales: &'a [ProductSalesRecord],
    pub stock: &'a [StockRecord],
    pub costs: &'a [PurchaseCostRecord],
}

/// Engine output for one market: the ordered recommendation rows plus the
/// per-row failures, so callers can render partial results with visible
/// diagnostics instead of aborting the batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarketReport {
    pub market: Market,
    pub rows: Vec<RecommendationRow>,
    pub failures: Vec<RowFailure>,
}

/// Both per-market reports and the consolidated cross-market view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsolidatedReport {
    pub domestic: MarketReport,
    pub cross_border: MarketReport,
    pub rows: Vec<ConsolidatedRow>,
}

/// Composition of the recommendation and cost-normalization engines over a
/// market snapshot. Pure: every run over the same snapshot and settings
/// produces identical output.
pub struct ReplenishmentRuntime<R, N> {
    recommender: R,
    normalizer: N,
    canonicalization: CanonicalizationRule,
}

impl<R, N> ReplenishmentRuntime<R, N> {
    pub fn new(recommender: R, normalizer: N, canonicalization: CanonicalizationRule) -> Self {
        Self { recommender, normalizer, canonicalization }
    }
}

impl ReplenishmentRuntime<RepositionRecommender, TableCostNormalizer> {
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        config.tax_codes.validate()?;
        Ok(Self::new(
            RepositionRecommender::new(config.reposition_factor)?,
            TableCostNormalizer::new(config.tax_codes.clone()),
            config.canonicalization,
        ))
    }
}

impl<R, N> ReplenishmentRuntime<R, N>
where
    R: Recommender,
    N: CostNormalizer,
{
    /// Compute the recommendation table for one market.
    ///
    /// The exclude-customer filter is applied to the demand signal before
    /// any recommendation is computed; it is not a display filter. Rows
    /// come out ordered by canonical product id. A row whose cost fails to
    /// normalize is dropped from `rows` and reported in `failures`.
    pub fn market_report(
        &self,
        snapshot: MarketSnapshot<'_>,
        exclude_customer: Option<&str>,
    ) -> MarketReport {
        let window = LookbackWindow::from_sales(snapshot.sales);
        let signals =
            demand_by_product(snapshot.sales, &window, self.canonicalization, exclude_customer);

        let mut stock_by_product: BTreeMap<CanonicalProductId, (ProductId, i64)> = BTreeMap::new();
        for record in snapshot.stock {
            let key = record.product_id.canonicalize(self.canonicalization);
            let entry = stock_by_product
                .entry(key)
                .or_insert_with(|| (record.product_id.clone(), 0));
            entry.1 += record.on_hand;
        }

        // Last cost record per product wins: loaders supply purchase
        // history in chronological order, and the most recent entry is the
        // relevant one.
        let mut cost_by_product: BTreeMap<CanonicalProductId, &PurchaseCostRecord> =
            BTreeMap::new();
        for record in snapshot.costs {
            let key = record.product_id.canonicalize(self.canonicalization);
            cost_by_product.insert(key, record);
        }

        let mut keys: Vec<&CanonicalProductId> = signals.keys().collect();
        keys.extend(stock_by_product.keys());
        keys.sort();
        keys.dedup();

        let mut rows = Vec::with_capacity(keys.len());
        let mut failures = Vec::new();
        let empty_history: Vec<u64> = Vec::new();

        for key in keys {
            let signal = signals.get(key);
            let stocked = stock_by_product.get(key);

            let product_id = signal
                .map(|s| s.product_id.clone())
                .or_else(|| stocked.map(|(id, _)| id.clone()))
                .unwrap_or_else(|| ProductId(key.as_str().to_string()));
            let history = signal.map_or(empty_history.as_slice(), |s| s.history.as_slice());
            let on_hand = stocked.map_or(0, |(_, total)| *total);

            let recommendation = match self.recommender.recommend(history, on_hand) {
                Ok(recommendation) => recommendation,
                Err(error) => {
                    failures.push(RowFailure { product_id, error });
                    continue;
                }
            };

            let unit_cost = match cost_by_product.get(key) {
                Some(record) => match self.normalizer.normalize(record) {
                    Ok(cost) => Some(cost),
                    Err(error) => {
                        failures.push(RowFailure { product_id, error });
                        continue;
                    }
                },
                None => None,
            };
            let projected_cost = unit_cost
                .map(|cost| cost * Decimal::from(recommendation.recommended_qty))
                .unwrap_or(Decimal::ZERO);

            rows.push(RecommendationRow {
                canonical_id: key.clone(),
                product_id,
                brand: signal.map_or_else(String::new, |s| s.brand.clone()),
                category: signal.map_or_else(String::new, |s| s.category.clone()),
                velocity: recommendation.velocity,
                current_stock: recommendation.stock_on_hand,
                recommended_qty: recommendation.recommended_qty,
                surplus_qty: recommendation.surplus_qty,
                unit_cost,
                projected_cost,
                market: snapshot.market,
                annotations: recommendation.annotations,
            });
        }

        MarketReport { market: snapshot.market, rows, failures }
    }

    /// Full pipeline: both market reports plus the consolidated view.
    pub fn consolidated_report(
        &self,
        domestic: MarketSnapshot<'_>,
        cross_border: MarketSnapshot<'_>,
        exclude_customer: Option<&str>,
    ) -> ConsolidatedReport {
        let domestic = self.market_report(domestic, exclude_customer);
        let cross_border = self.market_report(cross_border, exclude_customer);
        let rows = merge::merge(&domestic.rows, &cross_border.rows);

        ConsolidatedReport { domestic, cross_border, rows }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{MarketSnapshot, ReplenishmentRuntime};
    use crate::config::EngineConfig;
    use crate::domain::cost::{PurchaseCostRecord, TaxOperationCode};
    use crate::domain::market::{Market, Provenance};
    use crate::domain::product::{CanonicalizationRule, ProductId};
    use crate::domain::sales::{Period, ProductSalesRecord};
    use crate::domain::stock::{BranchCode, StockRecord};
    use crate::engine::tax::{ReverseTaxTable, TaxRegime, TaxTreatment};
    use crate::errors::EngineError;

    fn month(month: u32) -> Period {
        Period::new(
            NaiveDate::from_ymd_opt(2026, month, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, month, 28).unwrap(),
        )
        .unwrap()
    }

    fn sale(id: &str, period: Period, qty: u64) -> ProductSalesRecord {
        ProductSalesRecord {
            product_id: ProductId(id.to_string()),
            brand: "Acme".to_string(),
            category: "General".to_string(),
            period,
            quantity_sold: qty,
            gross_revenue: Decimal::ZERO,
            customer: None,
        }
    }

    fn stock(id: &str, on_hand: i64) -> StockRecord {
        StockRecord {
            product_id: ProductId(id.to_string()),
            branch: BranchCode("1".to_string()),
            on_hand,
        }
    }

    fn cost(id: &str, cents: i64, code: &str) -> PurchaseCostRecord {
        PurchaseCostRecord {
            product_id: ProductId(id.to_string()),
            raw_unit_cost: Decimal::new(cents, 2),
            market: Market::Domestic,
            tax_code: TaxOperationCode(code.to_string()),
        }
    }

    fn config() -> EngineConfig {
        let mut tax_codes = ReverseTaxTable::new();
        tax_codes.insert(
            "5102",
            TaxTreatment { regime: TaxRegime::Inclusive, factor: Decimal::new(14, 2) },
        );
        tax_codes.insert(
            "import",
            TaxTreatment { regime: TaxRegime::Exclusive, factor: Decimal::ZERO },
        );
        EngineConfig {
            reposition_factor: Decimal::from(3u64),
            canonicalization: CanonicalizationRule::AlphanumericUpper,
            tax_codes,
        }
    }

    #[test]
    fn report_combines_recommendation_and_normalized_cost() {
        let runtime = ReplenishmentRuntime::from_config(&config()).unwrap();

        // velocity (10+0+10+0)/4 = 5, target 15, stock 5 -> recommend 10
        let sales = vec![
            sale("A-100", month(1), 10),
            sale("A-100", month(3), 10),
            sale("B-200", month(2), 4),
            sale("B-200", month(4), 4),
        ];
        let stock = vec![stock("A-100", 5)];
        let costs = vec![cost("A-100", 11_400, "5102")];

        let report = runtime.market_report(
            MarketSnapshot {
                market: Market::Domestic,
                sales: &sales,
                stock: &stock,
                costs: &costs,
            },
            None,
        );

        assert!(report.failures.is_empty());
        assert_eq!(report.rows.len(), 2);

        let row = &report.rows[0];
        assert_eq!(row.canonical_id.as_str(), "A100");
        assert_eq!(row.recommended_qty, 10);
        // 114.00 / 1.14 = 100.00, projected over 10 units
        assert_eq!(row.unit_cost, Some(Decimal::new(10_000, 2)));
        assert_eq!(row.projected_cost, Decimal::new(100_000, 2));
    }

    #[test]
    fn one_unknown_tax_code_does_not_abort_the_batch() {
        let runtime = ReplenishmentRuntime::from_config(&config()).unwrap();

        let mut sales = Vec::new();
        let mut costs = Vec::new();
        for index in 0..50 {
            let id = format!("P-{index:03}");
            sales.push(sale(&id, month(1), 2));
            let code = if index == 7 { "9999" } else { "5102" };
            costs.push(cost(&id, 1_140, code));
        }

        let report = runtime.market_report(
            MarketSnapshot { market: Market::Domestic, sales: &sales, stock: &[], costs: &costs },
            None,
        );

        assert_eq!(report.rows.len(), 49);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].product_id.as_str(), "P-007");
        assert!(matches!(report.failures[0].error, EngineError::UnknownTaxCode(_)));
    }

    #[test]
    fn stock_only_product_is_reported_as_surplus() {
        let runtime = ReplenishmentRuntime::from_config(&config()).unwrap();

        let stock = vec![stock("S-900", 12)];
        let report = runtime.market_report(
            MarketSnapshot { market: Market::Domestic, sales: &[], stock: &stock, costs: &[] },
            None,
        );

        assert_eq!(report.rows.len(), 1);
        let row = &report.rows[0];
        assert_eq!(row.recommended_qty, 0);
        assert_eq!(row.surplus_qty, 12);
        assert_eq!(row.velocity, Decimal::ZERO);
    }

    #[test]
    fn branch_stock_is_summed_per_product() {
        let runtime = ReplenishmentRuntime::from_config(&config()).unwrap();

        let sales = vec![sale("A-100", month(1), 9)];
        let stock = vec![
            StockRecord {
                product_id: ProductId("A-100".to_string()),
                branch: BranchCode("1".to_string()),
                on_hand: 4,
            },
            StockRecord {
                product_id: ProductId("a100".to_string()),
                branch: BranchCode("2".to_string()),
                on_hand: 6,
            },
        ];

        let report = runtime.market_report(
            MarketSnapshot { market: Market::Domestic, sales: &sales, stock: &stock, costs: &[] },
            None,
        );

        assert_eq!(report.rows.len(), 1);
        // velocity 9, target 27, stock 4 + 6 -> recommend 17
        assert_eq!(report.rows[0].current_stock, 10);
        assert_eq!(report.rows[0].recommended_qty, 17);
    }

    #[test]
    fn empty_snapshots_produce_empty_reports() {
        let runtime = ReplenishmentRuntime::from_config(&config()).unwrap();

        let report = runtime.consolidated_report(
            MarketSnapshot { market: Market::Domestic, sales: &[], stock: &[], costs: &[] },
            MarketSnapshot { market: Market::CrossBorder, sales: &[], stock: &[], costs: &[] },
            None,
        );

        assert!(report.domestic.rows.is_empty());
        assert!(report.cross_border.rows.is_empty());
        assert!(report.rows.is_empty());
    }

    #[test]
    fn consolidated_report_matches_products_across_markets() {
        let runtime = ReplenishmentRuntime::from_config(&config()).unwrap();

        let domestic_sales = vec![sale("A-100", month(1), 5)];
        let domestic_costs = vec![cost("A-100", 1_140, "5102")];
        let cross_sales = vec![sale("a100", month(1), 3)];

        let report = runtime.consolidated_report(
            MarketSnapshot {
                market: Market::Domestic,
                sales: &domestic_sales,
                stock: &[],
                costs: &domestic_costs,
            },
            MarketSnapshot {
                market: Market::CrossBorder,
                sales: &cross_sales,
                stock: &[],
                costs: &[],
            },
            None,
        );

        assert_eq!(report.rows.len(), 1);
        let consolidated = &report.rows[0];
        assert_eq!(consolidated.provenance, Provenance::Both);
        // domestic: velocity 5, target 15; cross-border: velocity 3, target 9
        assert_eq!(consolidated.domestic_recommended, 15);
        assert_eq!(consolidated.cross_border_recommended, 9);
        assert_eq!(consolidated.recommended_qty, 24);
    }

    #[test]
    fn excluding_a_customer_flows_into_the_consolidated_view() {
        let runtime = ReplenishmentRuntime::from_config(&config()).unwrap();

        let mut bulk = sale("A-100", month(1), 30);
        bulk.customer = Some("Stanley Hair".to_string());
        let sales = vec![bulk, sale("A-100", month(1), 3)];

        let all = runtime.market_report(
            MarketSnapshot { market: Market::Domestic, sales: &sales, stock: &[], costs: &[] },
            None,
        );
        let without = runtime.market_report(
            MarketSnapshot { market: Market::Domestic, sales: &sales, stock: &[], costs: &[] },
            Some("stanley hair"),
        );

        assert_eq!(all.rows[0].recommended_qty, 99);
        assert_eq!(without.rows[0].recommended_qty, 9);
    }
}
