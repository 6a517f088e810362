pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;

pub use config::{AppConfig, ConfigError, ConfigOverrides, EngineConfig, LoadOptions, LogFormat};
pub use domain::cost::{PurchaseCostRecord, TaxOperationCode};
pub use domain::market::{Market, Provenance};
pub use domain::product::{CanonicalProductId, CanonicalizationRule, ProductId};
pub use domain::recommendation::{ConsolidatedRow, RecommendationRow, RowAnnotation};
pub use domain::sales::{Period, ProductSalesRecord};
pub use domain::stock::{BranchCode, StockRecord};
pub use engine::merge::merge;
pub use engine::recommendation::{
    compute_recommendation, sales_velocity, LookbackWindow, Recommendation, Recommender,
    RepositionRecommender,
};
pub use engine::tax::{
    normalize_cost, CostNormalizer, ReverseTaxTable, TableCostNormalizer, TaxRegime, TaxTreatment,
};
pub use engine::{ConsolidatedReport, MarketReport, MarketSnapshot, ReplenishmentRuntime};
pub use errors::{EngineError, RowFailure};
