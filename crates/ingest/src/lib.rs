//! Loader collaborators for the replenishment engine: domestic snapshot
//! CSVs and the positional cross-border informe export. These crates feed
//! `replen-core`; they shape rows and never compute business figures.

pub mod error;
pub mod informe;
pub mod snapshot;

pub use error::{IngestError, Result};
pub use informe::{load_informe, InformeSnapshot};
pub use snapshot::{load_costs, load_domestic_snapshot, load_sales, load_stock, DomesticSnapshot};
