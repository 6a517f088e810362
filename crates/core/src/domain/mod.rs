pub mod cost;
pub mod market;
pub mod product;
pub mod recommendation;
pub mod sales;
pub mod stock;
