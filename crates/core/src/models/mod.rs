pub mod series;
pub mod stock;
pub mod trending;
