pub mod caption;
pub mod metrics;
pub mod numeric;
pub mod series;
