pub mod classifier;
pub mod errors;
pub mod format;
pub mod models;
pub mod units;
