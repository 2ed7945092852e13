// Exploratory margin analysis over a per-store monthly financial dataset.
//
// The pipeline runs in three stages, each consuming the previous stage's
// output table: margin calculation (two averaging methods), rent imputation
// for owned properties, and correlation-based driver decomposition across
// cohorts, time, and geography.
pub mod charts;
pub mod drivers;
pub mod error;
pub mod loader;
pub mod margins;
pub mod output;
pub mod rent;
pub mod stats;
pub mod types;
