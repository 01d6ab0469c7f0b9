//! Derived views over the record sequence: alerts, insights, summaries,
//! filtering, and web-vital rating. Everything here is recomputed on demand.

pub mod alerts;
pub mod filter;
pub mod insights;
pub mod summary;
pub mod vitals;
