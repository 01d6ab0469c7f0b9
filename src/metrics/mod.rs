//! Metric records, the append-only store, pure aggregation, ingest, export.

pub mod aggregate;
pub mod export;
pub mod ingest;
pub mod record;
pub mod store;

#[cfg(test)]
mod test_properties;
