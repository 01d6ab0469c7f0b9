//! Core types: errors, configuration, identifiers.

pub mod config;
pub mod errors;
pub mod ids;
