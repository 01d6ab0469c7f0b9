//! Structured JSONL activity logging with graceful degradation.

pub mod activity;
pub mod jsonl;
