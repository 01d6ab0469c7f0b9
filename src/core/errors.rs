//! BB-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, BenchError>;

/// Top-level error type for benchboard.
///
/// Only the fallible edges (config, import/export, log files, CLI) produce
/// these. Store queries and aggregation never fail.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("[BB-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[BB-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[BB-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[BB-2001] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[BB-2002] invalid metrics import: {details}")]
    InvalidImport { details: String },

    #[error("[BB-3001] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[BB-3002] channel closed in component {component}")]
    ChannelClosed { component: &'static str },

    #[error("[BB-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl BenchError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "BB-1001",
            Self::MissingConfig { .. } => "BB-1002",
            Self::ConfigParse { .. } => "BB-1003",
            Self::Serialization { .. } => "BB-2001",
            Self::InvalidImport { .. } => "BB-2002",
            Self::Io { .. } => "BB-3001",
            Self::ChannelClosed { .. } => "BB-3002",
            Self::Runtime { .. } => "BB-3900",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::ChannelClosed { .. } | Self::Runtime { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for BenchError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for BenchError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
