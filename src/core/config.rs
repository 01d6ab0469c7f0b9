//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{BenchError, Result};

/// Full benchboard configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub alerts: AlertConfig,
    pub insights: InsightConfig,
    pub trend: TrendConfig,
    pub ingest: IngestConfig,
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
}

/// Threshold rules applied by the alert evaluator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlertConfig {
    /// Maximum acceptable mean duration (ms) over the recent window.
    pub duration_threshold_ms: f64,
    /// Minimum acceptable success rate (percent) over the recent window.
    pub success_rate_threshold: f64,
    /// Number of most recent records per category that are evaluated.
    pub window: usize,
    /// Number of alerts retained for display.
    pub retained: usize,
}

/// Knobs for the recent-vs-prior insight comparison.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InsightConfig {
    /// Size of both the recent and the prior comparison window.
    pub window: usize,
    /// Absolute percent change that produces an insight.
    pub change_pct: f64,
    /// Absolute percent change above which impact is `high`.
    pub high_impact_pct: f64,
    /// Recent image mean (ms) above which the lazy-loading suggestion fires.
    pub image_slow_ms: f64,
}

/// Trend-view window sizes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TrendConfig {
    pub moving_average_window: usize,
    pub period_size: usize,
}

/// Multi-producer ingest queue sizing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IngestConfig {
    pub channel_capacity: usize,
}

/// JSONL activity log settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
}

/// Filesystem paths used by benchboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub activity_log: PathBuf,
    pub fallback_log: Option<PathBuf>,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            duration_threshold_ms: 1_000.0,
            success_rate_threshold: 95.0,
            window: 10,
            retained: 5,
        }
    }
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            window: 10,
            change_pct: 10.0,
            high_impact_pct: 20.0,
            image_slow_ms: 1_000.0,
        }
    }
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            moving_average_window: 5,
            period_size: 10,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1_024,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_size_bytes: 16 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!("[BB-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths");
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        let cfg = home_dir
            .join(".config")
            .join("benchboard")
            .join("config.toml");
        let data = home_dir.join(".local").join("share").join("benchboard");
        Self {
            config_file: cfg,
            activity_log: data.join("activity.jsonl"),
            fallback_log: Some(env::temp_dir().join("benchboard-activity.jsonl")),
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| BenchError::Io {
                path: path_buf.clone(),
                source,
            })?;
            toml::from_str::<Self>(&raw)?
        } else if is_explicit_path {
            return Err(BenchError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for the activity log.
    ///
    /// FNV-1a over the canonical JSON form, stable across processes.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut f64_slot = |name: &str, slot: &mut f64| -> Result<()> {
            if let Some(raw) = lookup(name) {
                *slot = parse_env(name, &raw)?;
            }
            Ok(())
        };
        f64_slot(
            "BENCHBOARD_ALERTS_DURATION_THRESHOLD_MS",
            &mut self.alerts.duration_threshold_ms,
        )?;
        f64_slot(
            "BENCHBOARD_ALERTS_SUCCESS_RATE_THRESHOLD",
            &mut self.alerts.success_rate_threshold,
        )?;
        f64_slot(
            "BENCHBOARD_INSIGHTS_CHANGE_PCT",
            &mut self.insights.change_pct,
        )?;
        f64_slot(
            "BENCHBOARD_INSIGHTS_HIGH_IMPACT_PCT",
            &mut self.insights.high_impact_pct,
        )?;
        f64_slot(
            "BENCHBOARD_INSIGHTS_IMAGE_SLOW_MS",
            &mut self.insights.image_slow_ms,
        )?;

        let mut usize_slot = |name: &str, slot: &mut usize| -> Result<()> {
            if let Some(raw) = lookup(name) {
                *slot = parse_env(name, &raw)?;
            }
            Ok(())
        };
        usize_slot("BENCHBOARD_ALERTS_WINDOW", &mut self.alerts.window)?;
        usize_slot("BENCHBOARD_ALERTS_RETAINED", &mut self.alerts.retained)?;
        usize_slot("BENCHBOARD_INSIGHTS_WINDOW", &mut self.insights.window)?;
        usize_slot(
            "BENCHBOARD_TREND_MOVING_AVERAGE_WINDOW",
            &mut self.trend.moving_average_window,
        )?;
        usize_slot(
            "BENCHBOARD_TREND_PERIOD_SIZE",
            &mut self.trend.period_size,
        )?;
        usize_slot(
            "BENCHBOARD_INGEST_CHANNEL_CAPACITY",
            &mut self.ingest.channel_capacity,
        )?;

        if let Some(raw) = lookup("BENCHBOARD_LOGGING_ENABLED") {
            self.logging.enabled = parse_env("BENCHBOARD_LOGGING_ENABLED", &raw)?;
        }
        if let Some(raw) = lookup("BENCHBOARD_ACTIVITY_LOG") {
            self.paths.activity_log = PathBuf::from(raw);
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let alerts = &self.alerts;
        if !alerts.duration_threshold_ms.is_finite() || alerts.duration_threshold_ms < 0.0 {
            return Err(BenchError::InvalidConfig {
                details: format!(
                    "alerts.duration_threshold_ms must be a finite value >= 0, got {}",
                    alerts.duration_threshold_ms
                ),
            });
        }
        validate_pct(
            "alerts.success_rate_threshold",
            alerts.success_rate_threshold,
        )?;

        for (name, val) in [
            ("alerts.window", alerts.window),
            ("alerts.retained", alerts.retained),
            ("insights.window", self.insights.window),
            ("trend.moving_average_window", self.trend.moving_average_window),
            ("trend.period_size", self.trend.period_size),
            ("ingest.channel_capacity", self.ingest.channel_capacity),
        ] {
            if val == 0 {
                return Err(BenchError::InvalidConfig {
                    details: format!("{name} must be >= 1"),
                });
            }
        }

        let insights = &self.insights;
        for (name, val) in [
            ("insights.change_pct", insights.change_pct),
            ("insights.high_impact_pct", insights.high_impact_pct),
            ("insights.image_slow_ms", insights.image_slow_ms),
        ] {
            if !val.is_finite() || val < 0.0 {
                return Err(BenchError::InvalidConfig {
                    details: format!("{name} must be a finite value >= 0, got {val}"),
                });
            }
        }
        if insights.high_impact_pct < insights.change_pct {
            return Err(BenchError::InvalidConfig {
                details: format!(
                    "insights.high_impact_pct ({}) must be >= insights.change_pct ({})",
                    insights.high_impact_pct, insights.change_pct
                ),
            });
        }

        if self.logging.enabled && self.logging.max_size_bytes == 0 {
            return Err(BenchError::InvalidConfig {
                details: "logging.max_size_bytes must be > 0 when logging is enabled".to_string(),
            });
        }

        Ok(())
    }
}

fn validate_pct(name: &str, value: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&value) {
        return Err(BenchError::InvalidConfig {
            details: format!("{name} must be in [0, 100], got {value}"),
        });
    }
    Ok(())
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|error| BenchError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}
