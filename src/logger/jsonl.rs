//! Append-only JSONL activity log.
//!
//! One self-contained JSON object per line, assembled in memory and written
//! with a single `write_all` so a tailing reader never sees half a record.
//!
//! When a destination fails the writer steps down and never steps back up
//! on its own:
//! 1. primary activity log
//! 2. fallback file
//! 3. stderr, each line prefixed with `[BB-JSONL]`
//! 4. discard

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::config::Config;
use crate::core::errors::{BenchError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Activity the log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    MetricRecorded,
    MetricsCleared,
    AlertRaised,
    InsightEmitted,
    ExportWritten,
    ImportLoaded,
    ConfigLoaded,
    Error,
}

/// One log line. Only `ts`, `event` and `severity` are always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// RFC 3339 UTC timestamp with milliseconds.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Records touched (cleared, imported, exported).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    /// BB error code when the event reports a failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            event,
            severity,
            category: None,
            count: None,
            duration_ms: None,
            ok: None,
            error_code: None,
            details: None,
        }
    }

    /// Entry describing a failure, tagged with its stable code.
    pub fn from_error(err: &BenchError) -> Self {
        let mut entry = Self::new(EventType::Error, Severity::Error);
        entry.error_code = Some(err.code().to_string());
        entry.details = Some(err.to_string());
        entry
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Primary,
    Fallback,
    Stderr,
    Discard,
}

#[derive(Debug, Clone)]
pub struct JsonlConfig {
    pub path: PathBuf,
    pub fallback_path: Option<PathBuf>,
    /// Rotate once the current file would grow past this size.
    pub max_size_bytes: u64,
    /// Rotated generations kept as `<path>.1` .. `<path>.N`.
    pub max_rotated_files: u32,
}

impl JsonlConfig {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            path: config.paths.activity_log.clone(),
            fallback_path: config.paths.fallback_log.clone(),
            max_size_bytes: config.logging.max_size_bytes,
            max_rotated_files: config.logging.max_rotated_files,
        }
    }
}

/// Line writer with size-based rotation and the degradation chain above.
pub struct JsonlWriter {
    config: JsonlConfig,
    writer: Option<BufWriter<File>>,
    state: WriterState,
    bytes_written: u64,
}

impl JsonlWriter {
    /// Never fails: an unusable destination just moves the writer down the chain.
    pub fn open(config: JsonlConfig) -> Self {
        let mut w = Self {
            config,
            writer: None,
            state: WriterState::Discard,
            bytes_written: 0,
        };
        match open_append(&w.config.path) {
            Ok((file, size)) => w.attach_file(file, size, WriterState::Primary),
            Err(_) => w.open_fallback(),
        }
        w
    }

    pub fn write_entry(&mut self, entry: &LogEntry) {
        match serde_json::to_string(entry) {
            Ok(json) => self.write_line(&format!("{json}\n")),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[BB-JSONL] serialize error: {e}");
            }
        }
    }

    pub fn flush(&mut self) {
        if let Some(w) = self.writer.as_mut()
            && w.flush().is_err()
        {
            self.degrade();
        }
    }

    /// `primary`, `fallback`, `stderr` or `discard`.
    pub fn state(&self) -> &'static str {
        match self.state {
            WriterState::Primary => "primary",
            WriterState::Fallback => "fallback",
            WriterState::Stderr => "stderr",
            WriterState::Discard => "discard",
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    // ──────────────────── internals ────────────────────

    fn current_path(&self) -> Option<&Path> {
        match self.state {
            WriterState::Primary => Some(self.config.path.as_path()),
            WriterState::Fallback => self.config.fallback_path.as_deref(),
            WriterState::Stderr | WriterState::Discard => None,
        }
    }

    fn write_line(&mut self, line: &str) {
        let len = line.len() as u64;
        if self.writer.is_some() && self.bytes_written + len > self.config.max_size_bytes {
            self.rotate();
        }

        match self.state {
            WriterState::Primary | WriterState::Fallback => {
                let written = self
                    .writer
                    .as_mut()
                    .is_some_and(|w| w.write_all(line.as_bytes()).is_ok());
                if written {
                    self.bytes_written += len;
                } else {
                    self.degrade();
                    self.write_line(line);
                }
            }
            WriterState::Stderr => {
                if write!(io::stderr(), "[BB-JSONL] {line}").is_err() {
                    self.state = WriterState::Discard;
                }
            }
            WriterState::Discard => {}
        }
    }

    fn attach_file(&mut self, file: File, size: u64, state: WriterState) {
        self.writer = Some(BufWriter::new(file));
        self.bytes_written = size;
        self.state = state;
    }

    fn open_fallback(&mut self) {
        let opened = self
            .config
            .fallback_path
            .clone()
            .and_then(|fb| open_append(&fb).ok().map(|ok| (fb, ok)));
        match opened {
            Some((fb, (file, size))) => {
                let _ = writeln!(
                    io::stderr(),
                    "[BB-JSONL] activity log unavailable, using fallback {}",
                    fb.display()
                );
                self.attach_file(file, size, WriterState::Fallback);
            }
            None => {
                let _ = writeln!(io::stderr(), "[BB-JSONL] no writable log file, using stderr");
                self.writer = None;
                self.state = WriterState::Stderr;
            }
        }
    }

    fn degrade(&mut self) {
        self.writer = None;
        match self.state {
            WriterState::Primary => self.open_fallback(),
            WriterState::Fallback => {
                let _ = writeln!(io::stderr(), "[BB-JSONL] fallback write failed, using stderr");
                self.state = WriterState::Stderr;
            }
            WriterState::Stderr | WriterState::Discard => self.state = WriterState::Discard,
        }
    }

    /// `<path>` becomes `<path>.1`, `.1` becomes `.2`, and the oldest
    /// generation is removed.
    fn rotate(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
        self.writer = None;

        let Some(base) = self.current_path().map(Path::to_path_buf) else {
            return;
        };
        let keep = self.config.max_rotated_files;

        if keep == 0 {
            let _ = fs::remove_file(&base);
        } else {
            let _ = fs::remove_file(rotated_name(&base, keep));
            for i in (1..keep).rev() {
                let _ = fs::rename(rotated_name(&base, i), rotated_name(&base, i + 1));
            }
            let _ = fs::rename(&base, rotated_name(&base, 1));
        }

        let state = self.state;
        match open_append(&base) {
            Ok((file, _)) => self.attach_file(file, 0, state),
            Err(_) => self.degrade(),
        }
    }
}

impl Drop for JsonlWriter {
    fn drop(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
    }
}

// ──────────────────── helpers ────────────────────

/// Open or create for appending, creating parent directories. Returns the
/// file and its current size.
fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| BenchError::io(parent, source))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| BenchError::io(path, source))?;
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);
    Ok((file, size))
}

/// `activity.jsonl` → `activity.jsonl.3`.
fn rotated_name(base: &Path, index: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_at(path: PathBuf) -> JsonlConfig {
        JsonlConfig {
            path,
            fallback_path: None,
            max_size_bytes: 1024 * 1024,
            max_rotated_files: 3,
        }
    }

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn entries_become_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.jsonl");
        let mut writer = JsonlWriter::open(config_at(path.clone()));

        let mut entry = LogEntry::new(EventType::MetricRecorded, Severity::Info);
        entry.category = Some("image".into());
        entry.duration_ms = Some(120.5);
        writer.write_entry(&entry);
        writer.write_entry(&LogEntry::new(EventType::MetricsCleared, Severity::Info));
        writer.flush();

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "metric_recorded");
        assert_eq!(lines[0]["category"], "image");
        assert_eq!(lines[0]["duration_ms"], 120.5);
        assert_eq!(lines[1]["event"], "metrics_cleared");
    }

    #[test]
    fn unset_fields_are_omitted() {
        let json = serde_json::to_string(&LogEntry::new(EventType::ConfigLoaded, Severity::Info))
            .unwrap();
        assert!(!json.contains("category"));
        assert!(!json.contains("count"));
        assert!(!json.contains("details"));
    }

    #[test]
    fn error_entries_carry_code() {
        let err = BenchError::InvalidImport {
            details: "bad".into(),
        };
        let entry = LogEntry::from_error(&err);
        assert_eq!(entry.severity, Severity::Error);
        assert_eq!(entry.error_code.as_deref(), Some("BB-2002"));
    }

    #[test]
    fn rotation_keeps_numbered_generations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rot.jsonl");
        let mut writer = JsonlWriter::open(JsonlConfig {
            max_size_bytes: 120,
            max_rotated_files: 2,
            ..config_at(path.clone())
        });

        for _ in 0..12 {
            writer.write_entry(&LogEntry::new(EventType::MetricRecorded, Severity::Info));
        }
        writer.flush();

        assert!(path.exists());
        assert!(rotated_name(&path, 1).exists());
        assert!(rotated_name(&path, 2).exists());
        assert!(!rotated_name(&path, 3).exists());
        assert!(writer.bytes_written() <= 120);
    }

    /// A path whose parent is a regular file, unwritable even for root.
    fn blocked_path(dir: &Path) -> PathBuf {
        let blocker = dir.join("blocker");
        fs::write(&blocker, b"").unwrap();
        blocker.join("primary.jsonl")
    }

    #[test]
    fn falls_back_when_primary_unwritable() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = dir.path().join("fallback.jsonl");
        let mut writer = JsonlWriter::open(JsonlConfig {
            fallback_path: Some(fallback.clone()),
            ..config_at(blocked_path(dir.path()))
        });

        assert_eq!(writer.state(), "fallback");
        writer.write_entry(&LogEntry::new(EventType::Error, Severity::Warning));
        writer.flush();
        assert_eq!(read_lines(&fallback).len(), 1);
    }

    #[test]
    fn no_writable_file_means_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let writer = JsonlWriter::open(config_at(blocked_path(dir.path())));
        assert_eq!(writer.state(), "stderr");
    }

    #[test]
    fn reopening_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("append.jsonl");
        {
            let mut writer = JsonlWriter::open(config_at(path.clone()));
            writer.write_entry(&LogEntry::new(EventType::ImportLoaded, Severity::Info));
        }
        let mut writer = JsonlWriter::open(config_at(path.clone()));
        assert_eq!(writer.state(), "primary");
        assert!(writer.bytes_written() > 0);
        writer.write_entry(&LogEntry::new(EventType::ExportWritten, Severity::Info));
        writer.flush();
        assert_eq!(read_lines(&path).len(), 2);
    }
}
