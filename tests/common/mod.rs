#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::{SystemTime, UNIX_EPOCH};

use benchboard::metrics::record::MetricRecord;

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Some(path) = option_env!("CARGO_BIN_EXE_benchboard") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) {
        "benchboard.exe"
    } else {
        "benchboard"
    };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve benchboard binary path for integration test"),
    }
}

/// Run the binary with `home` as `$HOME` so no user config leaks in.
/// Extra env pairs are applied last.
pub fn run_cli_case(case_name: &str, home: &Path, args: &[&str], env: &[(&str, &str)]) -> CmdResult {
    let root = std::env::temp_dir().join("benchboard-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");

    let log_path = root.join(format!("{}-{}.log", sanitize(case_name), now_millis()));
    let bin_path = resolve_bin_path();

    let mut command = Command::new(&bin_path);
    command
        .args(args)
        .env("HOME", home)
        .env("BENCHBOARD_ACTIVITY_LOG", home.join("activity.jsonl"))
        .env_remove("BENCHBOARD_OUTPUT_FORMAT")
        .env("RUST_BACKTRACE", "1");
    for (key, value) in env {
        command.env(key, value);
    }
    let output = command.output().expect("execute benchboard command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
    log_content.push_str(&format!("bin={}\n", bin_path.display()));
    log_content.push_str(&format!("args={args:?}\n"));
    log_content.push_str(&format!("status={}\n", output.status));
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}

/// Parse the single JSON line a `--json` command prints.
pub fn json_stdout(result: &CmdResult) -> serde_json::Value {
    let line = result
        .stdout
        .lines()
        .find(|l| !l.trim().is_empty())
        .unwrap_or_else(|| panic!("no stdout; log: {}", result.log_path.display()));
    serde_json::from_str(line).expect("stdout is JSON")
}

/// `n` records in one category with a fixed duration, one second apart.
pub fn series(category: &str, n: usize, duration: f64, success: bool) -> Vec<MetricRecord> {
    (0..n)
        .map(|i| {
            MetricRecord::new(category, format!("{category} run {i}"), duration, success)
                .at(1_700_000_000_000 + i64::try_from(i).unwrap_or(0) * 1000)
        })
        .collect()
}

/// Write records as a bare JSON array and return the path.
pub fn write_records(dir: &Path, name: &str, records: &[MetricRecord]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string(records).expect("serialize")).expect("write records");
    path
}
