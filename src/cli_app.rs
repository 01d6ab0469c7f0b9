//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use benchboard::analysis::alerts::{AlertEvaluator, AlertFeed, AlertSeverity};
use benchboard::analysis::filter::{RecordFilter, TimeRange};
use benchboard::analysis::insights::{Impact, InsightEngine, InsightKind};
use benchboard::analysis::summary::{PerformanceSummary, category_trend};
use benchboard::core::config::Config;
use benchboard::core::errors::BenchError;
use benchboard::core::ids::{format_millis, now_millis};
use benchboard::logger::activity::ActivityLog;
use benchboard::logger::jsonl::{EventType, LogEntry, Severity};
use benchboard::metrics::{export, ingest};
use benchboard::metrics::record::Category;
use benchboard::metrics::store::MetricStore;

/// benchboard: aggregate, alert on, and explain front-end benchmark runs.
#[derive(Debug, Parser)]
#[command(
    name = "benchboard",
    author,
    version,
    about = "Benchmark run aggregation, alerts and insights",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Increase verbosity.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Quiet mode (errors only).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Per-category averages, extremes and success rates.
    Report(ReportArgs),
    /// Whole-run summary with P95 and trend.
    Summary(InputArgs),
    /// Threshold alerts over each category's recent runs.
    Alerts(AlertsArgs),
    /// Recent-versus-prior performance insights.
    Insights(InputArgs),
    /// Moving-average trend series for one category.
    Trend(TrendArgs),
    /// Select records and write them as an export document.
    Filter(FilterArgs),
    /// View and validate configuration.
    Config(ConfigArgs),
    /// Show version information.
    Version,
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args)]
struct InputArgs {
    /// Export document or bare JSON array of records.
    #[arg(long, short, value_name = "FILE")]
    input: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct ReportArgs {
    #[command(flatten)]
    source: InputArgs,
    /// Only report this category.
    #[arg(long, value_name = "CATEGORY")]
    category: Option<String>,
}

#[derive(Debug, Clone, Args)]
struct AlertsArgs {
    #[command(flatten)]
    source: InputArgs,
    /// Mean duration threshold in ms (overrides config).
    #[arg(long, value_name = "MS")]
    duration: Option<f64>,
    /// Success rate threshold in percent (overrides config).
    #[arg(long, value_name = "PCT")]
    success_rate: Option<f64>,
}

#[derive(Debug, Clone, Args)]
struct TrendArgs {
    #[command(flatten)]
    source: InputArgs,
    #[arg(long, value_name = "CATEGORY")]
    category: String,
    /// Trailing moving-average window (overrides config).
    #[arg(long, value_name = "N")]
    window: Option<usize>,
}

#[derive(Debug, Clone, Args)]
struct FilterArgs {
    #[command(flatten)]
    source: InputArgs,
    /// Keep only these categories (repeatable).
    #[arg(long = "category", value_name = "CATEGORY")]
    categories: Vec<String>,
    /// hour, day, week, month or all.
    #[arg(long, default_value = "all")]
    range: TimeRange,
    /// Drop failed runs.
    #[arg(long)]
    success_only: bool,
    /// Write the export document here instead of stdout.
    #[arg(long, short, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration.
    Show,
    /// Validate the configuration and print its hash.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input or unusable input file.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) | Self::Json(_) => 3,
        }
    }
}

impl From<BenchError> for CliError {
    fn from(err: BenchError) -> Self {
        match err {
            BenchError::InvalidConfig { .. }
            | BenchError::MissingConfig { .. }
            | BenchError::ConfigParse { .. }
            | BenchError::InvalidImport { .. } => Self::User(err.to_string()),
            BenchError::Io { .. } | BenchError::ChannelClosed { .. } | BenchError::Runtime { .. } => {
                Self::Runtime(err.to_string())
            }
            BenchError::Serialization { .. } => Self::Internal(err.to_string()),
        }
    }
}

/// Loaded config plus the activity log opened from it.
struct Session {
    config: Config,
    log: ActivityLog,
}

impl Session {
    fn open(cli: &Cli) -> Result<Self, CliError> {
        let config = Config::load(cli.config.as_deref())?;
        let log = ActivityLog::open(&config);
        let mut entry = LogEntry::new(EventType::ConfigLoaded, Severity::Info);
        entry.details = Some(config.paths.config_file.display().to_string());
        log.record(&entry);
        Ok(Self { config, log })
    }

    /// Import records into a fresh store with the activity log attached,
    /// feeding them through the ingest queue in capacity-sized batches.
    fn load_store(&self, path: &Path) -> Result<MetricStore, CliError> {
        let records = export::read_file(path).inspect_err(|e| self.log.error(e))?;
        let count = records.len();

        let capacity = self.config.ingest.channel_capacity;
        let (tx, queue) = ingest::channel(capacity);
        let mut store = MetricStore::new();
        self.log.attach(&mut store);
        for record in records {
            if queue.pending() >= capacity {
                queue.drain_into(&mut store);
            }
            tx.send(record)?;
        }
        queue.drain_into(&mut store);
        self.log
            .transfer(EventType::ImportLoaded, count, &path.display().to_string());
        Ok(store)
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Report(args) => run_report(cli, args),
        Command::Summary(args) => run_summary(cli, args),
        Command::Alerts(args) => run_alerts(cli, args),
        Command::Insights(args) => run_insights(cli, args),
        Command::Trend(args) => run_trend(cli, args),
        Command::Filter(args) => run_filter(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Version => emit_version(cli),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

// ──────────────────── report ────────────────────

#[derive(Debug, Serialize)]
struct CategoryRow {
    category: Category,
    runs: usize,
    average_ms: f64,
    min_ms: f64,
    max_ms: f64,
    success_rate: f64,
}

fn run_report(cli: &Cli, args: &ReportArgs) -> Result<(), CliError> {
    let session = Session::open(cli)?;
    let store = session.load_store(&args.source.input)?;

    let wanted = args.category.as_deref().map(Category::parse);
    let rows: Vec<CategoryRow> = store
        .categories()
        .into_iter()
        .filter(|c| wanted.as_ref().is_none_or(|w| w == c))
        .map(|category| {
            let result = store.get_results_by_category(&category);
            CategoryRow {
                category,
                runs: result.total_runs,
                average_ms: result.average_time,
                min_ms: result.min_time,
                max_ms: result.max_time,
                success_rate: result.success_rate,
            }
        })
        .collect();

    match output_mode(cli) {
        OutputMode::Human => {
            if rows.is_empty() {
                println!("No records.");
                return Ok(());
            }
            if !cli.quiet {
                println!(
                    "{:<12} {:>6} {:>11} {:>11} {:>11} {:>9}",
                    "CATEGORY", "RUNS", "AVG ms", "MIN ms", "MAX ms", "SUCCESS"
                );
            }
            for row in &rows {
                println!(
                    "{:<12} {:>6} {:>11.2} {:>11.2} {:>11.2} {:>8.1}%",
                    row.category.as_str(),
                    row.runs,
                    row.average_ms,
                    row.min_ms,
                    row.max_ms,
                    row.success_rate,
                );
            }
            if cli.verbose {
                println!("\n{} records from {}", store.len(), args.source.input.display());
            }
        }
        OutputMode::Json => write_json_line(&json!({
            "command": "report",
            "total": store.len(),
            "categories": rows,
        }))?,
    }
    Ok(())
}

// ──────────────────── summary ────────────────────

fn run_summary(cli: &Cli, args: &InputArgs) -> Result<(), CliError> {
    let session = Session::open(cli)?;
    let store = session.load_store(&args.input)?;
    let summary = PerformanceSummary::compute_with(store.metrics(), session.config.trend.period_size);

    match output_mode(cli) {
        OutputMode::Human => {
            println!("Total tests:   {}", summary.total_tests);
            println!("Success rate:  {:.1}%", summary.success_rate);
            println!("Avg duration:  {:.2} ms", summary.avg_duration);
            println!("P95 duration:  {:.2} ms", summary.p95);
            println!("Trend:         {}", format_trend(summary.trend()));
        }
        OutputMode::Json => write_json_line(&json!({
            "command": "summary",
            "summary": summary,
        }))?,
    }
    Ok(())
}

fn format_trend(trend: Option<f64>) -> String {
    match trend {
        None => "n/a".to_string(),
        Some(ms) if ms > 0.0 => format!("+{ms:.2} ms (slower)").red().to_string(),
        Some(ms) if ms < 0.0 => format!("{ms:.2} ms (faster)").green().to_string(),
        Some(_) => "0.00 ms".to_string(),
    }
}

// ──────────────────── alerts ────────────────────

fn run_alerts(cli: &Cli, args: &AlertsArgs) -> Result<(), CliError> {
    let session = Session::open(cli)?;
    let store = session.load_store(&args.source.input)?;

    let mut rules = session.config.alerts.clone();
    if let Some(duration) = args.duration {
        rules.duration_threshold_ms = duration;
    }
    if let Some(rate) = args.success_rate {
        rules.success_rate_threshold = rate;
    }
    let alerts = AlertEvaluator::from_config(&rules).evaluate(store.metrics());
    session.log.alerts(&alerts);

    let mut feed = AlertFeed::new(rules.retained);
    feed.extend(alerts);

    match output_mode(cli) {
        OutputMode::Human => {
            if feed.is_empty() {
                if !cli.quiet {
                    println!("{}", "No alerts.".green());
                }
                return Ok(());
            }
            for alert in feed.iter() {
                let label = match alert.severity {
                    AlertSeverity::Error => "ERROR".red().bold(),
                    AlertSeverity::Warning => "WARN ".yellow().bold(),
                    AlertSeverity::Success => "OK   ".green().bold(),
                };
                println!("{label} {}", alert.message);
            }
        }
        OutputMode::Json => {
            let alerts: Vec<_> = feed.iter().collect();
            write_json_line(&json!({
                "command": "alerts",
                "thresholds": {
                    "duration_ms": rules.duration_threshold_ms,
                    "success_rate": rules.success_rate_threshold,
                },
                "alerts": alerts,
            }))?;
        }
    }
    Ok(())
}

// ──────────────────── insights ────────────────────

fn run_insights(cli: &Cli, args: &InputArgs) -> Result<(), CliError> {
    let session = Session::open(cli)?;
    let store = session.load_store(&args.input)?;
    let insights = InsightEngine::new(session.config.insights.clone()).generate(store.metrics());
    session.log.insights(&insights);

    match output_mode(cli) {
        OutputMode::Human => {
            if insights.is_empty() && !cli.quiet {
                println!("No insights: performance is steady.");
            }
            for insight in &insights {
                let marker = match insight.kind {
                    InsightKind::Degradation => "▼".red(),
                    InsightKind::Improvement => "▲".green(),
                    InsightKind::Suggestion => "•".cyan(),
                };
                let impact = match insight.impact {
                    Impact::High => insight.impact.as_str().red(),
                    Impact::Medium => insight.impact.as_str().yellow(),
                    Impact::Low => insight.impact.as_str().normal(),
                };
                println!("{marker} {} [{impact}]", insight.title.bold());
                println!("    {}", insight.description);
            }
        }
        OutputMode::Json => write_json_line(&json!({
            "command": "insights",
            "insights": insights,
        }))?,
    }
    Ok(())
}

// ──────────────────── trend ────────────────────

fn run_trend(cli: &Cli, args: &TrendArgs) -> Result<(), CliError> {
    let session = Session::open(cli)?;
    let store = session.load_store(&args.source.input)?;
    let window = args.window.unwrap_or(session.config.trend.moving_average_window);
    let category = Category::parse(&args.category);
    let points = category_trend(store.metrics(), &category, window);

    match output_mode(cli) {
        OutputMode::Human => {
            if points.is_empty() {
                println!("No records in category {category}.");
                return Ok(());
            }
            if !cli.quiet {
                println!(
                    "{:<26} {:>11} {:>11} {:>9}",
                    "TIMESTAMP", "DURATION", "MOVING AVG", "SUCCESS"
                );
            }
            for p in &points {
                println!(
                    "{:<26} {:>11.2} {:>11.2} {:>8.1}%",
                    format_millis(p.timestamp),
                    p.duration,
                    p.moving_avg,
                    p.success_rate
                );
            }
        }
        OutputMode::Json => write_json_line(&json!({
            "command": "trend",
            "category": category,
            "window": window,
            "points": points,
        }))?,
    }
    Ok(())
}

// ──────────────────── filter ────────────────────

fn run_filter(cli: &Cli, args: &FilterArgs) -> Result<(), CliError> {
    let session = Session::open(cli)?;
    let store = session.load_store(&args.source.input)?;

    let filter = RecordFilter {
        categories: (!args.categories.is_empty())
            .then(|| args.categories.iter().map(|c| Category::parse(c)).collect()),
        time_range: args.range,
        success_only: args.success_only,
    };
    let kept = filter.apply(store.metrics(), now_millis());

    let Some(output) = &args.output else {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", export::to_json(&kept)?)?;
        return Ok(());
    };

    export::write_file(output, &kept).inspect_err(|e| session.log.error(e))?;
    session
        .log
        .transfer(EventType::ExportWritten, kept.len(), &output.display().to_string());

    match output_mode(cli) {
        OutputMode::Human => {
            if !cli.quiet {
                println!(
                    "Kept {} of {} records, written to {}",
                    kept.len(),
                    store.len(),
                    output.display()
                );
            }
        }
        OutputMode::Json => write_json_line(&json!({
            "command": "filter",
            "kept": kept.len(),
            "total": store.len(),
            "output": output.to_string_lossy(),
        }))?,
    }
    Ok(())
}

// ──────────────────── config ────────────────────

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let config = Config::load(cli.config.as_deref())?;
            match output_mode(cli) {
                OutputMode::Human => {
                    let toml_str = toml::to_string_pretty(&config)
                        .map_err(|e| CliError::Internal(format!("serialize config: {e}")))?;
                    println!("{toml_str}");
                }
                OutputMode::Json => write_json_line(&json!({
                    "command": "config show",
                    "config": serde_json::to_value(&config)?,
                }))?,
            }
            Ok(())
        }
        ConfigCommand::Validate => match Config::load(cli.config.as_deref()) {
            Ok(config) => {
                let hash = config.stable_hash()?;
                match output_mode(cli) {
                    OutputMode::Human => {
                        println!("Configuration is valid.");
                        println!("  Source: {}", config.paths.config_file.display());
                        println!("  Hash: {hash}");
                    }
                    OutputMode::Json => write_json_line(&json!({
                        "command": "config validate",
                        "valid": true,
                        "path": config.paths.config_file.to_string_lossy(),
                        "hash": hash,
                    }))?,
                }
                Ok(())
            }
            Err(e) => {
                if output_mode(cli) == OutputMode::Json {
                    write_json_line(&json!({
                        "command": "config validate",
                        "valid": false,
                        "code": e.code(),
                        "error": e.to_string(),
                    }))?;
                }
                Err(CliError::User(format!("invalid config: {e}")))
            }
        },
    }
}

// ──────────────────── version ────────────────────

fn emit_version(cli: &Cli) -> Result<(), CliError> {
    let version = env!("CARGO_PKG_VERSION");
    match output_mode(cli) {
        OutputMode::Human => println!("benchboard {version}"),
        OutputMode::Json => write_json_line(&json!({
            "binary": "benchboard",
            "version": version,
            "package": env!("CARGO_PKG_NAME"),
        }))?,
    }
    Ok(())
}

// ──────────────────── output ────────────────────

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("BENCHBOARD_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }
    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };
    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}
