//! CLI entry point for the GTFS-realtime validator.
//!
//! Validates one feed iteration (and optionally its predecessor) against a
//! static GTFS dataset, lists the rule catalog, or summarizes a feed.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use gtfs_rt_validator::{
    config::ValidatorConfig,
    context::ValidationContext,
    engine::ValidationEngine,
    fetch::{BasicClient, read_source},
    gtfs,
    gtfs_rt::FeedMessage,
    metadata::GtfsMetadata,
    output::{append_record, print_json, print_pretty, write_json},
    parser::parse_feed,
    rules::ALL_RULES,
    stats::FeedSummary,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::LevelFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "gtfs_rt_validator")]
#[command(about = "Validate GTFS-realtime feeds against a static GTFS dataset", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a GTFS-realtime feed from a file or URL
    Validate {
        /// Static GTFS directory or zip archive
        #[arg(long, value_name = "DIR_OR_ZIP")]
        gtfs: PathBuf,

        /// Current feed iteration
        #[arg(long, value_name = "FILE_OR_URL")]
        feed: String,

        /// Previous iteration of the same feed, for cross-iteration rules
        #[arg(long, value_name = "FILE_OR_URL")]
        previous: Option<String>,

        /// JSON file with validator thresholds
        #[arg(short, long)]
        config: Option<String>,

        /// Skip shape geometry (no E029 checks)
        #[arg(long, default_value_t = false)]
        ignore_shapes: bool,

        /// Stop waiting for validators after this many milliseconds
        #[arg(long)]
        deadline_ms: Option<u64>,

        /// Write the JSON report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// CSV file to append per-rule counts to
        #[arg(long)]
        csv: Option<String>,

        /// Validation time in milliseconds since the epoch (defaults to now)
        #[arg(long)]
        now_millis: Option<u64>,

        /// HTTP timeout for feed downloads
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
    /// List every validation rule
    Rules,
    /// Summarize the entities of a feed from a file or URL
    Summary {
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// HTTP timeout for feed downloads
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/gtfs_rt_validator.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("gtfs_rt_validator.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive(LevelFilter::INFO.into()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive(LevelFilter::DEBUG.into()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate {
            gtfs,
            feed,
            previous,
            config,
            ignore_shapes,
            deadline_ms,
            output,
            csv,
            now_millis,
            timeout_secs,
        } => {
            let mut config = match config {
                Some(path) => ValidatorConfig::load(&path)
                    .with_context(|| format!("failed to load config {path}"))?,
                None => ValidatorConfig::default(),
            };
            if ignore_shapes {
                config.ignore_shapes = true;
            }
            if deadline_ms.is_some() {
                config.deadline_millis = deadline_ms;
            }

            let client = BasicClient::with_timeout(Duration::from_secs(timeout_secs))?;
            validate(&client, &gtfs, &feed, previous.as_deref(), config, now_millis, output, csv)
                .await?;
        }
        Commands::Rules => {
            for rule in ALL_RULES {
                info!(
                    rule_id = rule.id,
                    severity = ?rule.severity,
                    title = rule.title,
                    "Rule"
                );
            }
            info!(total = ALL_RULES.len(), "Rule catalog");
        }
        Commands::Summary {
            source,
            timeout_secs,
        } => {
            let client = BasicClient::with_timeout(Duration::from_secs(timeout_secs))?;
            let feed = parse_feed(&read_source(&client, &source).await?)?;
            let summary = FeedSummary::from_feed(&feed);

            info!(
                version = %summary.gtfs_realtime_version,
                header_timestamp = ?summary.header_timestamp,
                entities = summary.total_entities,
                trip_updates = summary.trip_updates,
                stop_time_updates = summary.stop_time_updates,
                vehicles = summary.vehicles,
                position_pct = summary.position_pct(),
                alerts = summary.alerts,
                deleted = summary.deleted,
                "Feed summary"
            );
        }
    }

    Ok(())
}

/// Loads static data and the feed iterations, runs every validator and
/// writes the requested outputs.
#[tracing::instrument(skip(client, gtfs_path, config, output, csv), fields(gtfs = %gtfs_path.display()))]
#[allow(clippy::too_many_arguments)]
async fn validate(
    client: &BasicClient,
    gtfs_path: &Path,
    feed: &str,
    previous: Option<&str>,
    config: ValidatorConfig,
    now_millis: Option<u64>,
    output: Option<PathBuf>,
    csv: Option<String>,
) -> Result<()> {
    let dataset = {
        let gtfs_path = gtfs_path.to_path_buf();
        tokio::task::spawn_blocking(move || gtfs::load(gtfs_path)).await??
    };
    let metadata = Arc::new(GtfsMetadata::new(&dataset, &config));

    let current = fetch_feed(client, feed).await?;
    let now_millis = now_millis.unwrap_or_else(|| Utc::now().timestamp_millis().max(0) as u64);

    let deadline = config.deadline_millis.map(Duration::from_millis);
    let mut ctx = ValidationContext::new(now_millis, current, Arc::new(dataset), Arc::clone(&metadata))
        .with_config(Arc::new(config));
    if let Some(previous) = previous {
        // same static data for both iterations
        ctx = ctx.with_previous(fetch_feed(client, previous).await?, Some(metadata));
    }

    let mut engine = ValidationEngine::default();
    if let Some(deadline) = deadline {
        engine = engine.with_deadline(deadline);
    }
    info!(validators = ?engine.validator_names(), "Running validators");
    let report = engine.run(Arc::new(ctx)).await;

    if !report.incomplete_validators.is_empty() {
        warn!(validators = ?report.incomplete_validators, "Report is incomplete");
    }
    print_pretty(&report);
    print_json(&report)?;
    if let Some(path) = output {
        write_json(&path, &report)?;
    }
    if let Some(path) = csv {
        append_record(&path, &report)?;
    }
    Ok(())
}

async fn fetch_feed(client: &BasicClient, source: &str) -> Result<Arc<FeedMessage>> {
    let bytes = read_source(client, source).await?;
    let feed = parse_feed(&bytes).with_context(|| format!("failed to decode {source}"))?;
    Ok(Arc::new(feed))
}
