//! CLI driver for the alert aggregator.
//!
//! Selects the source queries, runs one aggregation pass, and writes the
//! result as a GeoJSON FeatureCollection (features in render order, legend
//! as a foreign member) for a map renderer to consume.

use std::sync::Arc;

use alertmap::catalog::HazardCatalog;
use alertmap::fetch::BasicClient;
use alertmap::filter::FilterOptions;
use alertmap::model::AggregationResult;
use alertmap::pass::{PassConfig, SourceQuery, run_pass};
use anyhow::{Context, Result};
use chrono::{FixedOffset, Utc};
use clap::Parser;
use serde_json::{Value, json};
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// The 2025 marine zone set for the NC coast, including the 60NM offshore
/// extension zones.
const DEFAULT_MARINE_ZONES: &str =
    "AMZ150,AMZ152,AMZ154,AMZ156,AMZ158,AMZ130,AMZ131,AMZ135,ANZ680,ANZ682,ANZ684,ANZ686";

#[derive(Parser)]
#[command(name = "alertmap")]
#[command(about = "Aggregate active hazard alerts into a renderable GeoJSON layer", long_about = None)]
struct Cli {
    /// Area codes to query (one source per code)
    #[arg(short, long, default_values_t = vec!["NC".to_string()])]
    area: Vec<String>,

    /// Comma-separated marine zone codes queried as one extra source
    /// (empty string disables the marine source)
    #[arg(short, long, default_value = DEFAULT_MARINE_ZONES)]
    marine_zones: String,

    /// Output file for the GeoJSON document
    #[arg(short, long, default_value = "alerts.geojson")]
    output: String,

    /// User-Agent header sent upstream (the API requires one)
    #[arg(long, default_value = "alertmap/0.1")]
    user_agent: String,

    /// Maximum concurrent upstream requests
    #[arg(short, long, default_value_t = 4)]
    concurrency: usize,

    /// Per-request timeout for source feeds, in seconds
    #[arg(long, default_value_t = 10)]
    source_timeout: u64,

    /// Per-request timeout for zone shapes, in seconds
    #[arg(long, default_value_t = 5)]
    zone_timeout: u64,

    /// Overall pass deadline, in seconds
    #[arg(long, default_value_t = 60)]
    deadline: u64,

    /// Optional comma-separated allow-list of zone id prefixes for
    /// secondary shape resolution (e.g. "AMZ,ANZ")
    #[arg(long)]
    zone_filter: Option<String>,

    /// Also drop alerts whose headline/description mentions CANCELLED
    /// (prone to false positives; the structured field is authoritative)
    #[arg(long, default_value_t = false)]
    scan_text_cancel: bool,

    /// Fixed UTC offset, in hours, for the human-readable timestamp in
    /// the output document
    #[arg(long, default_value_t = -5, allow_hyphen_values = true)]
    local_offset: i32,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/alertmap.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("alertmap.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let mut sources: Vec<SourceQuery> = cli
        .area
        .iter()
        .map(|code| SourceQuery::Area(code.clone()))
        .collect();

    let marine: Vec<String> = cli
        .marine_zones
        .split(',')
        .filter(|z| !z.trim().is_empty())
        .map(|z| z.trim().to_string())
        .collect();
    if !marine.is_empty() {
        sources.push(SourceQuery::Zones(marine));
    }

    let config = PassConfig {
        sources,
        source_timeout: Duration::from_secs(cli.source_timeout),
        zone_timeout: Duration::from_secs(cli.zone_timeout),
        concurrency: cli.concurrency,
        pass_deadline: Duration::from_secs(cli.deadline),
        zone_allow: cli.zone_filter.as_ref().map(|list| {
            list.split(',')
                .filter(|z| !z.trim().is_empty())
                .map(|z| z.trim().to_string())
                .collect()
        }),
        filter: FilterOptions {
            scan_text_for_cancellation: cli.scan_text_cancel,
        },
    };

    let client = Arc::new(BasicClient::new(&cli.user_agent)?);
    let catalog = HazardCatalog::builtin();

    let result = run_pass(client, &catalog, &config).await?;
    if result.is_empty() {
        info!("No active hazards; writing empty document");
    }

    let doc = render_document(&result, cli.local_offset)?;
    std::fs::write(&cli.output, serde_json::to_string_pretty(&doc)?)?;
    info!(path = %cli.output, features = result.records.len(), "Wrote alert document");

    Ok(())
}

/// Serializes the pass result as a GeoJSON FeatureCollection. Features are
/// in render order; `legend` and the timestamps ride along as foreign
/// members.
fn render_document(result: &AggregationResult, local_offset_hours: i32) -> Result<Value> {
    let features: Vec<Value> = result
        .records
        .iter()
        .map(|r| {
            json!({
                "type": "Feature",
                "geometry": r.record.geometry,
                "properties": {
                    "event": r.record.event_type,
                    "headline": r.record.headline,
                    "description": r.record.description,
                    "color": r.color,
                    "category": r.category,
                    "priority": r.priority,
                },
            })
        })
        .collect();

    let offset = local_offset_hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .context("local offset out of range")?;
    let now = Utc::now();

    Ok(json!({
        "type": "FeatureCollection",
        "features": features,
        "legend": result.legend,
        "unresolved": result.unresolved,
        "generated_at": now.to_rfc3339(),
        "generated_local": now.with_timezone(&offset).format("%I:%M %p").to_string(),
    }))
}
