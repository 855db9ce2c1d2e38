//! One aggregation pass: fetch → filter → resolve → classify → sequence.
//!
//! A pass is short-lived and self-contained: it starts with an empty seen
//! set and an empty zone cache, runs under one overall deadline, and
//! produces one [`AggregationResult`]. Upstream failures never abort the
//! pass; the only error a caller sees is a bad source configuration.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::time::{Instant, timeout_at};
use tracing::{info, warn};

use crate::catalog::HazardCatalog;
use crate::classify;
use crate::fetch::{FetchPolicy, HttpClient};
use crate::filter::{FilterOptions, filter_active};
use crate::model::{AggregationResult, AlertRecord};
use crate::parser::parse_alerts;
use crate::resolve::{ZoneFilter, resolve_record};
use crate::zones::ZoneShapeCache;

const API_BASE: &str = "https://api.weather.gov";

/// One upstream query for active alerts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceQuery {
    /// All active alerts for a state/area code, e.g. `NC`.
    Area(String),
    /// Active alerts for an explicit list of zone codes.
    Zones(Vec<String>),
    /// A raw, caller-assembled query URL.
    Url(String),
}

impl SourceQuery {
    pub fn url(&self) -> String {
        match self {
            Self::Area(code) => format!("{API_BASE}/alerts/active?area={code}"),
            Self::Zones(codes) => format!("{API_BASE}/alerts/active?zone={}", codes.join(",")),
            Self::Url(raw) => raw.clone(),
        }
    }
}

/// Everything one pass needs beyond the HTTP client and the catalog.
#[derive(Debug, Clone)]
pub struct PassConfig {
    pub sources: Vec<SourceQuery>,
    /// Timeout per source-feed request.
    pub source_timeout: Duration,
    /// Timeout per zone-shape request.
    pub zone_timeout: Duration,
    /// Maximum in-flight upstream requests.
    pub concurrency: usize,
    /// Overall pass deadline; work still pending at expiry is abandoned
    /// and the pass returns whatever resolved in time.
    pub pass_deadline: Duration,
    /// Optional allow-list of zone ids for secondary resolution.
    pub zone_allow: Option<Vec<String>>,
    pub filter: FilterOptions,
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            source_timeout: Duration::from_secs(10),
            zone_timeout: Duration::from_secs(5),
            concurrency: 4,
            pass_deadline: Duration::from_secs(60),
            zone_allow: None,
            filter: FilterOptions::default(),
        }
    }
}

/// Runs one aggregation pass.
///
/// # Errors
///
/// Only configuration problems (empty source list, zero concurrency) are
/// errors, reported before any fetching. Upstream failures degrade the
/// result instead; zero surviving records is a valid, empty result.
#[tracing::instrument(skip_all, fields(sources = config.sources.len()))]
pub async fn run_pass<C: HttpClient + 'static>(
    client: Arc<C>,
    catalog: &HazardCatalog,
    config: &PassConfig,
) -> Result<AggregationResult> {
    if config.sources.is_empty() {
        bail!("source list is empty; configure at least one alert query");
    }
    if config.concurrency == 0 {
        bail!("concurrency must be at least 1");
    }

    let deadline = Instant::now() + config.pass_deadline;
    let semaphore = Arc::new(Semaphore::new(config.concurrency));

    let raw = fetch_sources(&client, config, &semaphore, deadline).await;
    info!(count = raw.len(), "Fetched raw alert records");

    let now = Utc::now();
    let surviving = filter_active(raw, now, &config.filter);

    let (shaped, unresolved) =
        resolve_all(&client, config, &semaphore, deadline, surviving).await;

    let mut records = classify::classify(shaped, catalog);
    classify::sequence(&mut records);
    let legend = classify::legend(&records);

    info!(
        records = records.len(),
        legend = legend.len(),
        unresolved,
        "Pass complete"
    );

    Ok(AggregationResult {
        records,
        legend,
        unresolved,
    })
}

/// Fetches every source concurrently, preserving source order in the
/// returned records. A failed or timed-out source contributes nothing.
async fn fetch_sources<C: HttpClient + 'static>(
    client: &Arc<C>,
    config: &PassConfig,
    semaphore: &Arc<Semaphore>,
    deadline: Instant,
) -> Vec<AlertRecord> {
    let policy = FetchPolicy::new("source", config.source_timeout);

    let mut tasks = Vec::with_capacity(config.sources.len());
    for source in &config.sources {
        let client = client.clone();
        let sem = semaphore.clone();
        let url = source.url();

        tasks.push(tokio::spawn(async move {
            let _permit = sem.acquire().await.unwrap();
            match timeout_at(deadline, policy.get_or_skip(&*client, &url)).await {
                Ok(Some(doc)) => parse_alerts(&doc),
                Ok(None) => Vec::new(),
                Err(_) => {
                    warn!(source = %url, "Pass deadline hit before source responded");
                    Vec::new()
                }
            }
        }));
    }

    // Awaiting the handles in spawn order keeps records in source order,
    // which the dedup stage's first-seen-wins rule depends on.
    let mut records = Vec::new();
    for task in tasks {
        if let Ok(batch) = task.await {
            records.extend(batch);
        }
    }
    records
}

/// Resolves shapes for all surviving records concurrently, preserving
/// input order. Returns the shaped records and the count of records no
/// zone could shape.
async fn resolve_all<C: HttpClient + 'static>(
    client: &Arc<C>,
    config: &PassConfig,
    semaphore: &Arc<Semaphore>,
    deadline: Instant,
    records: Vec<AlertRecord>,
) -> (Vec<AlertRecord>, usize) {
    let policy = FetchPolicy::new("zone", config.zone_timeout);
    let zone_filter = match &config.zone_allow {
        Some(wanted) => ZoneFilter::allow(wanted.clone()),
        None => ZoneFilter::allow_all(),
    };
    let cache = Arc::new(ZoneShapeCache::new());

    let mut tasks = Vec::with_capacity(records.len());
    for record in records {
        let client = client.clone();
        let sem = semaphore.clone();
        let cache = cache.clone();
        let zone_filter = zone_filter.clone();

        tasks.push(tokio::spawn(async move {
            let _permit = sem.acquire().await.unwrap();
            let id = record.id.clone();
            match timeout_at(
                deadline,
                resolve_record(record, &*client, &cache, &policy, &zone_filter),
            )
            .await
            {
                Ok(shaped) => shaped,
                Err(_) => {
                    warn!(alert = %id, "Pass deadline hit while resolving zones");
                    Vec::new()
                }
            }
        }));
    }

    let mut shaped = Vec::new();
    let mut unresolved = 0usize;
    for task in tasks {
        match task.await {
            Ok(batch) if batch.is_empty() => unresolved += 1,
            Ok(batch) => shaped.extend(batch),
            Err(_) => unresolved += 1,
        }
    }
    (shaped, unresolved)
}
