//! HTTP access for the pass: the client trait, the production client, and
//! the fetch-or-skip policy shared by the feed and zone call sites.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use std::time::Duration;

use serde_json::Value;
use tracing::warn;

/// The one failure discipline for upstream I/O: bounded timeout, and any
/// failure is logged and swallowed so the pass continues without that
/// document. Both the source-feed and zone-shape call sites go through
/// here; neither may abort the pass.
#[derive(Debug, Clone, Copy)]
pub struct FetchPolicy {
    /// Call-site label for log lines ("source", "zone").
    pub label: &'static str,
    pub timeout: Duration,
}

impl FetchPolicy {
    pub fn new(label: &'static str, timeout: Duration) -> Self {
        Self { label, timeout }
    }

    /// Fetches `url` as JSON, or logs and returns `None` on any failure.
    pub async fn get_or_skip<C: HttpClient>(&self, client: &C, url: &str) -> Option<Value> {
        match client.get_json(url, self.timeout).await {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(kind = self.label, url = %url, error = %e, "Fetch failed, skipping");
                None
            }
        }
    }
}
