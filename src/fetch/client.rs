use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Abstraction over the upstream JSON API. Both the alert feed and the
/// zone-shape endpoint speak JSON over GET, so a single method covers
/// every network touch point and tests can substitute a canned client.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetches `url` and parses the body as JSON. A non-success status is
    /// an error, as is exceeding `timeout`.
    async fn get_json(&self, url: &str, timeout: Duration) -> Result<Value>;
}
