use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use super::client::HttpClient;

/// Production [`HttpClient`] backed by `reqwest`.
///
/// The upstream API rejects requests without a User-Agent, so one is baked
/// into the client at construction.
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self(client))
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn get_json(&self, url: &str, timeout: Duration) -> Result<Value> {
        let resp = self
            .0
            .get(url)
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }
}
