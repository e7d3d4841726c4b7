use std::collections::BTreeMap;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// Source of live game servers. Returns the raw serialized server list so
/// that parsing failures can be told apart from transport failures.
#[async_trait]
pub trait GameServerDiscovery: Send + Sync {
    async fn list_game_servers(&self, filter: &BTreeMap<String, String>) -> Result<Vec<u8>>;
}

/// Talks to a discovery service over HTTP, e.g.
/// `GET http://discover:8081/api/v1/gameservers?labels=region=eu`.
#[derive(Clone)]
pub struct HttpDiscovery {
    base_url: String,
    client: Client,
}

impl HttpDiscovery {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/v1/gameservers", self.base_url)
    }
}

#[async_trait]
impl GameServerDiscovery for HttpDiscovery {
    async fn list_game_servers(&self, filter: &BTreeMap<String, String>) -> Result<Vec<u8>> {
        let url = self.endpoint();
        debug!(%url, ?filter, "Listing game servers");

        let response = self
            .client
            .get(&url)
            .query(filter)
            .send()
            .await
            .with_context(|| format!("Failed to reach discovery service at {}", url))?
            .error_for_status()
            .context("Discovery service returned an error status")?;

        let body = response
            .bytes()
            .await
            .context("Failed to read discovery response body")?;

        Ok(body.to_vec())
    }
}
