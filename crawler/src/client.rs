use anyhow::{anyhow, Context, Result};
use common::{EnqueueRequest, PagePayload, TakeNextResponse};
use reqwest::Client;
use std::time::Duration;

fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

/// Client stub for the dispatcher. `refresh` rebuilds the underlying HTTP
/// client after a call failure, the same handle-refresh move the replica
/// stubs use.
pub struct DispatcherStub {
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl DispatcherStub {
    pub fn connect(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client(timeout),
            timeout,
        }
    }

    pub fn refresh(&mut self) {
        self.client = http_client(self.timeout);
        tracing::info!(url = %self.base_url, "dispatcher stub refreshed");
    }

    /// Pull one url from the frontier. `Ok(None)` means no work right now.
    pub async fn take_next(&self) -> Result<Option<String>> {
        let resp = self
            .client
            .post(format!("{}/frontier/next", self.base_url))
            .json(&serde_json::json!({}))
            .send()
            .await?
            .error_for_status()?;
        let next: TakeNextResponse = resp.json().await.context("decode take-next response")?;
        Ok(next.url)
    }

    pub async fn put_new_url(&self, url: &str) -> Result<()> {
        self.client
            .post(format!("{}/frontier", self.base_url))
            .json(&EnqueueRequest {
                url: url.to_string(),
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Client stub for one index replica on the delivery path.
pub struct ReplicaStub {
    pub name: String,
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl ReplicaStub {
    pub fn connect(name: &str, base_url: &str, timeout: Duration) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client(timeout),
            timeout,
        }
    }

    pub fn refresh(&mut self) {
        self.client = http_client(self.timeout);
        tracing::info!(replica = %self.name, "replica stub refreshed");
    }

    pub async fn send_page(&self, page: &PagePayload) -> Result<()> {
        let resp = self
            .client
            .post(format!("{}/pages", self.base_url))
            .json(page)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(anyhow!("replica {} rejected page: {}", self.name, resp.status()));
        }
        Ok(())
    }
}
