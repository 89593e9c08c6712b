use crate::harvest::{harvest, HarvestedPage};
use anyhow::{anyhow, Result};
use reqwest::{header, Client};
use url::Url;

/// Fetched documents larger than this are skipped.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

pub fn fetch_client(user_agent: &str, timeout: std::time::Duration) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(user_agent)
        .redirect(reqwest::redirect::Policy::limited(5))
        .timeout(timeout)
        .build()?)
}

/// Fetch one page and extract its indexable content. Non-HTML, oversized,
/// and non-success responses are errors; the caller drops the url and moves
/// on, so a bad page never wedges the crawl loop.
pub async fn fetch_page(client: &Client, url: &str) -> Result<HarvestedPage> {
    let parsed = Url::parse(url)?;
    let resp = client.get(parsed.clone()).send().await?;
    if !resp.status().is_success() {
        return Err(anyhow!("fetch of {url} returned {}", resp.status()));
    }
    if let Some(ct) = resp.headers().get(header::CONTENT_TYPE) {
        let ct = ct.to_str().unwrap_or_default();
        if !ct.starts_with("text/html") {
            return Err(anyhow!("skipping non-html content type {ct:?}"));
        }
    }
    let bytes = resp.bytes().await?;
    if bytes.len() > MAX_BODY_BYTES {
        return Err(anyhow!("document too large ({} bytes)", bytes.len()));
    }
    let body = String::from_utf8_lossy(&bytes);
    Ok(harvest(&parsed, &body))
}
