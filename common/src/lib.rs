use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod index;
pub mod snapshot;
pub mod tokenizer;

/// Fixed result-page size for search pagination (1-indexed pages).
pub const PAGE_SIZE: usize = 10;
/// Stored snippets are truncated to this many characters plus an ellipsis.
pub const SNIPPET_LEN: usize = 100;
/// Maximum number of outgoing links harvested from a single document.
pub const LINK_CAP: usize = 100;

/// What a replica stores per url. Replaced wholesale on re-ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub title: String,
    pub snippet: String,
    pub outgoing_links: Vec<String>,
}

/// What the crawler delivers to a replica.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagePayload {
    pub url: String,
    pub title: String,
    pub text: String,
    pub outgoing_links: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub snippet: String,
    pub incoming_link_count: usize,
    /// Pre-pagination hit count, identical across all pages of one query.
    pub total_results: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSize {
    pub pages: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueRequest {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TakeNextResponse {
    /// `None` means the frontier is empty right now; callers back off and retry.
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryCount {
    pub query: String,
    pub count: u64,
}

/// Full stats push sent to observers: pushed once on subscribe and then
/// whenever the ordered Top-10 content changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub top_searches: Vec<QueryCount>,
    pub replica_sizes: HashMap<String, usize>,
    pub avg_response_deciseconds: HashMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub client_id: String,
}

/// A named replica endpoint, parsed from `name=base_url` command-line values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaSpec {
    pub name: String,
    pub base_url: String,
}

impl std::str::FromStr for ReplicaSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, base_url) = s
            .split_once('=')
            .ok_or_else(|| format!("expected name=base_url, got {s:?}"))?;
        if name.trim().is_empty() || base_url.trim().is_empty() {
            return Err(format!("expected name=base_url, got {s:?}"));
        }
        Ok(ReplicaSpec {
            name: name.trim().to_string(),
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }
}
