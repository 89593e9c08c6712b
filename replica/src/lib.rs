use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use common::index::PageIndex;
use common::{IndexSize, PagePayload, SearchHit};
use parking_lot::RwLock;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared handle to one replica's index. Reads (search, links, size) take
/// the shared lock; ingest and snapshot save/load take the exclusive lock,
/// so no query ever observes the maps mid-mutation.
pub type SharedIndex = Arc<RwLock<PageIndex>>;

#[derive(Clone)]
pub struct AppState {
    pub index: SharedIndex,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_page")]
    pub page: usize,
}
fn default_page() -> usize {
    1
}

#[derive(Deserialize)]
pub struct LinksParams {
    pub url: String,
}

pub fn build_app(index: SharedIndex) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/pages", post(ingest_handler))
        .route("/search", get(search_handler))
        .route("/links", get(links_handler))
        .route("/size", get(size_handler))
        .with_state(AppState { index })
        .layer(cors)
}

async fn ingest_handler(State(state): State<AppState>, Json(page): Json<PagePayload>) -> StatusCode {
    if page.url.trim().is_empty() {
        // Nothing to key the record on; drop silently.
        return StatusCode::NO_CONTENT;
    }
    let mut index = state.index.write();
    index.ingest(&page.url, &page.title, &page.text, &page.outgoing_links);
    tracing::debug!(url = %page.url, outgoing = page.outgoing_links.len(), "page ingested");
    StatusCode::NO_CONTENT
}

async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<SearchHit>> {
    let terms: Vec<String> = params.q.split_whitespace().map(str::to_string).collect();
    let hits = state.index.read().search(&terms, params.page);
    tracing::debug!(q = %params.q, page = params.page, hits = hits.len(), "search served");
    Json(hits)
}

async fn links_handler(
    State(state): State<AppState>,
    Query(params): Query<LinksParams>,
) -> Json<Vec<String>> {
    Json(state.index.read().incoming_links(&params.url))
}

async fn size_handler(State(state): State<AppState>) -> Json<IndexSize> {
    Json(IndexSize {
        pages: state.index.read().len(),
    })
}
