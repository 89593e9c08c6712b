use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use common::{
    EnqueueRequest, RegisterResponse, ReplicaSpec, SearchHit, StatsSnapshot, TakeNextResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

pub mod frontier;
pub mod observers;
pub mod pool;
pub mod stats;

use frontier::Frontier;
use observers::ObserverHub;
use pool::ReplicaPool;
use stats::QueryStats;

pub struct DispatcherConfig {
    pub replicas: Vec<ReplicaSpec>,
    pub max_retries: usize,
    /// Declared frontier bound; read but not enforced.
    pub max_queue_size: usize,
    pub request_timeout: Duration,
    /// How long a long-poll waits for a stats push before returning 204.
    pub poll_window: Duration,
}

#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<ReplicaPool>,
    pub frontier: Arc<Frontier>,
    pub stats: Arc<QueryStats>,
    pub hub: Arc<ObserverHub>,
    pub poll_window: Duration,
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

pub fn build_app(config: DispatcherConfig) -> Router {
    let state = AppState {
        pool: Arc::new(ReplicaPool::new(
            &config.replicas,
            config.max_retries,
            config.request_timeout,
        )),
        frontier: Arc::new(Frontier::new(config.max_queue_size)),
        stats: Arc::new(QueryStats::new()),
        hub: Arc::new(ObserverHub::new()),
        poll_window: config.poll_window,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/links", get(links_handler))
        .route("/frontier", post(put_url_handler))
        .route("/frontier/next", post(take_next_handler))
        .route("/clients", post(register_handler))
        .route("/clients/:id/updates", get(poll_handler))
        .route("/clients/:id", delete(unregister_handler))
        .with_state(state)
        .layer(cors)
}

async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchHit>>, (StatusCode, String)> {
    // Normalize: drop blank terms; nothing left means nothing to route.
    let terms: Vec<&str> = params.q.split_whitespace().collect();
    if terms.is_empty() {
        return Ok(Json(Vec::new()));
    }
    let query = terms.join(" ");
    let page = params.page.max(1);

    match state.pool.search(&query, page).await {
        Ok(served) => {
            state.stats.record(&query, &served.replica, served.elapsed);
            tracing::debug!(
                q = %query,
                replica = %served.replica,
                hits = served.hits.len(),
                "search routed"
            );
            push_stats_if_changed(&state).await;
            Ok(Json(served.hits))
        }
        Err(err) => Err((StatusCode::BAD_GATEWAY, err.to_string())),
    }
}

async fn links_handler(
    State(state): State<AppState>,
    Query(params): Query<LinksParams>,
) -> Result<Json<Vec<String>>, (StatusCode, String)> {
    if params.url.trim().is_empty() {
        return Ok(Json(Vec::new()));
    }
    match state.pool.incoming_links(params.url.trim()).await {
        Ok(links) => Ok(Json(links)),
        Err(err) => Err((StatusCode::BAD_GATEWAY, err.to_string())),
    }
}

async fn put_url_handler(
    State(state): State<AppState>,
    Json(req): Json<EnqueueRequest>,
) -> StatusCode {
    state.frontier.put(&req.url);
    StatusCode::NO_CONTENT
}

async fn take_next_handler(State(state): State<AppState>) -> Json<TakeNextResponse> {
    Json(TakeNextResponse {
        url: state.frontier.take(),
    })
}

async fn register_handler(
    State(state): State<AppState>,
) -> Result<Json<RegisterResponse>, (StatusCode, String)> {
    let initial = full_snapshot(&state).await;
    match state.hub.register(initial) {
        Ok(id) => Ok(Json(RegisterResponse {
            client_id: id.to_string(),
        })),
        Err(err) => Err((StatusCode::INTERNAL_SERVER_ERROR, err.to_string())),
    }
}

async fn poll_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatsSnapshot>, StatusCode> {
    let id: Uuid = id.parse().map_err(|_| StatusCode::BAD_REQUEST)?;
    let rx = state.hub.receiver(&id).ok_or(StatusCode::NOT_FOUND)?;

    match tokio::time::timeout(state.poll_window, async {
        rx.lock().await.recv().await
    })
    .await
    {
        Ok(Some(snapshot)) => Ok(Json(snapshot)),
        // Channel closed: unregistered while we were waiting.
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::NO_CONTENT),
    }
}

async fn unregister_handler(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    match id.parse::<Uuid>() {
        Ok(id) => {
            state.hub.unregister(&id);
            StatusCode::NO_CONTENT
        }
        Err(_) => StatusCode::BAD_REQUEST,
    }
}

/// After a tracked search: if the ordered Top-10 content changed since the
/// last push, gather fresh replica sizes and latency averages and fan the
/// three-field snapshot out to every observer. Push failures are handled
/// inside the hub and never reach the query caller.
async fn push_stats_if_changed(state: &AppState) {
    if state.hub.is_empty() {
        // Keep the last-pushed baseline current even with nobody listening.
        let _ = state.stats.top10_if_changed();
        return;
    }
    if let Some(top_searches) = state.stats.top10_if_changed() {
        let snapshot = StatsSnapshot {
            top_searches,
            replica_sizes: state.pool.sizes().await,
            avg_response_deciseconds: state.stats.avg_response_deciseconds(),
        };
        state.hub.push(&snapshot);
    }
}

async fn full_snapshot(state: &AppState) -> StatsSnapshot {
    StatsSnapshot {
        top_searches: state.stats.top10(),
        replica_sizes: state.pool.sizes().await,
        avg_response_deciseconds: state.stats.avg_response_deciseconds(),
    }
}
