use std::sync::Arc;
use std::time::Instant;

use axum::extract::{DefaultBodyLimit, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{
    Router,
    routing::{get, post},
};

use super::{repos, sync};
use crate::config::DEFAULT_MAX_PUSH_BYTES;
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Body size ceiling for push requests, in bytes.
    pub max_push_bytes: usize,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            max_push_bytes: DEFAULT_MAX_PUSH_BYTES,
        }
    }

    #[must_use]
    pub fn with_max_push_bytes(mut self, max_push_bytes: usize) -> Self {
        self.max_push_bytes = max_push_bytes;
        self
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn api_router(max_push_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/repos",
            get(repos::list_repositories).post(repos::create_repository),
        )
        .route("/repos/{id}", get(repos::get_repository))
        .route("/repos/{id}/commits", get(repos::list_commits))
        .route("/repos/{id}/tree", get(repos::get_tree))
        .route(
            "/repos/{id}/push",
            post(sync::push).layer(DefaultBodyLimit::max(max_push_bytes)),
        )
        .route("/repos/{id}/pull", get(sync::pull))
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api_router(state.max_push_bytes))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
