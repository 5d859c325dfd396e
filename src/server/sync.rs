use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use tokio::task::JoinError;

use crate::server::AppState;
use crate::server::dto::{BranchParams, PushResponse};
use crate::server::extract::ApiJson;
use crate::server::response::{ApiError, StoreResultExt};
use crate::types::PushRequest;

fn task_failed(e: JoinError) -> ApiError {
    tracing::error!("sync task failed: {e}");
    ApiError::internal("Internal server error")
}

/// Applies a client's branch, commits, snapshot, and history in one transaction.
pub async fn push(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<PushRequest>,
) -> impl IntoResponse {
    let store = Arc::clone(&state.store);
    let file_count = req.files.len();
    let history_count = req.history.len();

    // Snapshots can run to tens of megabytes; keep the write off the runtime.
    let (id, outcome) = tokio::task::spawn_blocking(move || {
        let outcome = store.push(&id, &req);
        (id, outcome)
    })
    .await
    .map_err(task_failed)?;

    let outcome = outcome.api_err("Failed to push to repository")?;

    tracing::info!(
        repo_id = %id,
        branch = %outcome.branch.name,
        commits = outcome.commits.len(),
        files = file_count,
        history = history_count,
        "push applied"
    );

    Ok::<_, ApiError>(Json(PushResponse {
        success: true,
        message: "Pushed successfully".to_string(),
    }))
}

/// Latest snapshot of the requested (or fallback) branch plus full history.
pub async fn pull(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<BranchParams>,
) -> impl IntoResponse {
    let store = Arc::clone(&state.store);

    let pulled = tokio::task::spawn_blocking(move || store.pull(&id, params.name()))
        .await
        .map_err(task_failed)?
        .api_err("Failed to pull from repository")?;

    tracing::debug!(
        branch = %pulled.branch,
        files = pulled.files.len(),
        history = pulled.history.len(),
        "pull served"
    );

    Ok::<_, ApiError>(Json(pulled))
}
