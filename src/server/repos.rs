use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::server::AppState;
use crate::server::dto::{
    BranchParams, CommitListResponse, CreateRepositoryRequest, CreateRepositoryResponse,
    MAX_COMMIT_LIST, RepositoryListResponse, TreeResponse,
};
use crate::server::extract::ApiJson;
use crate::server::response::{ApiError, StoreOptionExt, StoreResultExt};
use crate::store::DEFAULT_BRANCH;
use crate::types::CommitWithBranch;

pub async fn create_repository(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateRepositoryRequest>,
) -> impl IntoResponse {
    let repo = state
        .store
        .create_repository(&req.name)
        .api_err("Failed to create repository")?;

    tracing::info!(repo_id = %repo.id, name = %repo.name, "created repository");

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(CreateRepositoryResponse {
            id: repo.id,
            name: repo.name,
        }),
    ))
}

pub async fn list_repositories(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let repositories = state
        .store
        .list_repositories()
        .api_err("Failed to fetch repositories")?;

    Ok::<_, ApiError>(Json(RepositoryListResponse { repositories }))
}

/// Repository, branches and commit count come from a single read transaction.
pub async fn get_repository(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let detail = state
        .store
        .get_repository_detail(&id)
        .api_err("Failed to fetch repository")?
        .or_not_found("Repository not found")?;

    Ok::<_, ApiError>(Json(detail))
}

/// Newest commits first, capped at [`MAX_COMMIT_LIST`]. An unknown `branch`
/// lists the whole repository rather than failing.
pub async fn list_commits(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<BranchParams>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    store
        .get_repository(&id)
        .api_err("Failed to fetch commits")?
        .or_not_found("Repository not found")?;

    let branches = store.list_branches(&id).api_err("Failed to fetch commits")?;

    let branch_id = params
        .name()
        .and_then(|name| branches.iter().find(|b| b.name == name))
        .map(|b| b.id.as_str());

    let commits = store
        .list_commits(&id, branch_id, Some(MAX_COMMIT_LIST))
        .api_err("Failed to fetch commits")?;

    let names: HashMap<&str, &str> = branches
        .iter()
        .map(|b| (b.id.as_str(), b.name.as_str()))
        .collect();

    let commits = commits
        .into_iter()
        .map(|commit| {
            let branch_name = names
                .get(commit.branch_id.as_str())
                .copied()
                .unwrap_or("unknown")
                .to_string();
            CommitWithBranch {
                commit,
                branch_name,
            }
        })
        .collect();

    Ok::<_, ApiError>(Json(CommitListResponse { commits }))
}

pub async fn get_tree(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<BranchParams>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let branch_name = params.name().unwrap_or(DEFAULT_BRANCH);

    let branch = store
        .get_branch(&id, branch_name)
        .api_err("Failed to fetch tree")?
        .or_not_found("Branch not found")?;

    let Some(commit) = store
        .latest_commit(&id, &branch.id)
        .api_err("Failed to fetch tree")?
    else {
        return Ok::<_, ApiError>(Json(TreeResponse {
            tree: Vec::new(),
            commit: None,
        }));
    };

    let tree = store
        .list_files_for_commit(&id, &commit.id)
        .api_err("Failed to fetch tree")?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(TreeResponse {
        tree,
        commit: Some(commit),
    }))
}
