use serde::Serialize;

use crate::store::Store;
use crate::types::{Repository, RepositoryDetail};

use super::init_store;

#[derive(Serialize)]
struct RepoListOutput {
    id: String,
    name: String,
    created_at: String,
    updated_at: String,
}

impl From<&Repository> for RepoListOutput {
    fn from(repo: &Repository) -> Self {
        Self {
            id: repo.id.clone(),
            name: repo.name.clone(),
            created_at: repo.created_at.to_rfc3339(),
            updated_at: repo.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
struct RepoShowOutput {
    #[serde(flatten)]
    repo: RepoListOutput,
    branches: Vec<String>,
    commit_count: i64,
}

pub fn run_repo_create(data_dir: &str, name: &str, json: bool) -> anyhow::Result<()> {
    let store = init_store(data_dir)?;
    let repo = store.create_repository(name)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&RepoListOutput::from(&repo))?
        );
    } else {
        println!("Created repository '{}'", repo.name);
        println!("  id: {}", repo.id);
    }
    Ok(())
}

pub fn run_repo_list(data_dir: &str, json: bool) -> anyhow::Result<()> {
    let store = init_store(data_dir)?;
    let repos = store.list_repositories()?;

    if json {
        let output: Vec<RepoListOutput> = repos.iter().map(RepoListOutput::from).collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if repos.is_empty() {
        println!("No repositories found.");
    } else {
        println!();
        for repo in &repos {
            println!(
                "  {}  {}  (updated {})",
                repo.id,
                repo.name,
                repo.updated_at.format("%Y-%m-%d %H:%M:%S")
            );
        }
        println!();
    }
    Ok(())
}

pub fn run_repo_show(data_dir: &str, id: &str, json: bool) -> anyhow::Result<()> {
    let store = init_store(data_dir)?;
    let RepositoryDetail {
        repository: repo,
        branches,
        commit_count,
    } = store
        .get_repository_detail(id)?
        .ok_or_else(|| anyhow::anyhow!("Repository not found: {}", id))?;
    let branches: Vec<String> = branches.into_iter().map(|b| b.name).collect();

    if json {
        let output = RepoShowOutput {
            repo: RepoListOutput::from(&repo),
            branches,
            commit_count,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{} ({})", repo.name, repo.id);
        println!("  branches: {}", branches.join(", "));
        println!("  commits:  {commit_count}");
    }
    Ok(())
}
