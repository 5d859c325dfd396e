mod commands;
mod repo;

pub use commands::RepoCommands;
pub use repo::{run_repo_create, run_repo_list, run_repo_show};

use crate::config::ServerConfig;
use crate::store::SqliteStore;

/// Open the store in a data directory, checking it was initialized
pub fn init_store(data_dir: &str) -> anyhow::Result<SqliteStore> {
    let config = ServerConfig {
        data_dir: data_dir.into(),
        ..ServerConfig::default()
    };
    let db_path = config.db_path();

    if !db_path.exists() {
        anyhow::bail!(
            "Database not found at {}. Run 'gitr-server init' first.",
            db_path.display()
        );
    }

    SqliteStore::new(&db_path).map_err(Into::into)
}
