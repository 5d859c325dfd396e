use std::path::Path;
use std::sync::Arc;

use gitr_server::config::DEFAULT_MAX_PUSH_BYTES;
use gitr_server::server::{AppState, create_router};
use gitr_server::store::{SqliteStore, Store};
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// An in-process server on an ephemeral port, backed by a throwaway database.
pub struct TestServer {
    pub temp_dir: TempDir,
    pub base_url: String,
    /// Same store the server writes to, for arranging state HTTP can't reach.
    pub store: Arc<SqliteStore>,
    server_task: Option<JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with_push_limit(DEFAULT_MAX_PUSH_BYTES).await
    }

    pub async fn start_with_push_limit(max_push_bytes: usize) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = SqliteStore::new(temp_dir.path().join("gitr.db")).expect("open store");
        store.initialize().expect("initialize store");
        let store = Arc::new(store);

        let shared: Arc<dyn Store> = store.clone();
        let state = Arc::new(AppState::new(shared).with_max_push_bytes(max_push_bytes));
        let app = create_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let server_task = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self::wait_for_ready(&base_url).await;

        Self {
            temp_dir,
            base_url,
            store,
            server_task: Some(server_task),
        }
    }

    async fn wait_for_ready(base_url: &str) {
        let client = reqwest::Client::new();
        for _ in 0..50 {
            if client
                .get(format!("{}/health", base_url))
                .send()
                .await
                .is_ok()
            {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        panic!("Server did not become ready");
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    pub fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(task) = self.server_task.take() {
            task.abort();
        }
    }
}
