use std::path::Path;
use std::sync::Arc;

use cloudx::config::ServerConfig;
use cloudx::server::{AppState, create_router};
use cloudx::types::Identity;
use tempfile::TempDir;
use tokio::task::JoinHandle;

pub const MASTER_KEY: &str = "integration-master-key";

/// Upload cap used by test servers, small enough to exceed cheaply.
pub const MAX_UPLOAD_BYTES: u64 = 64 * 1024;

pub struct TestServer {
    pub temp_dir: TempDir,
    pub base_url: String,
    pub master_key: String,
    state: Arc<AppState>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");

        let config = ServerConfig {
            data_dir: temp_dir.path().to_path_buf(),
            master_key: MASTER_KEY.to_string(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            ..ServerConfig::default()
        };
        let state = Arc::new(AppState::from_config(&config).expect("build app state"));
        let app = create_router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self::wait_for_ready(&base_url).await;

        Self {
            temp_dir,
            base_url,
            master_key: MASTER_KEY.to_string(),
            state,
            handle: Some(handle),
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

    pub fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Issues a key owned by `user_id`, the way `cloudx admin issue-key` does.
    pub fn issue_key(&self, user_id: &str) -> String {
        self.state
            .keys
            .issue(&Identity::user(user_id, None), "integration")
            .expect("issue key")
            .secret
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
