//! In-process store service for tests.

use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::db::{init_db, Database};
use crate::server::{self, ApiKeyStore, AppState};
use crate::store::StoreClient;

pub struct TestServer {
    url: String,
    pub state: AppState,
    handle: JoinHandle<()>,
    _temp_dir: TempDir,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::with_keys(&[]).await
    }

    pub async fn with_keys(keys: &[&str]) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_dir.path().join("store.db")).await.unwrap();
        let state = AppState::new(
            Database::new(pool),
            ApiKeyStore::new(keys.iter().copied()),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let serve_state = state.clone();
        let handle = tokio::spawn(async move {
            let _ = server::serve(listener, serve_state).await;
        });

        Self {
            url,
            state,
            handle,
            _temp_dir: temp_dir,
        }
    }

    pub fn url(&self) -> String {
        self.url.clone()
    }

    pub fn client(&self) -> StoreClient {
        StoreClient::new(self.url.clone(), None)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// URL of a local port nothing listens on.
pub async fn dead_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
