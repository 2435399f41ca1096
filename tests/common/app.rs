use std::sync::Arc;

use axum_test::TestServer;
use taskhub::build_router;
use taskhub::config::Config;
use taskhub::state::AppState;
use taskhub::store::MemoryStore;

/// Test configuration
pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        jwt_secret: "test-jwt-secret-that-is-at-least-32-characters-long".to_string(),
        jwt_expiration_hours: 24,
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origin: "*".to_string(),
    }
}

/// Test application wrapper
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
}

impl TestApp {
    /// Create a new test application over the in-memory store
    pub async fn new() -> Self {
        let config = test_config();
        let store = Arc::new(MemoryStore::new());
        let state = AppState::with_stores(config, store.clone(), store);

        let router = build_router(state.clone());
        let server = TestServer::new(router).expect("Failed to create test server");

        Self { server, state }
    }
}
