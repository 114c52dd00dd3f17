//! Shared harness: in-process router on an ephemeral port, backed by the memory store
//! and a scripted verification provider.

#![allow(dead_code)]

use async_trait::async_trait;
use idv_gateway::infra::didit::{
    CreateSession, CreatedSession, ProviderError, SessionDecision, VerificationProvider,
};
use idv_gateway::transport;
use idv_gateway::{MemoryStore, VerificationSettings};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const WEBHOOK_SECRET: &str = "whsec_integration";

/// Provider double: hands out sequential session ids and reports a settable status.
#[derive(Default)]
pub struct ScriptedProvider {
    counter: AtomicUsize,
    pub decision_status: Mutex<Option<String>>,
    pub created: Mutex<Vec<CreateSession>>,
    /// Sessions the vendor answers with 404.
    pub purged: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn set_status(&self, status: &str) {
        *self.decision_status.lock().unwrap() = Some(status.to_string());
    }

    pub fn purge(&self, session_id: &str) {
        self.purged.lock().unwrap().push(session_id.to_string());
    }
}

#[async_trait]
impl VerificationProvider for ScriptedProvider {
    async fn create_session(&self, request: &CreateSession) -> Result<CreatedSession, ProviderError> {
        self.created.lock().unwrap().push(request.clone());
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(CreatedSession {
            session_id: format!("sess-{}", n),
            url: Some(format!("https://verify.example.com/session/sess-{}", n)),
            status: Some("Not Started".to_string()),
        })
    }

    async fn session_decision(&self, session_id: &str) -> Result<SessionDecision, ProviderError> {
        if self.purged.lock().unwrap().iter().any(|s| s == session_id) {
            return Err(ProviderError::Status {
                status: reqwest::StatusCode::NOT_FOUND,
                body: r#"{"detail":"Not found."}"#.to_string(),
            });
        }
        let status = self
            .decision_status
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| "In Progress".to_string());
        Ok(SessionDecision {
            session_id: session_id.to_string(),
            status: status.clone(),
            document: json!({ "session_id": session_id, "status": status }),
        })
    }
}

pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    pub provider: Arc<ScriptedProvider>,
    pub store: Arc<MemoryStore>,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub fn settings() -> VerificationSettings {
    VerificationSettings {
        workflow_id: "wf-test".to_string(),
        callback_url: Some("https://app.example.com/verification/done".to_string()),
        webhook_secret: WEBHOOK_SECRET.to_string(),
        webhook_tolerance_secs: 300,
    }
}

pub async fn spawn_server() -> TestServer {
    let provider = Arc::new(ScriptedProvider::default());
    let store = Arc::new(MemoryStore::new());
    let app_state = transport::http::AppState::new(
        provider.clone(),
        store.clone(),
        store.clone(),
        settings(),
    );
    let router = transport::http::create_router(app_state);

    // Bind to an ephemeral port to avoid conflicts between tests.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestServer {
        base_url: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        provider,
        store,
        handle,
    }
}
