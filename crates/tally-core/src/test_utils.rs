//! Test utilities for tally-core
//!
//! A mock text provider that speaks both the OpenAI-compatible and the Ollama
//! wire formats, for backend and end-to-end tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

#[derive(Clone)]
struct ServerState {
    reply: String,
    prompts: Arc<Mutex<Vec<String>>>,
}

/// Mock provider server for testing
pub struct MockProviderServer {
    addr: SocketAddr,
    prompts: Arc<Mutex<Vec<String>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockProviderServer {
    /// Start a server that answers every completion with `reply`
    pub async fn start_with_reply(reply: &str) -> Self {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let state = ServerState {
            reply: reply.to_string(),
            prompts: prompts.clone(),
        };

        let app = Router::new()
            .route("/v1/chat/completions", post(handle_chat))
            .route("/v1/models", get(handle_ok))
            .route("/health", get(handle_ok))
            .route("/api/generate", post(handle_generate))
            .route("/api/tags", get(handle_ok))
            .with_state(state);

        Self::spawn(app, prompts).await
    }

    /// Start a server that answers every request with `status`
    pub async fn start_with_status(status: u16) -> Self {
        let code = StatusCode::from_u16(status).unwrap();
        let app = Router::new().fallback(move || async move { (code, "mock failure") });

        Self::spawn(app, Arc::new(Mutex::new(Vec::new()))).await
    }

    async fn spawn(app: Router, prompts: Arc<Mutex<Vec<String>>>) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            prompts,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Prompts received so far, in arrival order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockProviderServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn handle_ok() -> Json<Value> {
    Json(json!({ "status": "ok", "models": [] }))
}

/// OpenAI-compatible chat completions endpoint
async fn handle_chat(State(state): State<ServerState>, Json(request): Json<Value>) -> Json<Value> {
    let prompt = request["messages"]
        .as_array()
        .and_then(|messages| messages.last())
        .and_then(|m| m["content"].as_str())
        .unwrap_or_default()
        .to_string();
    state.prompts.lock().unwrap().push(prompt);

    Json(json!({
        "choices": [{
            "message": { "role": "assistant", "content": state.reply }
        }]
    }))
}

/// Ollama generate endpoint
async fn handle_generate(
    State(state): State<ServerState>,
    Json(request): Json<Value>,
) -> Json<Value> {
    let prompt = request["prompt"].as_str().unwrap_or_default().to_string();
    state.prompts.lock().unwrap().push(prompt);

    Json(json!({
        "model": request["model"],
        "response": state.reply,
        "done": true
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_status_server_fails_every_route() {
        let server = MockProviderServer::start_with_status(500).await;
        let resp = reqwest::get(format!("{}/api/tags", server.url())).await.unwrap();
        assert_eq!(resp.status().as_u16(), 500);
    }
}
