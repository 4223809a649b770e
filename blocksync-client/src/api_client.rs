//! HTTP client for the block service API.
//!
//! Handles token authentication and the capture/fetch endpoints. Session
//! state lives on the client itself rather than in process globals, so two
//! clients with different accounts can coexist and tests can run in
//! isolation. Uses reqwest with JSON serialization.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use blocksync_types::{Block, BlockHash};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Session state shared across API client clones.
struct SessionState {
    token: Option<String>,
    username: Option<String>,
    /// Per-install identifier reported as the auth `agent` field.
    client_id: Uuid,
}

/// An authenticated session as returned by the auth endpoints.
#[derive(Clone, Debug)]
pub struct AuthSession {
    pub token: String,
    pub username: String,
}

/// New-account registration payload.
#[derive(Clone, Debug, Serialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

/// HTTP client for the block service.
pub struct ApiClient {
    client: Client,
    config: ClientConfig,
    session: Arc<RwLock<SessionState>>,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            config,
            session: Arc::new(RwLock::new(SessionState {
                token: None,
                username: None,
                client_id: Uuid::new_v4(),
            })),
        }
    }

    /// Sets the session token directly (for restoring a saved session).
    pub async fn set_session(&self, token: String, username: String) {
        let mut session = self.session.write().await;
        session.token = Some(token);
        session.username = Some(username);
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.token.is_some()
    }

    pub async fn current_username(&self) -> Option<String> {
        self.session.read().await.username.clone()
    }

    /// Per-install identifier used as the `agent` auth field.
    pub async fn client_id(&self) -> Uuid {
        self.session.read().await.client_id
    }

    pub async fn logout(&self) {
        let mut session = self.session.write().await;
        session.token = None;
        session.username = None;
    }

    // ── Auth ──

    pub async fn register(&self, req: &RegisterRequest) -> ClientResult<AuthSession> {
        let url = format!("{}/api/register", self.config.api_base_url);
        let resp = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "first_name": req.first_name,
                "last_name": req.last_name,
                "email": req.email,
                "username": req.username,
                "password": req.password,
                "platform": self.config.platform,
            }))
            .send()
            .await?;

        let resp = resp
            .error_for_status()
            .map_err(|e| ClientError::AuthFailed(e.to_string()))?;
        let token: TokenResponse = resp.json().await?;

        self.set_session(token.token.clone(), req.username.clone())
            .await;
        Ok(AuthSession {
            token: token.token,
            username: req.username.clone(),
        })
    }

    pub async fn login(&self, username: &str, password: &str) -> ClientResult<AuthSession> {
        let url = format!("{}/users/api/login", self.config.api_base_url);
        let agent = self.client_id().await.to_string();
        let resp = self
            .client
            .post(&url)
            .form(&[
                ("username", username),
                ("password", password),
                ("platform", self.config.platform.as_str()),
                ("agent", agent.as_str()),
            ])
            .send()
            .await?;

        let resp = resp
            .error_for_status()
            .map_err(|e| ClientError::AuthFailed(e.to_string()))?;
        let token: TokenResponse = resp.json().await?;

        self.set_session(token.token.clone(), username.to_string())
            .await;
        Ok(AuthSession {
            token: token.token,
            username: username.to_string(),
        })
    }

    // ── Capture ──

    /// Submits new text content; the server assigns the `luid` and returns
    /// the created block.
    pub async fn add_block(&self, text: &str) -> ClientResult<Block> {
        let agent = self.client_id().await.to_string();
        let resp = self
            .auth_post(
                "/my/blocks/add",
                &serde_json::json!({ "string": text, "agent": agent }),
            )
            .await?
            .error_for_status()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(resp.json().await?)
    }

    /// Submits a file attachment (with optional accompanying text) as a
    /// multipart upload.
    pub async fn add_block_with_file(
        &self,
        text: Option<&str>,
        file_path: &Path,
    ) -> ClientResult<Block> {
        let url = format!("{}/my/blocks/add", self.config.api_base_url);
        let auth = self.auth_header().await?;

        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        let bytes = tokio::fs::read(file_path).await?;

        let mut form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(bytes).file_name(file_name));
        if let Some(text) = text {
            form = form.text("text", text.to_string());
        }

        let resp = self
            .client
            .post(&url)
            .header(AUTHORIZATION, auth)
            .multipart(form)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(resp.json().await?)
    }

    // ── Fetch ──

    /// Fetches a single block by `luid`.
    pub async fn get_block(&self, luid: &str) -> ClientResult<Block> {
        let resp = self
            .auth_get(&format!("/my/blocks/get/{luid}"))
            .await?
            .error_for_status()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(resp.json().await?)
    }

    /// Lists the server's current content fingerprints, one per block.
    pub async fn get_block_hashes(&self) -> ClientResult<Vec<BlockHash>> {
        let resp = self
            .auth_get("/my/blocks/get/hashes")
            .await?
            .error_for_status()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(resp.json().await?)
    }

    /// Fetches every block the server knows about.
    pub async fn get_all_blocks(&self) -> ClientResult<Vec<Block>> {
        let resp = self
            .auth_get("/my/blocks/get")
            .await?
            .error_for_status()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(resp.json().await?)
    }

    /// Fetches exactly the named blocks.
    pub async fn get_blocks_by_luids(&self, luids: &[String]) -> ClientResult<Vec<Block>> {
        let resp = self
            .auth_post(
                "/my/blocks/get",
                &serde_json::json!({ "block_luids": luids }),
            )
            .await?
            .error_for_status()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(resp.json().await?)
    }

    // ── Request helpers ──

    async fn auth_get(&self, path: &str) -> ClientResult<reqwest::Response> {
        let url = format!("{}{}", self.config.api_base_url, path);
        let auth = self.auth_header().await?;
        debug!("GET {path}");
        Ok(self
            .client
            .get(&url)
            .header(AUTHORIZATION, auth)
            .send()
            .await?)
    }

    async fn auth_post(&self, path: &str, body: &impl Serialize) -> ClientResult<reqwest::Response> {
        let url = format!("{}{}", self.config.api_base_url, path);
        let auth = self.auth_header().await?;
        debug!("POST {path}");
        Ok(self
            .client
            .post(&url)
            .header(AUTHORIZATION, auth)
            .json(body)
            .send()
            .await?)
    }

    async fn auth_header(&self) -> ClientResult<String> {
        self.session
            .read()
            .await
            .token
            .as_ref()
            .map(|token| format!("Token {token}"))
            .ok_or(ClientError::AuthRequired)
    }
}
