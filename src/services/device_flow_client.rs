//! GitHub OAuth Device Flow client.
//!
//! Each method performs exactly one HTTP exchange; scheduling and retries belong
//! to the background poller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::types::errors::AuthError;
use crate::types::github::{DeviceFlowSession, PollOutcome, UserProfile};
use crate::types::settings::GitHubSettings;

const DEVICE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";
const DEFAULT_EXPIRES_IN: u64 = 900;
const DEFAULT_INTERVAL: u64 = 5;
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Device-flow operations against the identity provider.
#[async_trait]
pub trait DeviceFlowApi: Send + Sync {
    /// Starts a device authorization session.
    async fn request_device_code(&self) -> Result<DeviceFlowSession, AuthError>;

    /// Performs one token exchange attempt. Never sleeps or loops.
    async fn poll_once(&self, session: &DeviceFlowSession) -> Result<PollOutcome, AuthError>;

    /// Fetches the profile of the token's owner.
    async fn fetch_identity(&self, token: &str) -> Result<UserProfile, AuthError>;

    /// Whether the token is still accepted by the API.
    async fn validate_token(&self, token: &str) -> bool {
        self.fetch_identity(token).await.is_ok()
    }
}

/// `reqwest`-backed device-flow client.
pub struct DeviceFlowClient {
    client: Client,
    settings: GitHubSettings,
}

fn string_field(body: &Value, key: &str) -> Option<String> {
    body.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Reads a JSON object body, mapping non-success statuses and parse failures to
/// `AuthError::Provider`.
async fn json_body(response: reqwest::Response) -> Result<Value, AuthError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| AuthError::Provider(format!("Failed to read response: {}", e)))?;
    if !status.is_success() {
        return Err(AuthError::Provider(format!(
            "GitHub API error ({}): {}",
            status.as_u16(),
            text
        )));
    }
    serde_json::from_str(&text)
        .map_err(|e| AuthError::Provider(format!("Invalid JSON from GitHub: {}", e)))
}

fn error_message(body: &Value) -> Option<String> {
    let code = string_field(body, "error")?;
    Some(string_field(body, "error_description").unwrap_or(code))
}

impl DeviceFlowClient {
    pub fn new(settings: GitHubSettings) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| AuthError::Configuration(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &GitHubSettings {
        &self.settings
    }

    fn oauth_url(&self, path: &str) -> String {
        format!("{}{}", self.settings.oauth_base_url.trim_end_matches('/'), path)
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.settings.api_base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl DeviceFlowApi for DeviceFlowClient {
    async fn request_device_code(&self) -> Result<DeviceFlowSession, AuthError> {
        if !self.settings.has_client_id() {
            return Err(AuthError::Configuration(
                "GitHub OAuth client id is not configured".to_string(),
            ));
        }

        let response = self
            .client
            .post(self.oauth_url("/login/device/code"))
            .header(header::ACCEPT, "application/json")
            .form(&[
                ("client_id", self.settings.client_id.as_str()),
                ("scope", self.settings.scope.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("Device code request failed: {}", e)))?;
        let body = json_body(response).await?;

        if let Some(message) = error_message(&body) {
            return Err(AuthError::Provider(message));
        }

        let required = |key: &str| {
            string_field(&body, key)
                .ok_or_else(|| AuthError::Provider(format!("Missing '{}' in device code response", key)))
        };
        let session = DeviceFlowSession {
            device_code: required("device_code")?,
            user_code: required("user_code")?,
            verification_uri: required("verification_uri")?,
            expires_in: body
                .get("expires_in")
                .and_then(Value::as_u64)
                .unwrap_or(DEFAULT_EXPIRES_IN),
            interval: body
                .get("interval")
                .and_then(Value::as_u64)
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_INTERVAL),
        };
        info!(user_code = %session.user_code, "device code issued");
        Ok(session)
    }

    async fn poll_once(&self, session: &DeviceFlowSession) -> Result<PollOutcome, AuthError> {
        let response = self
            .client
            .post(self.oauth_url("/login/oauth/access_token"))
            .header(header::ACCEPT, "application/json")
            .form(&[
                ("client_id", self.settings.client_id.as_str()),
                ("device_code", session.device_code.as_str()),
                ("grant_type", DEVICE_GRANT_TYPE),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("Token request failed: {}", e)))?;
        let body = json_body(response).await?;

        if let Some(token) = string_field(&body, "access_token") {
            debug!("access token granted");
            return Ok(PollOutcome::Granted(token));
        }

        let outcome = match string_field(&body, "error").as_deref() {
            Some("authorization_pending") => PollOutcome::Pending,
            Some("slow_down") => PollOutcome::SlowDown,
            Some(code) => PollOutcome::Denied(
                string_field(&body, "error_description").unwrap_or_else(|| code.to_string()),
            ),
            None => {
                return Err(AuthError::Provider(
                    "Token response had neither access_token nor error".to_string(),
                ))
            }
        };
        debug!(?outcome, "token poll");
        Ok(outcome)
    }

    async fn fetch_identity(&self, token: &str) -> Result<UserProfile, AuthError> {
        let response = self
            .client
            .get(self.api_url("/user"))
            .bearer_auth(token)
            .header(header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("User request failed: {}", e)))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("token rejected by GitHub");
        }
        let body = json_body(response).await?;
        serde_json::from_value(body)
            .map_err(|e| AuthError::Provider(format!("Invalid user profile: {}", e)))
    }
}
