use serde::{Deserialize, Serialize};

use super::github::UserProfile;

/// Requests sent from the UI context to the background context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BackgroundRequest {
    #[serde(rename_all = "camelCase")]
    StartPolling {
        device_code: String,
        client_id: String,
        interval: Option<u64>,
        #[serde(default)]
        user_code: Option<String>,
        #[serde(default)]
        verification_uri: Option<String>,
        #[serde(default)]
        expires_in: Option<u64>,
    },
    StopPolling,
}

/// Notifications from the background context. Delivery is best-effort: a UI
/// that was closed when the event fired must re-read the credential store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BackgroundEvent {
    AuthComplete { token: String, profile: UserProfile },
    AuthFailed { reason: String },
}

impl BackgroundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BackgroundEvent::AuthComplete { .. } => "auth-complete",
            BackgroundEvent::AuthFailed { .. } => "auth-failed",
        }
    }
}
