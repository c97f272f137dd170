use serde::{Deserialize, Serialize};

/// OAuth Device Flow session returned by GitHub's device-code endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceFlowSession {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    pub expires_in: u64,
    pub interval: u64,
}

/// Result of a single token poll.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Granted(String),
    Pending,
    SlowDown,
    Denied(String),
}

/// GitHub user profile. Fields we do not read are kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserProfile {
    pub fn new(login: &str) -> Self {
        Self {
            login: login.to_string(),
            name: None,
            avatar_url: None,
            html_url: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// Where a solution file lives in the destination repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteFileTarget {
    pub path: String,
    pub api_url: String,
    pub html_url: String,
}

/// Outcome of a successful push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushResult {
    pub path: String,
    pub html_url: String,
    /// `true` when the file did not exist before this push.
    pub created: bool,
    pub commit_sha: Option<String>,
    pub warnings: Vec<String>,
}

/// Body of `PUT /repos/{owner}/{repo}/contents/{path}`.
#[derive(Debug, Clone, Serialize)]
pub struct PutContentsRequest {
    pub message: String,
    pub content: String,
    pub branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

/// Body of `POST /user/repos`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRepoRequest {
    pub name: String,
    pub description: String,
    pub private: bool,
    pub auto_init: bool,
}
