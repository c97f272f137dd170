use serde::{Deserialize, Serialize};

/// Placeholder shipped in place of a real OAuth app client id.
pub const CLIENT_ID_PLACEHOLDER: &str = "YOUR_GITHUB_OAUTH_CLIENT_ID";

/// Top-level dotpush settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SyncSettings {
    #[serde(default)]
    pub github: GitHubSettings,
    #[serde(default)]
    pub repository: RepositorySettings,
    #[serde(default)]
    pub polling: PollingSettings,
    #[serde(default)]
    pub extraction: ExtractionSettings,
}

/// OAuth app and API endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GitHubSettings {
    pub client_id: String,
    pub scope: String,
    pub oauth_base_url: String,
    pub api_base_url: String,
    pub user_agent: String,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            client_id: CLIENT_ID_PLACEHOLDER.to_string(),
            scope: "public_repo".to_string(),
            oauth_base_url: "https://github.com".to_string(),
            api_base_url: "https://api.github.com".to_string(),
            user_agent: "dotpush-Extension".to_string(),
        }
    }
}

impl GitHubSettings {
    /// Whether a real client id has been configured.
    pub fn has_client_id(&self) -> bool {
        let id = self.client_id.trim();
        !id.is_empty() && id != CLIENT_ID_PLACEHOLDER
    }
}

/// Destination repository for pushed solutions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepositorySettings {
    pub name: String,
    pub directory: String,
    pub branch: String,
    pub description: String,
    pub private: bool,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            name: "code-sync".to_string(),
            directory: "leetcode".to_string(),
            branch: "main".to_string(),
            description: "Coding solutions automatically synced by dotpush".to_string(),
            private: false,
        }
    }
}

/// Device-flow polling behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollingSettings {
    /// Added to the interval after a `slow_down` response.
    pub slow_down_increment_secs: u64,
    pub default_interval_secs: u64,
    pub default_expires_in_secs: u64,
    /// How often a waiting UI re-reads the credential store.
    pub ui_refresh_interval_secs: u64,
    pub ui_refresh_timeout_secs: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            slow_down_increment_secs: 5,
            default_interval_secs: 5,
            default_expires_in_secs: 900,
            ui_refresh_interval_secs: 2,
            ui_refresh_timeout_secs: 300,
        }
    }
}

/// Code extraction thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionSettings {
    /// Trimmed text must be strictly longer than this to count as a candidate.
    pub min_length: usize,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self { min_length: 10 }
    }
}
