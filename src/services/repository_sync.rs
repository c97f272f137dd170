//! Pushes extracted solutions into the user's GitHub repository.
//!
//! Files are created or updated through the contents API, one commit per push.
//! The destination repository is created on first use.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::types::credential::Credential;
use crate::types::errors::SyncError;
use crate::types::github::{CreateRepoRequest, PushResult, PutContentsRequest, RemoteFileTarget};
use crate::types::language::file_extension_for;
use crate::types::settings::{GitHubSettings, RepositorySettings};

/// Slug used when the page URL does not name a problem.
pub const FALLBACK_SLUG: &str = "solution";
/// Trimmed sources shorter than this are refused.
pub const MIN_CODE_LENGTH: usize = 5;

const REQUEST_TIMEOUT_SECS: u64 = 30;

static PROBLEM_SLUG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/problems/([^/?#]+)").expect("slug pattern"));
static COMPLETE_LINE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[;})\]]$").expect("line end pattern"));

/// Extracts the problem slug from a practice-page URL.
pub fn problem_slug(url: &str) -> String {
    PROBLEM_SLUG
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| FALLBACK_SLUG.to_string())
}

/// Standard base64 of the UTF-8 bytes, as the contents API expects.
pub fn encode_content(text: &str) -> String {
    BASE64.encode(text.as_bytes())
}

/// Decodes contents-API base64, which GitHub line-wraps in responses.
pub fn decode_content(encoded: &str) -> Result<String, SyncError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(compact)
        .map_err(|e| SyncError::Push(format!("Invalid base64 content: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| SyncError::Push(format!("Content is not UTF-8: {}", e)))
}

/// Warns when the last non-empty line looks cut off.
pub fn completeness_warning(text: &str) -> Option<String> {
    let last = text.lines().map(str::trim_end).filter(|l| !l.trim().is_empty()).last()?;
    if COMPLETE_LINE_END.is_match(last) {
        None
    } else {
        Some(format!(
            "Code may be incomplete: last line does not end with ; }} ) or ]: {}",
            last.trim()
        ))
    }
}

/// GitHub error bodies carry a `message`; fall back to the raw text.
async fn failure_message(response: Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(text);
    format!("{} ({})", message, status.as_u16())
}

/// Contents-API client bound to one destination repository layout.
pub struct RepositorySync {
    client: Client,
    github: GitHubSettings,
    repository: RepositorySettings,
}

impl RepositorySync {
    pub fn new(github: GitHubSettings, repository: RepositorySettings) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(github.user_agent.clone())
            .build()
            .map_err(|e| SyncError::Network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            github,
            repository,
        })
    }

    pub fn repository(&self) -> &RepositorySettings {
        &self.repository
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.github.api_base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, builder: RequestBuilder, token: &str) -> RequestBuilder {
        builder
            .bearer_auth(token)
            .header(header::ACCEPT, "application/vnd.github+json")
    }

    /// Path, API URL and browser URL of the solution file.
    pub fn remote_target(&self, owner: &str, repo: &str, problem_url: &str, language: &str) -> RemoteFileTarget {
        let slug = problem_slug(problem_url);
        let directory = self.repository.directory.trim_matches('/');
        let file = format!("{}.{}", slug, file_extension_for(language));
        let path = if directory.is_empty() {
            file
        } else {
            format!("{}/{}", directory, file)
        };
        RemoteFileTarget {
            api_url: self.api_url(&format!("/repos/{}/{}/contents/{}", owner, repo, path)),
            html_url: format!(
                "https://github.com/{}/{}/blob/{}/{}",
                owner, repo, self.repository.branch, path
            ),
            path,
        }
    }

    /// Makes sure `owner/repo` exists, creating it when GitHub reports 404.
    pub async fn ensure_repository(&self, credential: &Credential, repo: &str) -> Result<(), SyncError> {
        let url = self.api_url(&format!("/repos/{}/{}", credential.username, repo));
        let response = self
            .authorized(self.client.get(&url), &credential.token)
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        match response.status() {
            s if s.is_success() => {
                debug!(repo, "repository exists");
                Ok(())
            }
            StatusCode::NOT_FOUND => {
                info!(repo, "creating repository");
                let body = CreateRepoRequest {
                    name: repo.to_string(),
                    description: self.repository.description.clone(),
                    private: self.repository.private,
                    auto_init: true,
                };
                let created = self
                    .authorized(self.client.post(self.api_url("/user/repos")), &credential.token)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| SyncError::Network(e.to_string()))?;
                if created.status().is_success() {
                    Ok(())
                } else {
                    Err(SyncError::RepoAccess(failure_message(created).await))
                }
            }
            _ => Err(SyncError::RepoAccess(failure_message(response).await)),
        }
    }

    /// Blob sha of the existing file, or `None` when it does not exist yet.
    async fn existing_sha(&self, credential: &Credential, target: &RemoteFileTarget) -> Result<Option<String>, SyncError> {
        let response = self
            .authorized(self.client.get(&target.api_url), &credential.token)
            .query(&[("ref", self.repository.branch.as_str())])
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => {
                let body: Value = response
                    .json()
                    .await
                    .map_err(|e| SyncError::Push(format!("Invalid contents response: {}", e)))?;
                Ok(body.get("sha").and_then(Value::as_str).map(str::to_string))
            }
            _ => Err(SyncError::Push(failure_message(response).await)),
        }
    }

    /// Creates or updates the solution file for `problem_url`.
    pub async fn push(
        &self,
        credential: &Credential,
        repo: &str,
        problem_url: &str,
        source_text: &str,
        language: &str,
    ) -> Result<PushResult, SyncError> {
        if credential.token.is_empty() || credential.username.is_empty() {
            return Err(SyncError::NotAuthenticated);
        }
        let code = source_text.trim();
        if code.chars().count() < MIN_CODE_LENGTH {
            return Err(SyncError::InvalidCode(format!(
                "code must be at least {} characters",
                MIN_CODE_LENGTH
            )));
        }

        let mut warnings = Vec::new();
        if let Some(warning) = completeness_warning(code) {
            warn!("{}", warning);
            warnings.push(warning);
        }

        self.ensure_repository(credential, repo).await?;

        let target = self.remote_target(&credential.username, repo, problem_url, language);
        let slug = problem_slug(problem_url);
        let sha = self.existing_sha(credential, &target).await?;
        let created = sha.is_none();

        let body = PutContentsRequest {
            message: if created {
                format!("Add solution for {}", slug)
            } else {
                format!("Update solution for {}", slug)
            },
            content: encode_content(source_text),
            branch: self.repository.branch.clone(),
            sha,
        };

        let response = self
            .authorized(self.client.put(&target.api_url), &credential.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(SyncError::Push(failure_message(response).await));
        }

        let result: Value = response
            .json()
            .await
            .map_err(|e| SyncError::Push(format!("Invalid push response: {}", e)))?;
        let content = result
            .get("content")
            .filter(|c| c.is_object())
            .ok_or_else(|| SyncError::Push("Unknown error".to_string()))?;

        let html_url = content
            .get("html_url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| target.html_url.clone());
        let commit_sha = result
            .pointer("/commit/sha")
            .and_then(Value::as_str)
            .map(str::to_string);

        info!(path = %target.path, created, "solution pushed");
        Ok(PushResult {
            path: target.path,
            html_url,
            created,
            commit_sha,
            warnings,
        })
    }
}
