//! App core for dotpush.
//!
//! Holds the services and the background poller, and implements the popup-level
//! flows on top of them: sign-in status, device login, waiting for a flow
//! finished elsewhere, extraction and push.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::managers::background_poller::BackgroundPoller;
use crate::platform;
use crate::services::credential_store::CredentialStore;
use crate::services::device_flow_client::{DeviceFlowApi, DeviceFlowClient};
use crate::services::editor_extractor::{EditorExtractor, PageInspector};
use crate::services::repository_sync::RepositorySync;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::types::auth::AuthStatus;
use crate::types::credential::Credential;
use crate::types::errors::{AuthError, StoreError, SyncError};
use crate::types::extraction::ExtractionResult;
use crate::types::github::{DeviceFlowSession, PushResult};
use crate::types::message::BackgroundRequest;
use crate::types::settings::SyncSettings;

const PRACTICE_PAGE_MARKER: &str = "leetcode.com/problems/";

/// Whether `url` is a problem page that can be pushed.
pub fn is_practice_page(url: &str) -> bool {
    url.contains(PRACTICE_PAGE_MARKER)
}

/// Central application struct.
pub struct App {
    pub settings: SyncSettings,
    pub store: Arc<CredentialStore>,
    pub auth: Arc<dyn DeviceFlowApi>,
    pub poller: BackgroundPoller,
    pub extractor: EditorExtractor,
    pub sync: RepositorySync,
}

impl App {
    /// Loads settings from the platform config dir and opens the credential
    /// store in `data_dir` (the platform data dir when `None`).
    pub fn new(data_dir: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut engine = SettingsEngine::new(None);
        if let Err(e) = engine.load() {
            warn!(error = %e, "settings unreadable, using defaults");
        }
        let settings = engine.effective_settings();

        let data_dir = match data_dir {
            Some(dir) => dir.to_path_buf(),
            None => platform::get_data_dir(),
        };
        let store = Arc::new(CredentialStore::open_in(&data_dir)?);
        Ok(Self::from_settings(settings, store)?)
    }

    /// Builds the app over the real GitHub client.
    pub fn from_settings(settings: SyncSettings, store: Arc<CredentialStore>) -> Result<Self, AuthError> {
        let auth: Arc<dyn DeviceFlowApi> = Arc::new(DeviceFlowClient::new(settings.github.clone())?);
        Self::with_parts(settings, store, auth)
    }

    pub fn with_parts(
        settings: SyncSettings,
        store: Arc<CredentialStore>,
        auth: Arc<dyn DeviceFlowApi>,
    ) -> Result<Self, AuthError> {
        let poller = BackgroundPoller::new(
            Arc::clone(&auth),
            Arc::clone(&store),
            settings.polling.slow_down_increment_secs,
        );
        let extractor = EditorExtractor::new(settings.extraction.min_length);
        let sync = RepositorySync::new(settings.github.clone(), settings.repository.clone())
            .map_err(|e| AuthError::Configuration(e.to_string()))?;
        Ok(Self {
            settings,
            store,
            auth,
            poller,
            extractor,
            sync,
        })
    }

    /// Current sign-in state. A stored token the API no longer accepts is cleared.
    pub async fn auth_status(&self) -> AuthStatus {
        let credential = match self.store.load() {
            Ok(Some(credential)) => credential,
            Ok(None) => return AuthStatus::signed_out(),
            Err(e) => {
                warn!(error = %e, "credential store unreadable");
                return AuthStatus::signed_out();
            }
        };

        if self.auth.validate_token(&credential.token).await {
            AuthStatus {
                authenticated: true,
                username: Some(credential.username),
            }
        } else {
            info!(username = %credential.username, "stored token rejected, clearing");
            if let Err(e) = self.store.clear() {
                warn!(error = %e, "failed to clear rejected token");
            }
            AuthStatus::signed_out()
        }
    }

    pub async fn request_device_code(&self) -> Result<DeviceFlowSession, AuthError> {
        self.auth.request_device_code().await
    }

    /// Requests a device code and hands it to the background poller.
    pub async fn begin_login(&self) -> Result<DeviceFlowSession, AuthError> {
        let session = self.request_device_code().await?;
        self.poller.start(session.clone());
        Ok(session)
    }

    /// Applies a request from the UI context. Returns the new session id for
    /// `start-polling`.
    pub fn handle_request(&self, request: BackgroundRequest) -> Result<Option<Uuid>, AuthError> {
        match request {
            BackgroundRequest::StartPolling {
                device_code,
                client_id,
                interval,
                user_code,
                verification_uri,
                expires_in,
            } => {
                if client_id != self.settings.github.client_id {
                    return Err(AuthError::Configuration(
                        "client_id does not match the configured OAuth app".to_string(),
                    ));
                }
                let polling = &self.settings.polling;
                let session = DeviceFlowSession {
                    device_code,
                    user_code: user_code.unwrap_or_default(),
                    verification_uri: verification_uri.unwrap_or_default(),
                    expires_in: expires_in.unwrap_or(polling.default_expires_in_secs),
                    interval: interval
                        .filter(|secs| *secs > 0)
                        .unwrap_or(polling.default_interval_secs),
                };
                Ok(Some(self.poller.start(session)))
            }
            BackgroundRequest::StopPolling => {
                self.poller.cancel();
                Ok(None)
            }
        }
    }

    /// Re-reads the store every `refresh` until a credential shows up or
    /// `timeout` passes. Finds flows completed by another process.
    pub async fn wait_for_credential(&self, refresh: Duration, timeout: Duration) -> Option<Credential> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match self.store.load() {
                Ok(Some(credential)) => return Some(credential),
                Ok(None) => {}
                Err(e) => debug!(error = %e, "store read failed while waiting"),
            }
            if tokio::time::Instant::now() + refresh > deadline {
                return None;
            }
            tokio::time::sleep(refresh).await;
        }
    }

    /// Waits for the credential of a login started with `session`. The wait
    /// ends at `ui_refresh_timeout_secs` or when the device code expires,
    /// whichever comes first, and the error says which.
    pub async fn wait_for_login(&self, session: &DeviceFlowSession) -> Result<Credential, AuthError> {
        let polling = &self.settings.polling;
        let refresh = Duration::from_secs(polling.ui_refresh_interval_secs.max(1));
        let wait_secs = polling.ui_refresh_timeout_secs.min(session.expires_in);
        match self.wait_for_credential(refresh, Duration::from_secs(wait_secs)).await {
            Some(credential) => Ok(credential),
            None if wait_secs >= session.expires_in => Err(AuthError::Expired),
            None => Err(AuthError::TimedOut(wait_secs)),
        }
    }

    /// Stops any poll and removes the stored credential.
    pub fn logout(&self) -> Result<(), StoreError> {
        self.poller.cancel();
        self.store.clear()?;
        info!("signed out");
        Ok(())
    }

    pub fn extract(&self, page: &dyn PageInspector) -> ExtractionResult {
        self.extractor.extract(page)
    }

    /// Extracts from `page` and pushes the result.
    pub async fn push_page(
        &self,
        page: &dyn PageInspector,
        url: &str,
        language: Option<&str>,
    ) -> Result<PushResult, SyncError> {
        let extraction = self.extract(page);
        self.push_extraction(&extraction, url, language).await
    }

    /// Pushes an extraction made earlier. `language` overrides the classified tag.
    pub async fn push_extraction(
        &self,
        extraction: &ExtractionResult,
        url: &str,
        language: Option<&str>,
    ) -> Result<PushResult, SyncError> {
        let credential = match self.store.load() {
            Ok(Some(credential)) => credential,
            Ok(None) => return Err(SyncError::NotAuthenticated),
            Err(e) => {
                warn!(error = %e, "credential store unreadable");
                return Err(SyncError::NotAuthenticated);
            }
        };

        if !extraction.found {
            return Err(SyncError::InvalidCode(extraction.diagnostics.join("; ")));
        }

        let language = language.unwrap_or(extraction.language.as_str());
        self.sync
            .push(
                &credential,
                &self.settings.repository.name,
                url,
                &extraction.text,
                language,
            )
            .await
    }
}
