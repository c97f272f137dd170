// dotpush Settings Engine
// Loads, saves and edits SyncSettings. Settings are stored as a JSON file in the
// platform config directory; a few environment variables override them at load time.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::SyncSettings;

/// Environment variable that overrides the configured OAuth client id.
pub const ENV_CLIENT_ID: &str = "DOTPUSH_CLIENT_ID";
/// Environment variable that overrides the REST API base URL.
pub const ENV_API_BASE_URL: &str = "DOTPUSH_API_BASE_URL";
/// Environment variable that overrides the OAuth base URL.
pub const ENV_OAUTH_BASE_URL: &str = "DOTPUSH_OAUTH_BASE_URL";

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<SyncSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &SyncSettings;
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &str;
}

/// Settings engine that persists settings as JSON on disk.
pub struct SettingsEngine {
    config_path: String,
    settings: SyncSettings,
}

impl SettingsEngine {
    /// Creates a new SettingsEngine.
    ///
    /// If `path_override` is `Some`, uses that path for the config file.
    /// Otherwise, uses `settings.json` in the platform config directory.
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = match path_override {
            Some(p) => p,
            None => platform::get_config_dir()
                .join("settings.json")
                .to_string_lossy()
                .to_string(),
        };

        Self {
            config_path,
            settings: SyncSettings::default(),
        }
    }

    /// Applies environment overrides on top of the in-memory settings.
    /// Overrides are never written back to disk by `save`.
    pub fn apply_env_overrides(settings: &mut SyncSettings) {
        if let Ok(id) = std::env::var(ENV_CLIENT_ID) {
            if !id.trim().is_empty() {
                debug!("client id taken from {}", ENV_CLIENT_ID);
                settings.github.client_id = id.trim().to_string();
            }
        }
        if let Ok(url) = std::env::var(ENV_API_BASE_URL) {
            settings.github.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(url) = std::env::var(ENV_OAUTH_BASE_URL) {
            settings.github.oauth_base_url = url.trim_end_matches('/').to_string();
        }
    }

    /// Returns the settings with environment overrides applied.
    pub fn effective_settings(&self) -> SyncSettings {
        let mut settings = self.settings.clone();
        Self::apply_env_overrides(&mut settings);
        settings
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from the JSON config file.
    ///
    /// A missing file yields defaults; a malformed file is a serialization error.
    fn load(&mut self) -> Result<SyncSettings, SettingsError> {
        let path = Path::new(&self.config_path);

        if !path.exists() {
            debug!(path = %self.config_path, "no settings file, using defaults");
            self.settings = SyncSettings::default();
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;

        self.settings = serde_json::from_str(&content).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
        })?;
        Ok(self.settings.clone())
    }

    /// Saves the current settings, creating parent directories as needed.
    fn save(&self) -> Result<(), SettingsError> {
        let path = Path::new(&self.config_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::IoError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))?;

        info!(path = %self.config_path, "settings saved");
        Ok(())
    }

    fn get_settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Updates one setting by dot-notation key path, e.g. `github.client_id`
    /// or `polling.slow_down_increment_secs`, then saves.
    ///
    /// The new value is validated by round-tripping through `SyncSettings`.
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        if key.trim().is_empty() {
            return Err(SettingsError::InvalidKey("Key cannot be empty".to_string()));
        }

        let mut tree = serde_json::to_value(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        let pointer = format!("/{}", key.replace('.', "/"));
        let slot = tree
            .pointer_mut(&pointer)
            .ok_or_else(|| SettingsError::InvalidKey(format!("Key '{}' not found in settings", key)))?;
        if slot.is_object() {
            return Err(SettingsError::InvalidKey(format!(
                "Key '{}' names a section, not a value",
                key
            )));
        }
        *slot = value;

        self.settings = serde_json::from_value(tree).map_err(|e| {
            SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;

        self.save()
    }

    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = SyncSettings::default();
        self.save()
    }

    fn get_config_path(&self) -> &str {
        &self.config_path
    }
}
