//! Credential persistence for dotpush.
//!
//! A credential is four keys written together: the sealed token, the username,
//! the profile JSON and a write stamp. Writes go to a primary backend and fall
//! back to a secondary one; reads take the newest record of the two.

use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use once_cell::sync::Lazy;
use rusqlite::params;
use tracing::{debug, info, warn};
use zeroize::Zeroize;

use crate::database::connection::Database;
use crate::services::crypto_service::{CryptoService, CryptoServiceTrait};
use crate::types::credential::Credential;
use crate::types::errors::StoreError;
use crate::types::github::UserProfile;

pub const KEY_TOKEN: &str = "github_token";
pub const KEY_USERNAME: &str = "github_username";
pub const KEY_PROFILE: &str = "github_user_info";
pub const KEY_SAVED_AT: &str = "github_saved_at";
pub const CREDENTIAL_KEYS: [&str; 4] = [KEY_TOKEN, KEY_USERNAME, KEY_PROFILE, KEY_SAVED_AT];

const STORE_KEY_PASSPHRASE: &str = "dotpush-credential-key-v1";
const STORE_KEY_SALT: &[u8] = b"dotpush-credkey";
const STORE_KEY_LENGTH: usize = 32;
const KEY_FILE: &str = "store.key";

/// Application-wide key, derived once per process.
static APP_KEY: Lazy<Vec<u8>> = Lazy::new(|| {
    CryptoService::new()
        .derive_key(STORE_KEY_PASSPHRASE, STORE_KEY_SALT)
        .unwrap_or_default()
});

static LAST_STAMP: AtomicU64 = AtomicU64::new(0);

/// Minimal key-value storage contract.
///
/// `set_many` must apply all entries or none.
pub trait KeyValueBackend: Send + Sync {
    fn name(&self) -> &str;
    fn get_many(&self, keys: &[&str]) -> Result<HashMap<String, String>, StoreError>;
    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StoreError>;
    fn remove_many(&self, keys: &[&str]) -> Result<(), StoreError>;
}

// === SqliteBackend ===

/// Backend over the `kv_store` table.
pub struct SqliteBackend {
    db: Arc<Database>,
}

impl SqliteBackend {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl KeyValueBackend for SqliteBackend {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn get_many(&self, keys: &[&str]) -> Result<HashMap<String, String>, StoreError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare("SELECT value FROM kv_store WHERE key = ?1")
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        let mut found = HashMap::new();
        for key in keys {
            let value: Option<String> = match stmt.query_row(params![key], |row| row.get(0)) {
                Ok(v) => Some(v),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(StoreError::DatabaseError(e.to_string())),
            };
            if let Some(value) = value {
                found.insert(key.to_string(), value);
            }
        }
        Ok(found)
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;

        let mut conn = self.db.connection();
        let tx = conn
            .transaction()
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        for (key, value) in entries {
            tx.execute(
                "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)",
                params![key, value, now],
            )
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        }
        tx.commit()
            .map_err(|e| StoreError::DatabaseError(e.to_string()))
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut conn = self.db.connection();
        let tx = conn
            .transaction()
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        for key in keys {
            tx.execute("DELETE FROM kv_store WHERE key = ?1", params![key])
                .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        }
        tx.commit()
            .map_err(|e| StoreError::DatabaseError(e.to_string()))
    }
}

// === JsonFileBackend ===

/// Backend over a single JSON object file. Every write replaces the whole file
/// through a temporary sibling and a rename.
pub struct JsonFileBackend {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileBackend {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, String>, StoreError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| StoreError::IoError(format!("Failed to read {}: {}", self.path.display(), e)))?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&content)
            .map_err(|e| StoreError::SerializationError(e.to_string()))
    }

    fn write_all(&self, map: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StoreError::IoError(format!("Failed to create directory: {}", e)))?;
        }
        let json = serde_json::to_string_pretty(map)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| StoreError::IoError(format!("Failed to write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| StoreError::IoError(format!("Failed to replace {}: {}", self.path.display(), e)))
    }
}

impl KeyValueBackend for JsonFileBackend {
    fn name(&self) -> &str {
        "json-file"
    }

    fn get_many(&self, keys: &[&str]) -> Result<HashMap<String, String>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut all = self.read_all()?;
        Ok(keys
            .iter()
            .filter_map(|k| all.remove_entry(*k))
            .collect())
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut all = self.read_all()?;
        for (key, value) in entries {
            all.insert(key.to_string(), value.clone());
        }
        self.write_all(&all)
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut all = self.read_all()?;
        let before = all.len();
        for key in keys {
            all.remove(*key);
        }
        if all.len() == before {
            return Ok(());
        }
        self.write_all(&all)
    }
}

// === MemoryBackend ===

/// Process-local backend, used when no data directory is wanted.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn get_many(&self, keys: &[&str]) -> Result<HashMap<String, String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        Ok(keys
            .iter()
            .filter_map(|k| entries.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect())
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        let mut map = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        for (key, value) in entries {
            map.insert(key.to_string(), value.clone());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut map = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}

// === CredentialStore ===

/// A credential as read from one backend, with its write stamp.
struct StoredRecord {
    credential: Credential,
    saved_at: u64,
}

/// Write stamp in nanoseconds since the epoch, strictly increasing within the
/// process so two saves never share a stamp.
fn next_stamp() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    let prev = LAST_STAMP
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last.saturating_add(1)))
        })
        .unwrap_or_else(|last| last);
    now.max(prev.saturating_add(1))
}

fn read_key_file(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
    let mut encoded = match fs::read_to_string(path) {
        Ok(encoded) => encoded,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(StoreError::IoError(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            )))
        }
    };
    let decoded = BASE64.decode(encoded.trim());
    encoded.zeroize();
    let key = decoded.map_err(|e| StoreError::CryptoError(format!("Invalid key file: {}", e)))?;
    if key.len() != STORE_KEY_LENGTH {
        return Err(StoreError::CryptoError(format!(
            "Invalid key file: expected {} bytes, got {}",
            STORE_KEY_LENGTH,
            key.len()
        )));
    }
    Ok(Some(key))
}

/// Creates `path` readable by the owner only. Fails if it already exists.
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Loads the per-install key, generating it on first use.
fn install_key(crypto: &CryptoService, path: &Path) -> Result<Vec<u8>, StoreError> {
    if let Some(key) = read_key_file(path)? {
        return Ok(key);
    }

    let key = crypto
        .generate_key()
        .map_err(|e| StoreError::CryptoError(e.to_string()))?;
    let mut encoded = BASE64.encode(&key);
    let written = write_private(path, encoded.as_bytes());
    encoded.zeroize();

    match written {
        Ok(()) => {
            info!(path = %path.display(), "generated credential key");
            Ok(key)
        }
        // Another process won the race; use its key.
        Err(e) if e.kind() == ErrorKind::AlreadyExists => read_key_file(path)?
            .ok_or_else(|| StoreError::IoError(format!("Key file {} disappeared", path.display()))),
        Err(e) => Err(StoreError::IoError(format!(
            "Failed to write {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Durable credential storage with a primary and a fallback backend.
///
/// Every save carries a write stamp; when both backends hold a credential the
/// newer one wins.
pub struct CredentialStore {
    primary: Box<dyn KeyValueBackend>,
    secondary: Box<dyn KeyValueBackend>,
    crypto: CryptoService,
    encryption_key: Vec<u8>,
}

impl CredentialStore {
    /// Store sealed with the application-wide key. That key is compiled into
    /// the binary, so this only obfuscates the token; use [`open_in`] for a
    /// per-install key.
    ///
    /// [`open_in`]: CredentialStore::open_in
    pub fn new(
        primary: Box<dyn KeyValueBackend>,
        secondary: Box<dyn KeyValueBackend>,
    ) -> Result<Self, StoreError> {
        Self::with_key(primary, secondary, APP_KEY.clone())
    }

    /// Store sealed with an explicit 32-byte key.
    pub fn with_key(
        primary: Box<dyn KeyValueBackend>,
        secondary: Box<dyn KeyValueBackend>,
        encryption_key: Vec<u8>,
    ) -> Result<Self, StoreError> {
        if encryption_key.len() != STORE_KEY_LENGTH {
            return Err(StoreError::CryptoError(format!(
                "Credential key must be {} bytes",
                STORE_KEY_LENGTH
            )));
        }
        Ok(Self {
            primary,
            secondary,
            crypto: CryptoService::new(),
            encryption_key,
        })
    }

    /// SQLite primary at `<data_dir>/dotpush.db`, JSON fallback at
    /// `<data_dir>/credentials.json`, random key at `<data_dir>/store.key`.
    pub fn open_in(data_dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(data_dir)
            .map_err(|e| StoreError::IoError(format!("Failed to create data directory: {}", e)))?;
        let key = install_key(&CryptoService::new(), &data_dir.join(KEY_FILE))?;
        let db = Database::open(data_dir.join("dotpush.db"))
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        Self::with_key(
            Box::new(SqliteBackend::new(Arc::new(db))),
            Box::new(JsonFileBackend::new(data_dir.join("credentials.json"))),
            key,
        )
    }

    /// Saves the credential in one write. A primary failure is logged and the
    /// write retried on the secondary; the primary's old record is then removed
    /// if possible, and otherwise loses to the newer stamp on load.
    pub fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        let sealed = self
            .crypto
            .seal_to_string(&credential.token, &self.encryption_key)
            .map_err(|e| StoreError::CryptoError(e.to_string()))?;
        let profile = serde_json::to_string(&credential.profile)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;
        let entries = [
            (KEY_TOKEN, sealed),
            (KEY_USERNAME, credential.username.clone()),
            (KEY_PROFILE, profile),
            (KEY_SAVED_AT, next_stamp().to_string()),
        ];

        match self.primary.set_many(&entries) {
            Ok(()) => {
                info!(username = %credential.username, backend = self.primary.name(), "credential saved");
                Ok(())
            }
            Err(e) => {
                warn!(backend = self.primary.name(), error = %e, "primary store failed, using fallback");
                self.secondary.set_many(&entries)?;
                if let Err(e) = self.primary.remove_many(&CREDENTIAL_KEYS) {
                    warn!(backend = self.primary.name(), error = %e, "stale primary credential not removed");
                }
                info!(username = %credential.username, backend = self.secondary.name(), "credential saved");
                Ok(())
            }
        }
    }

    /// Loads the newest credential across both backends.
    pub fn load(&self) -> Result<Option<Credential>, StoreError> {
        let primary = self.load_from(self.primary.as_ref());
        let secondary = self.load_from(self.secondary.as_ref());

        let newest = match (primary, secondary) {
            (Ok(Some(p)), Ok(Some(s))) => Some(if s.saved_at > p.saved_at { s } else { p }),
            (Ok(p), Ok(s)) => p.or(s),
            (Ok(p), Err(e)) => {
                warn!(backend = self.secondary.name(), error = %e, "fallback store read failed");
                p
            }
            (Err(e), Ok(s)) => {
                warn!(backend = self.primary.name(), error = %e, "primary store read failed");
                s
            }
            (Err(e), Err(_)) => return Err(e),
        };
        Ok(newest.map(|record| record.credential))
    }

    /// Removes the credential from both backends.
    pub fn clear(&self) -> Result<(), StoreError> {
        let mut first_err = None;
        for backend in [self.primary.as_ref(), self.secondary.as_ref()] {
            if let Err(e) = backend.remove_many(&CREDENTIAL_KEYS) {
                warn!(backend = backend.name(), error = %e, "failed to clear credential");
                first_err.get_or_insert(e);
            }
        }
        debug!("credential cleared");
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn load_from(&self, backend: &dyn KeyValueBackend) -> Result<Option<StoredRecord>, StoreError> {
        let mut values = backend.get_many(&CREDENTIAL_KEYS)?;
        let (sealed, username) = match (values.remove(KEY_TOKEN), values.remove(KEY_USERNAME)) {
            (Some(t), Some(u)) if !t.is_empty() && !u.is_empty() => (t, u),
            _ => return Ok(None),
        };

        let token = self
            .crypto
            .open_from_string(&sealed, &self.encryption_key)
            .map_err(|e| StoreError::CryptoError(e.to_string()))?;
        let profile = values
            .remove(KEY_PROFILE)
            .and_then(|json| serde_json::from_str::<UserProfile>(&json).ok())
            .unwrap_or_else(|| UserProfile::new(&username));
        // Records without a stamp predate stamping and lose every comparison.
        let saved_at = values
            .remove(KEY_SAVED_AT)
            .and_then(|stamp| stamp.parse().ok())
            .unwrap_or(0);

        Ok(Some(StoredRecord {
            credential: Credential {
                token,
                username,
                profile,
            },
            saved_at,
        }))
    }
}

impl Drop for CredentialStore {
    fn drop(&mut self) {
        self.encryption_key.zeroize();
    }
}
