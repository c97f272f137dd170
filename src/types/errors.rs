use std::fmt;

// === CryptoError ===

/// Errors related to cryptographic operations.
#[derive(Debug)]
pub enum CryptoError {
    /// Failed to derive encryption key from a passphrase.
    KeyDerivation(String),
    /// Encryption operation failed.
    Encryption(String),
    /// Decryption operation failed.
    Decryption(String),
    /// Failed to generate random bytes.
    RandomGeneration(String),
    /// The provided key is invalid.
    InvalidKey(String),
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::KeyDerivation(msg) => write!(f, "Key derivation failed: {}", msg),
            CryptoError::Encryption(msg) => write!(f, "Encryption failed: {}", msg),
            CryptoError::Decryption(msg) => write!(f, "Decryption failed: {}", msg),
            CryptoError::RandomGeneration(msg) => {
                write!(f, "Random generation failed: {}", msg)
            }
            CryptoError::InvalidKey(msg) => write!(f, "Invalid key: {}", msg),
        }
    }
}

impl std::error::Error for CryptoError {}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}

// === StoreError ===

/// Errors raised by a credential storage backend.
#[derive(Debug)]
pub enum StoreError {
    /// SQLite operation failed.
    DatabaseError(String),
    /// File system operation failed.
    IoError(String),
    /// A stored value could not be encoded or decoded.
    SerializationError(String),
    /// Sealing or opening the stored token failed.
    CryptoError(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::DatabaseError(msg) => write!(f, "Store database error: {}", msg),
            StoreError::IoError(msg) => write!(f, "Store I/O error: {}", msg),
            StoreError::SerializationError(msg) => {
                write!(f, "Store serialization error: {}", msg)
            }
            StoreError::CryptoError(msg) => write!(f, "Store crypto error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

// === AuthError ===

/// Errors from the OAuth device flow.
#[derive(Debug)]
pub enum AuthError {
    /// The OAuth client id is missing or still the placeholder value.
    Configuration(String),
    /// The provider could not be reached or returned an unusable response.
    Provider(String),
    /// The provider refused the authorization.
    Denied(String),
    /// The device code expired before the user authorized it.
    Expired,
    /// The caller stopped waiting while the device code was still valid.
    TimedOut(u64),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Configuration(msg) => {
                write!(f, "OAuth configuration error: {}", msg)
            }
            AuthError::Provider(msg) => write!(f, "GitHub provider error: {}", msg),
            AuthError::Denied(reason) => write!(f, "Authorization denied: {}", reason),
            AuthError::Expired => write!(f, "Device code expired before authorization"),
            AuthError::TimedOut(secs) => {
                write!(f, "Stopped waiting for authorization after {}s", secs)
            }
        }
    }
}

impl std::error::Error for AuthError {}

// === SyncError ===

/// Errors from pushing a solution to the destination repository.
#[derive(Debug)]
pub enum SyncError {
    /// No credential is stored.
    NotAuthenticated,
    /// The extracted text is too short to be a solution.
    InvalidCode(String),
    /// The destination repository could not be read or created.
    RepoAccess(String),
    /// Reading or writing the file failed.
    Push(String),
    /// A network error occurred while talking to GitHub.
    Network(String),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::NotAuthenticated => write!(f, "Please authenticate with GitHub first"),
            SyncError::InvalidCode(msg) => write!(f, "No valid code found: {}", msg),
            SyncError::RepoAccess(msg) => {
                write!(f, "Failed to create or access repository: {}", msg)
            }
            SyncError::Push(msg) => write!(f, "Failed to push: {}", msg),
            SyncError::Network(msg) => write!(f, "GitHub network error: {}", msg),
        }
    }
}

impl std::error::Error for SyncError {}

// === InspectError ===

/// Errors raised while reading a foreign page.
#[derive(Debug)]
pub enum InspectError {
    /// An editor global exists but is only partially defined.
    BrokenGlobal(String),
    /// The page query itself failed.
    QueryFailed(String),
}

impl fmt::Display for InspectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InspectError::BrokenGlobal(msg) => write!(f, "broken editor global: {}", msg),
            InspectError::QueryFailed(msg) => write!(f, "page query failed: {}", msg),
        }
    }
}

impl std::error::Error for InspectError {}
