use dotpush::types::errors::*;

// === CryptoError Tests ===

#[test]
fn crypto_error_display_variants() {
    assert_eq!(
        CryptoError::KeyDerivation("bad salt".to_string()).to_string(),
        "Key derivation failed: bad salt"
    );
    assert_eq!(
        CryptoError::Decryption("tag mismatch".to_string()).to_string(),
        "Decryption failed: tag mismatch"
    );
    assert_eq!(
        CryptoError::InvalidKey("too short".to_string()).to_string(),
        "Invalid key: too short"
    );
}

// === SettingsError Tests ===

#[test]
fn settings_error_display_variants() {
    assert_eq!(
        SettingsError::IoError("disk full".to_string()).to_string(),
        "Settings I/O error: disk full"
    );
    assert_eq!(
        SettingsError::InvalidKey("github.nope".to_string()).to_string(),
        "Invalid settings key: github.nope"
    );
}

// === StoreError Tests ===

#[test]
fn store_error_display_variants() {
    assert_eq!(
        StoreError::DatabaseError("locked".to_string()).to_string(),
        "Store database error: locked"
    );
    assert_eq!(
        StoreError::IoError("denied".to_string()).to_string(),
        "Store I/O error: denied"
    );
    assert_eq!(
        StoreError::CryptoError("bad tag".to_string()).to_string(),
        "Store crypto error: bad tag"
    );
}

// === AuthError Tests ===

#[test]
fn auth_error_display_variants() {
    assert_eq!(
        AuthError::Configuration("no client id".to_string()).to_string(),
        "OAuth configuration error: no client id"
    );
    assert_eq!(
        AuthError::Provider("GitHub API error (500): boom".to_string()).to_string(),
        "GitHub provider error: GitHub API error (500): boom"
    );
    assert_eq!(
        AuthError::Denied("access_denied".to_string()).to_string(),
        "Authorization denied: access_denied"
    );
    assert_eq!(
        AuthError::Expired.to_string(),
        "Device code expired before authorization"
    );
    assert_eq!(
        AuthError::TimedOut(300).to_string(),
        "Stopped waiting for authorization after 300s"
    );
}

// === SyncError Tests ===

#[test]
fn sync_error_display_variants() {
    assert_eq!(
        SyncError::NotAuthenticated.to_string(),
        "Please authenticate with GitHub first"
    );
    assert_eq!(
        SyncError::RepoAccess("Bad credentials (401)".to_string()).to_string(),
        "Failed to create or access repository: Bad credentials (401)"
    );
    assert_eq!(
        SyncError::Push("conflict".to_string()).to_string(),
        "Failed to push: conflict"
    );
}

// === InspectError Tests ===

#[test]
fn inspect_error_display_variants() {
    assert_eq!(
        InspectError::BrokenGlobal("monaco".to_string()).to_string(),
        "broken editor global: monaco"
    );
}

#[test]
fn errors_implement_error_trait() {
    let errors: Vec<Box<dyn std::error::Error>> = vec![
        Box::new(AuthError::Expired),
        Box::new(SyncError::NotAuthenticated),
        Box::new(StoreError::IoError("x".to_string())),
        Box::new(InspectError::QueryFailed("x".to_string())),
    ];
    for err in errors {
        assert!(err.source().is_none());
    }
}
