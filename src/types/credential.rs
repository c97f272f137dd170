use serde::{Deserialize, Serialize};

use super::github::UserProfile;

/// Persisted GitHub authentication. Token and username are always stored together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    pub username: String,
    pub profile: UserProfile,
}

impl Credential {
    /// Builds a credential whose username is taken from the profile login.
    pub fn from_profile(token: &str, profile: UserProfile) -> Self {
        Self {
            token: token.to_string(),
            username: profile.login.clone(),
            profile,
        }
    }
}

/// Encrypted data container used by CryptoService.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedData {
    pub ciphertext: Vec<u8>,
    pub iv: Vec<u8>,
    pub auth_tag: Vec<u8>,
}
