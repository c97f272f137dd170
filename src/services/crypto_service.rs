//! Token sealing for the credential store.
//!
//! AES-256-GCM via `ring`, with keys derived by PBKDF2-HMAC-SHA256. Sealed
//! values are stored as text: base64 of `iv || ciphertext || tag`.

use std::num::NonZeroU32;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroize;

use crate::types::credential::EncryptedData;
use crate::types::errors::CryptoError;

const PBKDF2_ITERATIONS: u32 = 100_000;
const KEY_LENGTH: usize = 32;
const NONCE_LENGTH: usize = 12;
const TAG_LENGTH: usize = 16;

/// Trait defining the cryptographic operations the store needs.
pub trait CryptoServiceTrait {
    /// Derives a 32-byte key from a passphrase and salt using PBKDF2.
    fn derive_key(&self, passphrase: &str, salt: &[u8]) -> Result<Vec<u8>, CryptoError>;

    fn encrypt_aes256gcm(&self, plaintext: &[u8], key: &[u8]) -> Result<EncryptedData, CryptoError>;

    fn decrypt_aes256gcm(&self, encrypted: &EncryptedData, key: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// `ring`-backed implementation.
pub struct CryptoService {
    rng: SystemRandom,
}

impl CryptoService {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }

    fn aead_key(key: &[u8]) -> Result<LessSafeKey, CryptoError> {
        if key.len() != KEY_LENGTH {
            return Err(CryptoError::InvalidKey(format!(
                "Key must be {} bytes, got {}",
                KEY_LENGTH,
                key.len()
            )));
        }
        let unbound = UnboundKey::new(&AES_256_GCM, key)
            .map_err(|_| CryptoError::InvalidKey("Rejected by AES-256-GCM".to_string()))?;
        Ok(LessSafeKey::new(unbound))
    }

    /// Fresh random 32-byte key.
    pub fn generate_key(&self) -> Result<Vec<u8>, CryptoError> {
        let mut key = vec![0u8; KEY_LENGTH];
        self.rng
            .fill(&mut key)
            .map_err(|_| CryptoError::RandomGeneration("Failed to generate key".to_string()))?;
        Ok(key)
    }

    /// Encrypts a UTF-8 secret and encodes it as a single base64 string.
    pub fn seal_to_string(&self, secret: &str, key: &[u8]) -> Result<String, CryptoError> {
        let sealed = self.encrypt_aes256gcm(secret.as_bytes(), key)?;
        let mut packed = Vec::with_capacity(NONCE_LENGTH + sealed.ciphertext.len() + TAG_LENGTH);
        packed.extend_from_slice(&sealed.iv);
        packed.extend_from_slice(&sealed.ciphertext);
        packed.extend_from_slice(&sealed.auth_tag);
        Ok(BASE64.encode(packed))
    }

    /// Inverse of [`CryptoService::seal_to_string`].
    pub fn open_from_string(&self, sealed: &str, key: &[u8]) -> Result<String, CryptoError> {
        let packed = BASE64
            .decode(sealed.trim())
            .map_err(|e| CryptoError::Decryption(format!("not base64: {}", e)))?;
        if packed.len() < NONCE_LENGTH + TAG_LENGTH {
            return Err(CryptoError::Decryption("sealed value too short".to_string()));
        }
        let tag_start = packed.len() - TAG_LENGTH;
        let encrypted = EncryptedData {
            iv: packed[..NONCE_LENGTH].to_vec(),
            ciphertext: packed[NONCE_LENGTH..tag_start].to_vec(),
            auth_tag: packed[tag_start..].to_vec(),
        };
        let mut plain = self.decrypt_aes256gcm(&encrypted, key)?;
        let text = String::from_utf8(plain.clone())
            .map_err(|e| CryptoError::Decryption(format!("not UTF-8: {}", e)));
        plain.zeroize();
        text
    }
}

impl Default for CryptoService {
    fn default() -> Self {
        Self::new()
    }
}

impl CryptoServiceTrait for CryptoService {
    fn derive_key(&self, passphrase: &str, salt: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let iterations = NonZeroU32::new(PBKDF2_ITERATIONS)
            .ok_or_else(|| CryptoError::KeyDerivation("Invalid iteration count".to_string()))?;
        let mut key = vec![0u8; KEY_LENGTH];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            iterations,
            salt,
            passphrase.as_bytes(),
            &mut key,
        );
        Ok(key)
    }

    fn encrypt_aes256gcm(&self, plaintext: &[u8], key: &[u8]) -> Result<EncryptedData, CryptoError> {
        let aead_key = Self::aead_key(key)?;

        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| CryptoError::RandomGeneration("Failed to generate nonce".to_string()))?;

        let mut in_out = plaintext.to_vec();
        let tag = aead_key
            .seal_in_place_separate_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| CryptoError::Encryption("Encryption operation failed".to_string()))?;

        Ok(EncryptedData {
            ciphertext: in_out,
            iv: nonce_bytes.to_vec(),
            auth_tag: tag.as_ref().to_vec(),
        })
    }

    fn decrypt_aes256gcm(&self, encrypted: &EncryptedData, key: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let aead_key = Self::aead_key(key)?;

        let nonce_bytes: [u8; NONCE_LENGTH] = encrypted.iv.as_slice().try_into().map_err(|_| {
            CryptoError::Decryption(format!(
                "IV must be {} bytes, got {}",
                NONCE_LENGTH,
                encrypted.iv.len()
            ))
        })?;
        if encrypted.auth_tag.len() != TAG_LENGTH {
            return Err(CryptoError::Decryption(format!(
                "Auth tag must be {} bytes, got {}",
                TAG_LENGTH,
                encrypted.auth_tag.len()
            )));
        }

        let mut in_out = Vec::with_capacity(encrypted.ciphertext.len() + TAG_LENGTH);
        in_out.extend_from_slice(&encrypted.ciphertext);
        in_out.extend_from_slice(&encrypted.auth_tag);

        let plaintext = aead_key
            .open_in_place(Nonce::assume_unique_for_key(nonce_bytes), Aad::empty(), &mut in_out)
            .map_err(|_| {
                CryptoError::Decryption("invalid key or corrupted data".to_string())
            })?;
        Ok(plaintext.to_vec())
    }
}
