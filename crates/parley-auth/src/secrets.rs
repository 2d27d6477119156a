//! Provider token encryption using AES-256-GCM.
//!
//! The provider access token obtained during the callback exchange is
//! stored only in sealed form. Sealing uses AES-256-GCM with a fresh
//! 96-bit random nonce per operation; the key is loaded from
//! configuration at process start.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Nonce size for AES-256-GCM (96 bits).
const NONCE_SIZE: usize = 12;

/// Key size for AES-256 (256 bits).
const KEY_SIZE: usize = 32;

/// A sealed secret value as stored on the user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedSecret {
    /// Base64-encoded ciphertext (includes the GCM tag).
    pub ciphertext: String,
    /// Base64-encoded nonce.
    pub nonce: String,
}

/// Seals and opens provider tokens with a process-wide key.
#[derive(Clone)]
pub struct TokenCipher {
    key: [u8; KEY_SIZE],
}

impl TokenCipher {
    /// Creates a cipher from a hex-encoded 256-bit key.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the key is not 64 hex
    /// characters.
    pub fn from_hex_key(key_hex: &str) -> Result<Self, AuthError> {
        let bytes = hex::decode(key_hex)
            .map_err(|e| AuthError::configuration(format!("Invalid encryption key: {e}")))?;
        let key: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| {
            AuthError::configuration("Encryption key must be 64 hex characters (256 bits)")
        })?;
        Ok(Self { key })
    }

    /// Encrypts a plaintext token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the cipher cannot be
    /// constructed or encryption fails.
    pub fn seal(&self, plaintext: &str) -> Result<SealedSecret, AuthError> {
        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| AuthError::configuration(format!("Failed to create cipher: {e}")))?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| AuthError::configuration(format!("Encryption failed: {e}")))?;

        Ok(SealedSecret {
            ciphertext: BASE64.encode(&ciphertext),
            nonce: BASE64.encode(nonce_bytes),
        })
    }

    /// Decrypts a sealed token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the ciphertext or nonce is
    /// malformed, or authentication of the ciphertext fails.
    pub fn open(&self, sealed: &SealedSecret) -> Result<String, AuthError> {
        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| AuthError::configuration(format!("Failed to create cipher: {e}")))?;

        let ciphertext = BASE64
            .decode(&sealed.ciphertext)
            .map_err(|e| AuthError::configuration(format!("Invalid ciphertext base64: {e}")))?;
        let nonce_bytes = BASE64
            .decode(&sealed.nonce)
            .map_err(|e| AuthError::configuration(format!("Invalid nonce base64: {e}")))?;
        if nonce_bytes.len() != NONCE_SIZE {
            return Err(AuthError::configuration("Invalid nonce size"));
        }

        let plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
            .map_err(|_| AuthError::configuration("Decryption failed"))?;

        String::from_utf8(plaintext)
            .map_err(|e| AuthError::configuration(format!("Invalid UTF-8 in sealed value: {e}")))
    }
}

impl std::fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("TokenCipher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cipher() -> TokenCipher {
        TokenCipher::from_hex_key(&"ab".repeat(32)).unwrap()
    }

    #[test]
    fn test_seal_open_round_trip() {
        let cipher = test_cipher();
        let sealed = cipher.seal("provider-access-token-xyz").unwrap();
        assert_ne!(sealed.ciphertext, "provider-access-token-xyz");
        assert_eq!(cipher.open(&sealed).unwrap(), "provider-access-token-xyz");
    }

    #[test]
    fn test_fresh_nonce_per_seal() {
        let cipher = test_cipher();
        let a = cipher.seal("same-token").unwrap();
        let b = cipher.seal("same-token").unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_tampered_ciphertext_rejected() {
        let cipher = test_cipher();
        let mut sealed = cipher.seal("token").unwrap();
        let mut raw = BASE64.decode(&sealed.ciphertext).unwrap();
        raw[0] ^= 0x01;
        sealed.ciphertext = BASE64.encode(&raw);
        assert!(cipher.open(&sealed).is_err());
    }

    #[test]
    fn test_wrong_key_rejected() {
        let sealed = test_cipher().seal("token").unwrap();
        let other = TokenCipher::from_hex_key(&"cd".repeat(32)).unwrap();
        assert!(other.open(&sealed).is_err());
    }

    #[test]
    fn test_invalid_key_rejected() {
        assert!(TokenCipher::from_hex_key("zz").is_err());
        assert!(TokenCipher::from_hex_key(&"ab".repeat(16)).is_err());
    }
}
