// ABOUTME: Secret sealing for upstream credentials stored in bridge configurations
// ABOUTME: HKDF-derived AES-256-GCM key, sealing and opening of auth configuration secrets
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Security Module
//!
//! - Sealing of upstream API secrets at rest
//! - Session cookie extraction
//! - Bridge activity log sinks

use base64::{engine::general_purpose, Engine as _};
use bridge_core::{AuthConfig, SealedSecret};
use ring::{
    aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN},
    hkdf::{Salt, HKDF_SHA256},
    rand::{SecureRandom, SystemRandom},
};
use tracing::warn;
use zeroize::Zeroizing;

use crate::errors::{AppError, AppResult};

/// Bridge activity log sinks
pub mod audit;
/// Cookie helpers
pub mod cookies;

const HKDF_SALT: &[u8] = b"bridge-mcp-server";
const HKDF_INFO: &[u8] = b"upstream-secret-sealing:v1";

/// Seals and opens upstream secrets
///
/// Constructed once at startup from the required encryption secret and shared
/// by reference. A corrupt or foreign ciphertext always fails to open; there is
/// no fallback to returning the stored value.
pub struct SecretEncryptionManager {
    key: Zeroizing<[u8; 32]>,
    rng: SystemRandom,
}

impl SecretEncryptionManager {
    /// Derive the sealing key from `secret`
    ///
    /// # Errors
    ///
    /// Returns a config error if `secret` is empty, or an internal error if
    /// key derivation fails
    pub fn new(secret: &str) -> AppResult<Self> {
        if secret.trim().is_empty() {
            return Err(AppError::config("Encryption secret must not be empty"));
        }

        let prk = Salt::new(HKDF_SHA256, HKDF_SALT).extract(secret.as_bytes());
        let info = [HKDF_INFO];
        let okm = prk
            .expand(&info, HKDF_SHA256)
            .map_err(|e| AppError::internal(format!("Failed to expand key material: {e}")))?;

        let mut key = Zeroizing::new([0u8; 32]);
        okm.fill(&mut key[..])
            .map_err(|e| AppError::internal(format!("Failed to fill derived key: {e}")))?;

        Ok(Self {
            key,
            rng: SystemRandom::new(),
        })
    }

    fn aead_key(&self) -> AppResult<LessSafeKey> {
        let unbound = UnboundKey::new(&AES_256_GCM, &self.key[..])
            .map_err(|e| AppError::encryption(format!("Failed to create sealing key: {e}")))?;
        Ok(LessSafeKey::new(unbound))
    }

    /// Encrypt `plaintext` into a base64 `nonce || ciphertext || tag`
    ///
    /// # Errors
    ///
    /// Returns an encryption error if nonce generation or sealing fails
    pub fn seal(&self, plaintext: &str) -> AppResult<SealedSecret> {
        let key = self.aead_key()?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|e| AppError::encryption(format!("Failed to generate nonce: {e}")))?;
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        let mut in_out = plaintext.as_bytes().to_vec();
        key.seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
            .map_err(|e| AppError::encryption(format!("Sealing failed: {e}")))?;

        let mut combined = Vec::with_capacity(NONCE_LEN + in_out.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&in_out);

        Ok(SealedSecret::new(general_purpose::STANDARD.encode(&combined)))
    }

    /// Decrypt a sealed secret
    ///
    /// # Errors
    ///
    /// Returns an encryption error if the value is not valid base64, is too
    /// short, fails authentication or is not UTF-8
    pub fn open(&self, sealed: &SealedSecret) -> AppResult<Zeroizing<String>> {
        let combined = general_purpose::STANDARD
            .decode(sealed.as_str())
            .map_err(|e| AppError::encryption(format!("Sealed secret is not base64: {e}")))?;

        if combined.len() <= NONCE_LEN {
            return Err(AppError::encryption("Sealed secret is too short"));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|e| AppError::encryption(format!("Invalid nonce: {e}")))?;

        let key = self.aead_key()?;
        let mut in_out = Zeroizing::new(ciphertext.to_vec());
        let plaintext = key
            .open_in_place(nonce, Aad::empty(), in_out.as_mut_slice())
            .map_err(|_| {
                warn!("Sealed secret failed authentication");
                AppError::encryption("Sealed secret failed authentication")
            })?;

        String::from_utf8(plaintext.to_vec())
            .map(Zeroizing::new)
            .map_err(|_| AppError::encryption("Opened secret is not valid UTF-8"))
    }

    /// Seal every secret of a plaintext auth configuration
    ///
    /// # Errors
    ///
    /// Returns the first sealing failure
    pub fn seal_auth(&self, auth: AuthConfig<String>) -> AppResult<AuthConfig<SealedSecret>> {
        auth.try_map_secrets(|secret| {
            let secret = Zeroizing::new(secret);
            self.seal(&secret)
        })
    }

    /// Open every secret of a stored auth configuration
    ///
    /// # Errors
    ///
    /// Returns the first opening failure
    pub fn open_auth(
        &self,
        auth: &AuthConfig<SealedSecret>,
    ) -> AppResult<AuthConfig<Zeroizing<String>>> {
        auth.clone().try_map_secrets(|sealed| self.open(&sealed))
    }
}
