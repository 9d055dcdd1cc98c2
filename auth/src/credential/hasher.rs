use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as Argon2PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Argon2;

use super::errors::CredentialError;

/// Salted credential hashing and verification (Argon2id).
///
/// Stateless: every hash carries its own salt and parameters in PHC format,
/// so verification needs nothing but the stored string.
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialHasher;

impl CredentialHasher {
    pub fn new() -> Self {
        Self
    }

    /// Hash a plaintext secret with a freshly generated salt.
    ///
    /// # Errors
    /// * `HashingFailed` - Argon2 rejected the input or parameters
    pub fn hash(&self, secret: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| CredentialError::HashingFailed(e.to_string()))
    }

    /// Compare a plaintext secret against a stored salted hash.
    ///
    /// A mismatch is `Ok(false)`; only an unparseable stored hash is an error.
    ///
    /// # Errors
    /// * `MalformedHash` - Stored value is not a PHC string
    pub fn verify(&self, secret: &str, stored_hash: &str) -> Result<bool, CredentialError> {
        let parsed_hash =
            PasswordHash::new(stored_hash).map_err(|e| CredentialError::MalformedHash(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(secret.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

/// Minimum strength rules a new secret must satisfy before it is hashed.
#[derive(Debug, Clone, Copy)]
pub struct PasswordPolicy {
    min_length: usize,
}

impl PasswordPolicy {
    pub const DEFAULT_MIN_LENGTH: usize = 8;

    pub fn new(min_length: usize) -> Self {
        Self { min_length }
    }

    /// # Errors
    /// * `TooShort` - Secret has fewer characters than the policy minimum
    pub fn check(&self, secret: &str) -> Result<(), CredentialError> {
        let actual = secret.chars().count();
        if actual < self.min_length {
            return Err(CredentialError::TooShort {
                min: self.min_length,
                actual,
            });
        }
        Ok(())
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MIN_LENGTH)
    }
}
