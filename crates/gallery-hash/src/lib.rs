use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("failed to hash password: {0}")]
    Hash(argon2::password_hash::Error),
}

/// One-way credential hashing. The store and the auth gateway only ever see
/// this trait, so the concrete algorithm can be swapped without touching them.
pub trait CredentialHasher: Send + Sync {
    /// Salted one-way hash. Fresh salt per call, so output is
    /// non-deterministic even for equal inputs.
    fn hash(&self, raw: &str) -> Result<String, HashError>;

    /// Constant-time verification of `raw` against a stored hash string.
    /// An unparsable stored hash counts as a mismatch.
    fn verify(&self, raw: &str, stored: &str) -> bool;
}

/// Argon2id with the crate's default parameters.
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, raw: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(raw.as_bytes(), &salt)
            .map_err(HashError::Hash)?;
        Ok(hash.to_string())
    }

    fn verify(&self, raw: &str, stored: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored) else {
            return false;
        };
        Argon2::default()
            .verify_password(raw.as_bytes(), &parsed)
            .is_ok()
    }
}
