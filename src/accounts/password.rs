//! Password hashing behind a small trait so the algorithm can be swapped.
//!
//! The shipped hasher produces Argon2id PHC strings.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
};
use rand::rngs::OsRng;

use crate::config::PasswordHashingParams;
use crate::errors::{ConfigError, StorageError};

/// Slow, salted one-way password hashing.
///
/// Both operations are CPU bound; callers on the async runtime should run
/// them on a blocking worker.
pub trait PasswordHasher: Send + Sync {
    fn hash_password(&self, password: &str) -> Result<String, StorageError>;

    /// Returns false for mismatches and for unparseable hashes alike
    fn verify_password(&self, password: &str, hash: &str) -> bool;
}

/// Argon2id hasher
#[derive(Clone)]
pub struct Argon2PasswordHasher {
    params: Params,
}

impl Argon2PasswordHasher {
    pub fn new(params: &PasswordHashingParams) -> Result<Self, ConfigError> {
        let params = Params::new(
            params.memory_kib,
            params.iterations,
            params.parallelism,
            None,
        )
        .map_err(|e| ConfigError::PasswordHashingParamsInvalid(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash_password(&self, password: &str) -> Result<String, StorageError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| StorageError::HashingFailed(e.to_string()))
    }

    fn verify_password(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            return false;
        };
        // Cost parameters are read from the PHC string, so hashes made under
        // older settings keep verifying.
        self.argon2()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> Argon2PasswordHasher {
        Argon2PasswordHasher::new(&PasswordHashingParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hasher = fast_hasher();
        let hash = hasher.hash_password("CorrectPass1!").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("CorrectPass1!"));
        assert!(hasher.verify_password("CorrectPass1!", &hash));
        assert!(!hasher.verify_password("wrong", &hash));
    }

    #[test]
    fn test_hash_produces_different_salts() {
        let hasher = fast_hasher();
        let first = hasher.hash_password("same-password").unwrap();
        let second = hasher.hash_password("same-password").unwrap();
        assert_ne!(first, second);
        assert!(hasher.verify_password("same-password", &first));
        assert!(hasher.verify_password("same-password", &second));
    }

    #[test]
    fn test_verify_invalid_hash_format() {
        let hasher = fast_hasher();
        assert!(!hasher.verify_password("password", "not-a-valid-hash"));
        assert!(!hasher.verify_password("password", ""));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let result = Argon2PasswordHasher::new(&PasswordHashingParams {
            memory_kib: 1,
            iterations: 0,
            parallelism: 0,
        });
        assert!(matches!(
            result,
            Err(ConfigError::PasswordHashingParamsInvalid(_))
        ));
    }
}
