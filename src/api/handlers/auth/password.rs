//! Argon2id password hashing.
//!
//! Hashes are stored as PHC strings, so verification reads its cost
//! parameters from the stored hash rather than from the hasher.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretString};

#[derive(Clone, Debug)]
pub struct PasswordHasher {
    params: Params,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        // OWASP minimum for Argon2id: 19 MiB, 2 iterations, 1 lane.
        Self {
            params: Params::new(19 * 1024, 2, 1, None).unwrap_or_default(),
        }
    }
}

impl PasswordHasher {
    /// Cheap parameters so tests don't spend seconds hashing.
    #[cfg(test)]
    pub(crate) fn fast() -> Self {
        Self {
            params: Params::new(1024, 1, 1, None).unwrap_or_default(),
        }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password into a PHC string.
    ///
    /// # Errors
    /// Returns an error if Argon2 rejects the input.
    pub fn hash(&self, password: &SecretString) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.expose_secret().as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| anyhow!("failed to hash password: {err}"))
    }

    /// Check a password against a stored PHC string.
    ///
    /// A malformed stored hash counts as a mismatch.
    #[must_use]
    pub fn verify(&self, password: &SecretString, stored_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            return false;
        };
        self.argon2()
            .verify_password(password.expose_secret().as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() -> Result<()> {
        let hasher = PasswordHasher::fast();
        let hash = hasher.hash(&SecretString::from("correct-pw"))?;
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify(&SecretString::from("correct-pw"), &hash));
        assert!(!hasher.verify(&SecretString::from("wrong-pw"), &hash));
        Ok(())
    }

    #[test]
    fn hashes_are_salted() -> Result<()> {
        let hasher = PasswordHasher::fast();
        let first = hasher.hash(&SecretString::from("same"))?;
        let second = hasher.hash(&SecretString::from("same"))?;
        assert_ne!(first, second);
        Ok(())
    }

    #[test]
    fn malformed_hash_never_verifies() {
        let hasher = PasswordHasher::fast();
        assert!(!hasher.verify(&SecretString::from("pw"), "not-a-phc-string"));
        assert!(!hasher.verify(&SecretString::from("pw"), ""));
    }

    #[test]
    fn default_hash_verifies_with_fast_hasher() -> Result<()> {
        // Parameters come from the stored hash, not the verifying hasher.
        let hash = PasswordHasher::default().hash(&SecretString::from("pw"))?;
        assert!(PasswordHasher::fast().verify(&SecretString::from("pw"), &hash));
        Ok(())
    }
}
