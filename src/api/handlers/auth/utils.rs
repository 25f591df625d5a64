//! Small helpers for token generation and input validation.

use anyhow::{Context, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use once_cell::sync::Lazy;
use rand::{rngs::OsRng, RngCore};
use regex::Regex;
use sha2::{Digest, Sha256};

/// Create a random 32-byte token encoded as unpadded base64url.
///
/// Used for session keys and CSRF tokens.
pub(crate) fn generate_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate random token")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

/// Hash a session token so raw values never touch storage.
pub(crate) fn hash_session_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

static USERNAME_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[\w.@+-]{1,150}$").ok());

/// Usernames are 1-150 characters of letters, digits and `.@+-_`.
pub(crate) fn valid_username(username: &str) -> bool {
    USERNAME_RE
        .as_ref()
        .is_some_and(|re| re.is_match(username))
}

/// Compare two byte strings without short-circuiting on the first difference.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
