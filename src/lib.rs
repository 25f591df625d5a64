//! # Authgate
//!
//! `authgate` serves a two-step login: a username/password form followed by an
//! ordered-sequence challenge. Passing the password step only marks the visitor
//! session as *pending*; the session becomes authenticated once the challenge
//! answer matches, and the visitor is then routed to `/admin/` or `/welcome/`
//! depending on the account role.
//!
//! ## Collaborators
//!
//! User records, session persistence and CSRF tokens are reached through the
//! `UserStore`, `SessionStore` and `CsrfGuard` traits. The server runs against
//! in-memory stores by default and switches to Postgres when a DSN is given.
//!
//! ## Failure reporting
//!
//! Wrong credentials and wrong challenge answers are never explained to the
//! visitor: the login form is shown again, or the visitor is sent back to the
//! challenge.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
    }
}
