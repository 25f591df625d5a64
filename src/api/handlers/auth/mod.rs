//! Auth handlers and supporting modules.
//!
//! This module coordinates the two-step login: password verification puts the
//! visitor session into a pending state, and the ordered-sequence challenge
//! promotes it to a full login.
//!
//! ## Collaborators
//!
//! - `UserStore`: user records (`MemoryUserStore`, `PgUserStore`).
//! - `SessionStore`: visitor sessions (`MemorySessionStore`, `PgSessionStore`).
//! - `CsrfGuard`: form tokens (`SessionCsrfGuard`, `NoopCsrfGuard` for tests).
//!
//! All three are held by `AuthState` and can be swapped independently.

pub(crate) mod challenge;
pub(crate) mod csrf;
mod error;
pub mod gate;
pub(crate) mod login;
pub(crate) mod logout;
mod password;
pub(crate) mod principal;
pub(crate) mod session;
mod sessions;
mod state;
mod users;
mod utils;
pub mod verifier;

pub use csrf::{CsrfGuard, NoopCsrfGuard, SessionCsrfGuard};
pub use error::AuthError;
pub use gate::{begin_pending, check_challenge, Destination, GateState};
pub use password::PasswordHasher;
pub use session::{VisitorSession, SESSION_COOKIE_NAME};
pub use sessions::{MemorySessionStore, PgSessionStore, SessionData, SessionStore};
pub use state::{
    AuthConfig, AuthState, ChallengeConfig, DEFAULT_CHALLENGE_ANSWER, MAX_SESSION_TTL_SECONDS,
};
pub use users::{MemoryUserStore, PgUserStore, User, UserStore};
pub use verifier::verify_credentials;
