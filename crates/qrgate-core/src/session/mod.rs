//! Session gating: identity-provider mediation, session status and routing.
//!
//! The gate is the only owner of the current [`Session`]. Everything else asks
//! it for a [`SessionStatus`] or a [`RouteDecision`].

pub mod form;
pub mod gate;
pub mod gotrue;
pub mod provider;
pub mod route;
pub mod store;
#[cfg(test)]
pub(crate) mod testing;

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

pub use form::{AuthForm, AuthMode, Submission};
pub use gate::{SessionGate, SessionStatus};
pub use gotrue::GoTrueProvider;
pub use provider::{IdentityProvider, SessionBroadcaster, SessionSubscription};
pub use route::{Route, RouteDecision, resolve_route};
pub use store::SessionStore;

pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

/// Identity attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Provider-issued proof of an authenticated identity.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry in seconds since the unix epoch.
    pub expires_at: u64,
    pub user: User,
}

impl Session {
    /// Returns true if the access token is expired.
    pub fn is_expired(&self) -> bool {
        now_secs() >= self.expires_at
    }

    /// Email of the signed-in user, or the user id when no email is known.
    pub fn display_identity(&self) -> &str {
        self.user.email.as_deref().unwrap_or(&self.user.id)
    }

    /// Masks the access token for display (first 6 chars + "...").
    pub fn masked_token(&self) -> String {
        mask_token(&self.access_token)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &self.masked_token())
            .field("refresh_token", &"***")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

pub(crate) fn mask_token(token: &str) -> String {
    if token.len() <= 10 {
        return "***".to_string();
    }
    let prefix: String = token.chars().take(6).collect();
    format!("{prefix}...")
}

/// Kind of unsolicited session change reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEvent::SignedIn => write!(f, "signed_in"),
            SessionEvent::SignedOut => write!(f, "signed_out"),
            SessionEvent::TokenRefreshed => write!(f, "token_refreshed"),
            SessionEvent::UserUpdated => write!(f, "user_updated"),
        }
    }
}

/// A session-change notification. `session` overwrites whatever the gate holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionChange {
    pub event: SessionEvent,
    pub session: Option<Session>,
}

impl SessionChange {
    pub fn new(event: SessionEvent, session: Option<Session>) -> Self {
        Self { event, session }
    }
}

/// Result of a sign-up: the account exists but must be confirmed out of band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirmation {
    pub email: String,
    pub user_id: Option<String>,
}

/// Errors reported by the identity provider.
///
/// Opaque beyond the human-readable message; surfaced as a notification and
/// never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidCredentials(String),
    #[error("{0}")]
    Network(String),
    #[error("{0}")]
    RateLimited(String),
    #[error("{0}")]
    Provider(String),
}

impl AuthError {
    /// Human-readable message suitable for a notification.
    pub fn message(&self) -> &str {
        match self {
            AuthError::InvalidCredentials(msg)
            | AuthError::Network(msg)
            | AuthError::RateLimited(msg)
            | AuthError::Provider(msg) => msg,
        }
    }
}
