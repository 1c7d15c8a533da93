//! Scripted identity provider for unit tests.

use std::sync::{Arc, Mutex};

use super::provider::{IdentityProvider, SessionBroadcaster, SessionSubscription};
use super::{AuthError, PendingConfirmation, Session, SessionChange, User, now_secs};

pub(crate) const GOOD_PASSWORD: &str = "correct horse";

pub(crate) fn session(id: &str) -> Session {
    Session {
        access_token: format!("access-token-{id}"),
        refresh_token: format!("refresh-{id}"),
        expires_at: now_secs() + 3600,
        user: User {
            id: id.to_string(),
            email: Some(format!("{id}@example.com")),
        },
    }
}

/// Accepts [`GOOD_PASSWORD`] for any email. `interject` is broadcast while a
/// call is in flight.
#[derive(Default)]
pub(crate) struct FakeProvider {
    pub broadcaster: SessionBroadcaster,
    pub stored: Mutex<Option<Session>>,
    pub interject: Mutex<Option<SessionChange>>,
    pub fail_sign_out: bool,
    pub fail_restore: bool,
    pub fail_reset: bool,
    pub calls: Mutex<Vec<&'static str>>,
}

impl FakeProvider {
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn interject(&self, change: SessionChange) {
        *self.interject.lock().unwrap() = Some(change);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
        let pending = self.interject.lock().unwrap().take();
        if let Some(change) = pending {
            self.broadcaster.broadcast(&change);
        }
    }
}

impl IdentityProvider for Arc<FakeProvider> {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.record("sign_in");
        if password == GOOD_PASSWORD {
            let id = email.split('@').next().unwrap_or(email);
            Ok(session(id))
        } else {
            Err(AuthError::InvalidCredentials(
                "Invalid login credentials".to_string(),
            ))
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<PendingConfirmation, AuthError> {
        self.record("sign_up");
        if password.len() < 6 {
            return Err(AuthError::Provider(
                "Password should be at least 6 characters".to_string(),
            ));
        }
        Ok(PendingConfirmation {
            email: email.to_string(),
            user_id: Some("new-user".to_string()),
        })
    }

    async fn reset_password_for_email(&self, _email: &str) -> Result<(), AuthError> {
        self.record("reset");
        if self.fail_reset {
            return Err(AuthError::RateLimited(
                "Email rate limit exceeded".to_string(),
            ));
        }
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.record("sign_out");
        if self.fail_sign_out {
            Err(AuthError::Network("connection reset".to_string()))
        } else {
            Ok(())
        }
    }

    async fn get_current_session(&self) -> Result<Option<Session>, AuthError> {
        self.record("get_current_session");
        if self.fail_restore {
            return Err(AuthError::Network("connection refused".to_string()));
        }
        Ok(self.stored.lock().unwrap().clone())
    }

    fn subscribe(&self) -> SessionSubscription {
        self.broadcaster.subscribe()
    }
}
