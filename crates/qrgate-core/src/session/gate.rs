//! Session status state machine.
//!
//! ```text
//! Unknown ──resolve──▶ Authenticated | Unauthenticated
//! Unauthenticated ──sign_in ok──▶ Authenticated
//! Authenticated ──sign_out ok──▶ Unauthenticated
//! any ──notification──▶ Authenticated | Unauthenticated
//! ```
//!
//! Notifications are applied in delivery order. A notification that lands
//! while a provider call is in flight wins over that call's result: the caller
//! still gets the result, but the status keeps what the notification set.

use super::provider::{IdentityProvider, SessionSubscription};
use super::route::{Route, RouteDecision, resolve_route};
use super::{AuthError, PendingConfirmation, Session, SessionChange, SessionEvent};

/// Current session status as seen by the gate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// Not resolved yet (startup).
    #[default]
    Unknown,
    Authenticated(Session),
    Unauthenticated,
}

impl SessionStatus {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionStatus::Authenticated(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionStatus::Authenticated(session) => Some(session),
            SessionStatus::Unknown | SessionStatus::Unauthenticated => None,
        }
    }

    fn from_session(session: Option<Session>) -> Self {
        match session {
            Some(session) => SessionStatus::Authenticated(session),
            None => SessionStatus::Unauthenticated,
        }
    }
}

/// Owns the session and mediates every identity-provider call.
pub struct SessionGate<P> {
    provider: P,
    status: SessionStatus,
    subscription: Option<SessionSubscription>,
    /// Bumped on every applied notification.
    epoch: u64,
}

impl<P: IdentityProvider> SessionGate<P> {
    /// Creates a gate in the `Unknown` state and subscribes to `provider`.
    pub fn new(provider: P) -> Self {
        let subscription = provider.subscribe();
        Self {
            provider,
            status: SessionStatus::Unknown,
            subscription: Some(subscription),
            epoch: 0,
        }
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn session(&self) -> Option<&Session> {
        self.status.session()
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Applies the routing policy to `requested` for the current status.
    pub fn route(&self, requested: Route) -> RouteDecision {
        resolve_route(requested, &self.status)
    }

    /// Resolves the startup `Unknown` state from the provider's stored session.
    ///
    /// A provider failure resolves to `Unauthenticated`.
    pub async fn resolve(&mut self) -> &SessionStatus {
        let ticket = self.begin();
        let current = match self.provider.get_current_session().await {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(error = %err, "failed to restore session");
                None
            }
        };

        if self.superseded(ticket) {
            tracing::debug!("session restore superseded by a notification");
        } else {
            self.status = SessionStatus::from_session(current);
        }
        &self.status
    }

    /// Signs in with email and password.
    ///
    /// # Errors
    /// Returns the provider error; the status is left unchanged.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<Session, AuthError> {
        let ticket = self.begin();
        let result = self.provider.sign_in_with_password(email, password).await;
        let superseded = self.superseded(ticket);

        match &result {
            Ok(session) if !superseded => {
                tracing::info!(user = %session.user.id, "signed in");
                self.status = SessionStatus::Authenticated(session.clone());
            }
            Ok(_) => tracing::debug!("sign-in result superseded by a notification"),
            Err(err) => tracing::warn!(error = %err, "sign-in failed"),
        }
        result
    }

    /// Registers a new account. Never changes the status.
    ///
    /// # Errors
    /// Returns the provider error.
    pub async fn sign_up(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<PendingConfirmation, AuthError> {
        let result = self.provider.sign_up(email, password).await;
        self.pump();
        if let Err(err) = &result {
            tracing::warn!(error = %err, "sign-up failed");
        }
        result
    }

    /// Requests password-reset instructions. Never changes the status.
    ///
    /// # Errors
    /// Returns the provider error.
    pub async fn request_password_reset(&mut self, email: &str) -> Result<(), AuthError> {
        let result = self.provider.reset_password_for_email(email).await;
        self.pump();
        if let Err(err) = &result {
            tracing::warn!(error = %err, "password reset request failed");
        }
        result
    }

    /// Signs out. On success the status becomes `Unauthenticated`.
    ///
    /// # Errors
    /// Returns the provider error; the status is left unchanged.
    pub async fn sign_out(&mut self) -> Result<(), AuthError> {
        let ticket = self.begin();
        let result = self.provider.sign_out().await;
        let superseded = self.superseded(ticket);

        match &result {
            Ok(()) if !superseded => {
                tracing::info!("signed out");
                self.status = SessionStatus::Unauthenticated;
            }
            Ok(()) => tracing::debug!("sign-out result superseded by a notification"),
            Err(err) => tracing::warn!(error = %err, "sign-out failed"),
        }
        result
    }

    /// Applies every notification already delivered. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(change) = self.next_pending() {
            self.apply_change(change);
            applied += 1;
        }
        applied
    }

    /// Waits for the next notification and applies it.
    ///
    /// Returns `None` once the subscription is closed or released.
    pub async fn next_change(&mut self) -> Option<SessionEvent> {
        let change = self.subscription.as_mut()?.next().await?;
        let event = change.event;
        self.apply_change(change);
        Some(event)
    }

    /// Overwrites the status with a notification's session.
    pub fn apply_change(&mut self, change: SessionChange) {
        self.epoch = self.epoch.wrapping_add(1);
        tracing::debug!(event = %change.event, present = change.session.is_some(), "session change");
        self.status = SessionStatus::from_session(change.session);
    }

    /// Releases the provider subscription and returns the provider.
    pub fn shutdown(mut self) -> P {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.provider
    }

    fn next_pending(&mut self) -> Option<SessionChange> {
        self.subscription.as_mut()?.try_next()
    }

    fn begin(&mut self) -> u64 {
        self.pump();
        self.epoch
    }

    fn superseded(&mut self, ticket: u64) -> bool {
        self.pump();
        self.epoch != ticket
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::session::testing::{FakeProvider, GOOD_PASSWORD, session};

    fn gate_with(provider: FakeProvider) -> (SessionGate<Arc<FakeProvider>>, Arc<FakeProvider>) {
        let provider = provider.shared();
        (SessionGate::new(Arc::clone(&provider)), provider)
    }

    #[tokio::test]
    async fn test_starts_unknown_and_resolves_absent() {
        let (mut gate, provider) = gate_with(FakeProvider::default());
        assert_eq!(gate.status(), &SessionStatus::Unknown);

        gate.resolve().await;
        assert_eq!(gate.status(), &SessionStatus::Unauthenticated);
        assert_eq!(provider.calls(), vec!["get_current_session"]);
    }

    #[tokio::test]
    async fn test_resolve_restores_stored_session() {
        let provider = FakeProvider {
            stored: Mutex::new(Some(session("ada"))),
            ..FakeProvider::default()
        };
        let (mut gate, _) = gate_with(provider);

        assert!(gate.resolve().await.is_authenticated());
        assert_eq!(gate.session().map(|s| s.user.id.as_str()), Some("ada"));
    }

    #[tokio::test]
    async fn test_resolve_failure_is_unauthenticated() {
        let provider = FakeProvider {
            stored: Mutex::new(Some(session("ada"))),
            fail_restore: true,
            ..FakeProvider::default()
        };
        let (mut gate, _) = gate_with(provider);
        assert_eq!(gate.status(), &SessionStatus::Unknown);

        assert_eq!(gate.resolve().await, &SessionStatus::Unauthenticated);
        assert!(gate.session().is_none());
    }

    #[tokio::test]
    async fn test_sign_in_success_authenticates() {
        let (mut gate, _) = gate_with(FakeProvider::default());
        gate.resolve().await;

        let session = gate.sign_in("ada@example.com", GOOD_PASSWORD).await.unwrap();
        assert_eq!(session.user.id, "ada");
        assert!(gate.status().is_authenticated());
    }

    #[tokio::test]
    async fn test_sign_in_failure_leaves_status() {
        let (mut gate, _) = gate_with(FakeProvider::default());
        gate.resolve().await;

        let err = gate.sign_in("bad@example.com", "wrongpw").await.unwrap_err();
        assert_eq!(err.message(), "Invalid login credentials");
        assert_eq!(gate.status(), &SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_sign_up_and_reset_do_not_transition() {
        let (mut gate, _) = gate_with(FakeProvider::default());
        gate.resolve().await;

        let pending = gate.sign_up("new@example.com", "hunter22").await.unwrap();
        assert_eq!(pending.email, "new@example.com");
        gate.request_password_reset("new@example.com").await.unwrap();
        assert_eq!(gate.status(), &SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_sign_out_success_unauthenticates() {
        let (mut gate, _) = gate_with(FakeProvider::default());
        gate.sign_in("ada@example.com", GOOD_PASSWORD).await.unwrap();

        gate.sign_out().await.unwrap();
        assert_eq!(gate.status(), &SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_sign_out_failure_keeps_session() {
        let provider = FakeProvider {
            fail_sign_out: true,
            ..FakeProvider::default()
        };
        let (mut gate, _) = gate_with(provider);
        gate.sign_in("ada@example.com", GOOD_PASSWORD).await.unwrap();

        assert!(gate.sign_out().await.is_err());
        assert!(gate.status().is_authenticated());
    }

    #[tokio::test]
    async fn test_notification_overwrites_status() {
        let (mut gate, provider) = gate_with(FakeProvider::default());
        gate.sign_in("ada@example.com", GOOD_PASSWORD).await.unwrap();

        provider
            .broadcaster
            .broadcast(&SessionChange::new(SessionEvent::SignedOut, None));
        assert_eq!(gate.pump(), 1);
        assert_eq!(gate.status(), &SessionStatus::Unauthenticated);

        let refreshed = session("ada");
        provider.broadcaster.broadcast(&SessionChange::new(
            SessionEvent::TokenRefreshed,
            Some(refreshed.clone()),
        ));
        assert_eq!(gate.next_change().await, Some(SessionEvent::TokenRefreshed));
        assert_eq!(gate.session(), Some(&refreshed));
    }

    #[tokio::test]
    async fn test_late_sign_out_notification_beats_in_flight_sign_in() {
        let (mut gate, provider) = gate_with(FakeProvider::default());
        gate.resolve().await;
        provider.interject(SessionChange::new(SessionEvent::SignedOut, None));

        let result = gate.sign_in("ada@example.com", GOOD_PASSWORD).await;
        assert!(result.is_ok());
        assert_eq!(gate.status(), &SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_notification_during_sign_out_wins() {
        let (mut gate, provider) = gate_with(FakeProvider::default());
        gate.sign_in("ada@example.com", GOOD_PASSWORD).await.unwrap();
        let refreshed = session("grace");
        provider.interject(SessionChange::new(
            SessionEvent::TokenRefreshed,
            Some(refreshed.clone()),
        ));

        gate.sign_out().await.unwrap();
        assert_eq!(gate.session(), Some(&refreshed));
    }

    #[tokio::test]
    async fn test_shutdown_releases_subscription() {
        let (gate, provider) = gate_with(FakeProvider::default());
        assert_eq!(provider.broadcaster.subscriber_count(), 1);

        gate.shutdown();
        assert_eq!(provider.broadcaster.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_routing_follows_status() {
        let (mut gate, _) = gate_with(FakeProvider::default());
        assert_eq!(
            gate.route(Route::Generator),
            RouteDecision::Redirect(Route::Auth)
        );

        gate.sign_in("ada@example.com", GOOD_PASSWORD).await.unwrap();
        assert_eq!(
            gate.route(Route::Generator),
            RouteDecision::Render(Route::Generator)
        );
        assert_eq!(gate.route(Route::Auth), RouteDecision::Redirect(Route::Generator));

        gate.sign_out().await.unwrap();
        assert_eq!(
            gate.route(Route::Generator),
            RouteDecision::Redirect(Route::Auth)
        );
    }
}
