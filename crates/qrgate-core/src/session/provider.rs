//! Identity-provider seam and the session-change channel.
//!
//! Providers push [`SessionChange`] notifications through a
//! [`SessionBroadcaster`]. Each subscriber owns a [`SessionSubscription`]
//! (receiver + release handle); releasing it removes the sender from the
//! registry so nothing outlives the view that subscribed.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::mpsc;

use super::{AuthError, PendingConfirmation, Session, SessionChange};

/// External identity provider consumed by the session gate.
pub trait IdentityProvider {
    /// Password sign-in. Returns the issued session.
    fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Session, AuthError>> + Send;

    /// Registers an account. Confirmation happens out of band.
    fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<PendingConfirmation, AuthError>> + Send;

    /// Sends password-reset instructions to `email`.
    fn reset_password_for_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<(), AuthError>> + Send;

    /// Ends the current session.
    fn sign_out(&self) -> impl Future<Output = Result<(), AuthError>> + Send;

    /// Returns the previously issued session if it is still valid.
    fn get_current_session(
        &self,
    ) -> impl Future<Output = Result<Option<Session>, AuthError>> + Send;

    /// Opens a long-lived subscription to session changes.
    fn subscribe(&self) -> SessionSubscription;
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    senders: Vec<(u64, mpsc::UnboundedSender<SessionChange>)>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Provider-side fan-out of session changes.
#[derive(Debug, Default, Clone)]
pub struct SessionBroadcaster {
    registry: Arc<Mutex<Registry>>,
}

impl SessionBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber.
    pub fn subscribe(&self) -> SessionSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id = registry.next_id.wrapping_add(1);
        registry.senders.push((id, tx));
        tracing::debug!(subscription = id, "session subscription opened");

        SessionSubscription {
            rx,
            handle: Some(ReleaseHandle {
                id,
                registry: Arc::downgrade(&self.registry),
            }),
        }
    }

    /// Delivers `change` to every live subscriber, pruning closed ones.
    pub fn broadcast(&self, change: &SessionChange) {
        let mut registry = lock(&self.registry);
        registry
            .senders
            .retain(|(_, tx)| tx.send(change.clone()).is_ok());
        tracing::debug!(
            event = %change.event,
            subscribers = registry.senders.len(),
            "session change broadcast"
        );
    }

    /// Number of subscriptions that have not been released.
    pub fn subscriber_count(&self) -> usize {
        lock(&self.registry).senders.len()
    }
}

#[derive(Debug)]
struct ReleaseHandle {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl ReleaseHandle {
    fn release(self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).senders.retain(|(id, _)| *id != self.id);
        }
        tracing::debug!(subscription = self.id, "session subscription released");
    }
}

/// Receiving end of a session-change subscription.
///
/// Call [`SessionSubscription::unsubscribe`] on teardown. Dropping it releases
/// the registration as well.
#[derive(Debug)]
pub struct SessionSubscription {
    rx: mpsc::UnboundedReceiver<SessionChange>,
    handle: Option<ReleaseHandle>,
}

impl SessionSubscription {
    /// A subscription that never yields (providers without push notifications).
    pub fn detached() -> Self {
        let (_tx, rx) = mpsc::unbounded_channel();
        Self { rx, handle: None }
    }

    /// Returns the next already-delivered change without waiting.
    pub fn try_next(&mut self) -> Option<SessionChange> {
        self.rx.try_recv().ok()
    }

    /// Waits for the next change. `None` once the provider side is gone.
    pub async fn next(&mut self) -> Option<SessionChange> {
        self.rx.recv().await
    }

    /// Releases the subscription.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        self.rx.close();
        if let Some(handle) = self.handle.take() {
            handle.release();
        }
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionEvent;

    fn signed_out() -> SessionChange {
        SessionChange::new(SessionEvent::SignedOut, None)
    }

    #[test]
    fn test_broadcast_reaches_every_subscriber() {
        let broadcaster = SessionBroadcaster::new();
        let mut a = broadcaster.subscribe();
        let mut b = broadcaster.subscribe();

        broadcaster.broadcast(&signed_out());

        assert_eq!(a.try_next(), Some(signed_out()));
        assert_eq!(b.try_next(), Some(signed_out()));
        assert_eq!(a.try_next(), None);
    }

    #[test]
    fn test_unsubscribe_removes_registration() {
        let broadcaster = SessionBroadcaster::new();
        let sub = broadcaster.subscribe();
        let _other = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 2);

        sub.unsubscribe();
        assert_eq!(broadcaster.subscriber_count(), 1);
    }

    #[test]
    fn test_drop_releases_registration() {
        let broadcaster = SessionBroadcaster::new();
        {
            let _sub = broadcaster.subscribe();
            assert_eq!(broadcaster.subscriber_count(), 1);
        }
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[test]
    fn test_release_after_broadcaster_dropped() {
        let broadcaster = SessionBroadcaster::new();
        let sub = broadcaster.subscribe();
        drop(broadcaster);
        sub.unsubscribe();
    }

    #[tokio::test]
    async fn test_next_waits_for_delivery() {
        let broadcaster = SessionBroadcaster::new();
        let mut sub = broadcaster.subscribe();
        let sender = broadcaster.clone();
        tokio::spawn(async move {
            sender.broadcast(&SessionChange::new(SessionEvent::SignedOut, None));
        });
        let change = sub.next().await;
        assert_eq!(change.map(|c| c.event), Some(SessionEvent::SignedOut));
    }
}
