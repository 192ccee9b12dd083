use log::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

pub type UserId = String;

/// One subscriber's claimed identity for one streaming session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub topic: String,
    pub user_id: UserId,
    pub nonce: String,
}

impl Identity {
    pub fn new(
        topic: impl Into<String>,
        user_id: impl Into<UserId>,
        nonce: impl Into<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            user_id: user_id.into(),
            nonce: nonce.into(),
        }
    }

    /// Address of this identity's stream on the SSE sink: `<topic>/<user_id>/<nonce>`.
    pub fn namespace(&self) -> String {
        format!("{}/{}/{}", self.topic, self.user_id, self.nonce)
    }
}

/// Signal for any background work attached to a session.
///
/// Cancelling never blocks; work that wants to observe teardown awaits
/// `token().cancelled()`.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(CancellationToken);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }

    pub fn token(&self) -> CancellationToken {
        self.0.child_token()
    }
}

/// Proof of one particular registration, returned by `SessionRegistry::insert`.
#[derive(Debug, Clone)]
pub struct SessionTicket {
    identity: Identity,
    generation: u64,
    cancel: CancelHandle,
}

impl SessionTicket {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn cancel_handle(&self) -> &CancelHandle {
        &self.cancel
    }
}

#[derive(Debug)]
struct Session {
    identity: Identity,
    generation: u64,
    cancel: CancelHandle,
}

/// In-memory table of currently connected identities, at most one per user id.
///
/// Every operation takes the same lock, so inserts and removals for one user
/// are linearized.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<UserId, Session>>,
    next_generation: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `identity`, replacing (and cancelling) any session for the same user.
    pub fn insert(&self, identity: Identity) -> SessionTicket {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let cancel = CancelHandle::new();

        let stale = self.lock().insert(
            identity.user_id.clone(),
            Session {
                identity: identity.clone(),
                generation,
                cancel: cancel.clone(),
            },
        );

        if let Some(stale) = stale {
            debug!(
                "Replacing session for user {} (nonce {} -> {})",
                identity.user_id, stale.identity.nonce, identity.nonce
            );
            stale.cancel.cancel();
        }

        SessionTicket {
            identity,
            generation,
            cancel,
        }
    }

    /// Remove whatever session is registered for `identity.user_id`. No-op if absent.
    pub fn remove(&self, identity: &Identity) {
        let removed = self.lock().remove(&identity.user_id);
        if let Some(session) = removed {
            session.cancel.cancel();
        }
    }

    /// Remove the session only if it is still the one `ticket` was issued for.
    /// Returns whether an entry was removed.
    pub fn release(&self, ticket: &SessionTicket) -> bool {
        let released = {
            let mut sessions = self.lock();
            match sessions.get(&ticket.identity.user_id) {
                Some(session) if session.generation == ticket.generation => {
                    sessions.remove(&ticket.identity.user_id)
                }
                _ => None,
            }
        };

        match released {
            Some(session) => {
                session.cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub fn find(&self, user_id: &str) -> Option<Identity> {
        if user_id.is_empty() {
            return None;
        }

        self.lock()
            .get(user_id)
            .map(|session| session.identity.clone())
    }

    /// Advisory only; may be stale by the time the caller reads it.
    pub fn count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, Session>> {
        // No operation leaves the table half-updated, so a poisoned lock is still consistent.
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::sync::Arc;
    use std::task::{Context, Wake, Waker};

    fn identity(user_id: &str, nonce: &str) -> Identity {
        Identity::new("topic", user_id, nonce)
    }

    #[test]
    fn namespace_joins_topic_user_and_nonce() {
        assert_eq!(
            Identity::new("topicA", "user1", "nonceX").namespace(),
            "topicA/user1/nonceX"
        );
    }

    #[test]
    fn find_is_absent_before_insert_and_after_remove() {
        let registry = SessionRegistry::new();
        let user = identity("user1", "n1");

        assert_eq!(registry.find("user1"), None);

        registry.insert(user.clone());
        assert_eq!(registry.find("user1"), Some(user.clone()));

        registry.remove(&user);
        assert_eq!(registry.find("user1"), None);
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn find_with_empty_user_id_is_absent() {
        let registry = SessionRegistry::new();
        registry.insert(identity("", "n1"));

        assert_eq!(registry.find(""), None);
    }

    #[test]
    fn second_insert_for_same_user_replaces_the_first() {
        let registry = SessionRegistry::new();
        let first = registry.insert(identity("user1", "n1"));
        registry.insert(identity("user1", "n2"));

        assert_eq!(registry.count(), 1);
        assert_eq!(registry.find("user1"), Some(identity("user1", "n2")));
        assert!(first.cancel_handle().is_cancelled());
    }

    #[test]
    fn remove_of_absent_user_is_a_noop() {
        let registry = SessionRegistry::new();
        registry.insert(identity("user1", "n1"));

        registry.remove(&identity("user2", "n1"));

        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn remove_fires_the_cancel_handle() {
        let registry = SessionRegistry::new();
        let user = identity("user1", "n1");
        let ticket = registry.insert(user.clone());
        let token = ticket.cancel_handle().token();

        registry.remove(&user);

        assert!(ticket.cancel_handle().is_cancelled());
        assert!(token.is_cancelled());
    }

    /// Records whether the registry lock was free at the moment it was woken.
    struct LockCheckingWaker {
        registry: Arc<SessionRegistry>,
        lock_was_free: Mutex<Vec<bool>>,
    }

    impl Wake for LockCheckingWaker {
        fn wake(self: Arc<Self>) {
            self.wake_by_ref();
        }

        fn wake_by_ref(self: &Arc<Self>) {
            let free = self.registry.sessions.try_lock().is_ok();
            self.lock_was_free.lock().unwrap().push(free);
        }
    }

    fn wake_on_cancel(
        registry: &Arc<SessionRegistry>,
        ticket: &SessionTicket,
        cancel: impl FnOnce(),
    ) -> Vec<bool> {
        let checker = Arc::new(LockCheckingWaker {
            registry: Arc::clone(registry),
            lock_was_free: Mutex::new(Vec::new()),
        });
        let waker = Waker::from(Arc::clone(&checker));
        let token = ticket.cancel_handle().token();
        let mut cancelled = Box::pin(token.cancelled());
        assert!(cancelled
            .as_mut()
            .poll(&mut Context::from_waker(&waker))
            .is_pending());

        cancel();

        let woken = checker.lock_was_free.lock().unwrap().clone();
        woken
    }

    #[test]
    fn cancel_handles_fire_after_the_lock_is_released() {
        let registry = Arc::new(SessionRegistry::new());

        let replaced = registry.insert(identity("user1", "n1"));
        let woken = wake_on_cancel(&registry, &replaced, || {
            registry.insert(identity("user1", "n2"));
        });
        assert_eq!(woken, vec![true]);

        let removed = registry.insert(identity("user2", "n1"));
        let woken = wake_on_cancel(&registry, &removed, || {
            registry.remove(&identity("user2", "n1"));
        });
        assert_eq!(woken, vec![true]);

        let released = registry.insert(identity("user3", "n1"));
        let woken = wake_on_cancel(&registry, &released, || {
            assert!(registry.release(&released));
        });
        assert_eq!(woken, vec![true]);
    }

    #[test]
    fn stale_release_leaves_the_newer_session_in_place() {
        let registry = SessionRegistry::new();
        let stale = registry.insert(identity("user1", "n1"));
        let current = registry.insert(identity("user1", "n2"));

        assert!(!registry.release(&stale));
        assert_eq!(registry.find("user1"), Some(identity("user1", "n2")));

        assert!(registry.release(&current));
        assert_eq!(registry.find("user1"), None);
    }

    #[test]
    fn concurrent_inserts_keep_one_entry_per_user() {
        let registry = Arc::new(SessionRegistry::new());

        let handles: Vec<_> = (0..8)
            .map(|thread| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for i in 0..200 {
                        let user = identity(&format!("user{}", i % 10), &format!("t{thread}-{i}"));
                        registry.insert(user.clone());
                        if i % 3 == 0 {
                            registry.remove(&user);
                        }
                        assert!(registry.count() <= 10);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(registry.count() <= 10);
        for i in 0..10 {
            if let Some(found) = registry.find(&format!("user{i}")) {
                assert_eq!(found.user_id, format!("user{i}"));
            }
        }
    }
}
