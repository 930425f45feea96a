//! Identity watcher.
//!
//! Detects login/logout transitions of the externally-owned identity
//! record through two redundant triggers: the store's change
//! notification, and a fallback polling timer for writers the
//! notification cannot reach (another process sharing the store file).
//! Both funnel into [`reconcile`], which compares the freshly-read
//! identity against the last-known one, so duplicate detections of the
//! same transition are no-ops.
//!
//! Passive detection never runs the cart merge: it exists to catch
//! logouts and cross-context identity swaps. The merge is only safe to
//! run once, explicitly, when the login flow itself completes
//! ([`crate::session::CartSession::complete_login`]).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};

use crate::identity::{CurrentUser, USER_KEY};
use crate::session::SessionInner;

/// Spawn the watcher task for a session.
///
/// Runs until aborted by [`crate::session::CartSession::close`].
pub(crate) fn spawn(inner: Arc<SessionInner>, poll_interval: Duration) -> JoinHandle<()> {
    let mut changes = inner.store.subscribe();
    tokio::spawn(async move {
        let mut poll = tokio::time::interval(poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = poll.tick() => reconcile(&inner),
                change = changes.recv() => match change {
                    Ok(change) if change.key == USER_KEY => reconcile(&inner),
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "change stream lagged, reconciling");
                        reconcile(&inner);
                    }
                    Err(RecvError::Closed) => {
                        // The store stopped notifying; polling still
                        // covers detection.
                        poll_only(&inner, poll).await;
                        return;
                    }
                },
            }
        }
    })
}

async fn poll_only(inner: &SessionInner, mut poll: Interval) {
    loop {
        poll.tick().await;
        reconcile(inner);
    }
}

/// Re-read the identity record and process a transition if one
/// happened.
///
/// Identity is compared by user id; when it matches the last-known id
/// the call returns without side effects. On a change the known
/// identity is updated and the in-memory cart is left untouched - after
/// a logout it silently follows the session into guest scope, and after
/// a passively-observed login it stays put until the login flow runs
/// the merge.
pub(crate) fn reconcile(inner: &SessionInner) {
    let latest = CurrentUser::load(inner.store.as_ref());
    let mut state = inner.state();

    let known_id = state.current_user.as_ref().map(|u| u.id);
    let latest_id = latest.as_ref().map(|u| u.id);
    if known_id == latest_id {
        return;
    }

    match (&state.current_user, &latest) {
        (None, Some(user)) => {
            tracing::info!(user = %user.id, "login detected; merge deferred to the login flow");
        }
        (Some(user), None) => {
            tracing::info!(user = %user.id, "logout detected; cart continues under guest scope");
        }
        (Some(prev), Some(next)) => {
            tracing::info!(
                prev = %prev.id,
                next = %next.id,
                "identity swap detected, treating as logout then login"
            );
        }
        (None, None) => unreachable!("identical identities already returned"),
    }

    state.current_user = latest;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bodega_core::{Role, UserId};

    use crate::store::{KeyValueStore, MemoryStore};

    use super::*;

    fn inner_over(store: Arc<MemoryStore>) -> SessionInner {
        SessionInner::new(store as Arc<dyn KeyValueStore>)
    }

    #[test]
    fn test_reconcile_noop_when_identity_unchanged() {
        let store = Arc::new(MemoryStore::new());
        store.set(USER_KEY, "{\"id\":7,\"email\":\"u@example.com\"}");
        let inner = inner_over(Arc::clone(&store));

        reconcile(&inner);
        reconcile(&inner);

        let user = inner.state().current_user.clone().unwrap();
        assert_eq!(user.id, UserId::new(7));
    }

    #[test]
    fn test_reconcile_observes_login() {
        let store = Arc::new(MemoryStore::new());
        let inner = inner_over(Arc::clone(&store));
        assert!(inner.state().current_user.is_none());

        store.set(USER_KEY, "{\"id\":3,\"email\":\"u@example.com\"}");
        reconcile(&inner);

        assert_eq!(
            inner.state().current_user.as_ref().map(|u| u.id),
            Some(UserId::new(3))
        );
    }

    #[test]
    fn test_reconcile_observes_logout() {
        let store = Arc::new(MemoryStore::new());
        store.set(USER_KEY, "{\"id\":3,\"email\":\"u@example.com\"}");
        let inner = inner_over(Arc::clone(&store));

        store.remove(USER_KEY);
        reconcile(&inner);

        assert!(inner.state().current_user.is_none());
    }

    #[test]
    fn test_reconcile_observes_identity_swap() {
        let store = Arc::new(MemoryStore::new());
        store.set(USER_KEY, "{\"id\":3,\"email\":\"a@example.com\"}");
        let inner = inner_over(Arc::clone(&store));

        store.set(
            USER_KEY,
            "{\"id\":4,\"role\":\"vendor\",\"email\":\"b@example.com\"}",
        );
        reconcile(&inner);

        let user = inner.state().current_user.clone().unwrap();
        assert_eq!(user.id, UserId::new(4));
        assert_eq!(user.role, Role::Vendor);
    }

    #[test]
    fn test_reconcile_treats_corrupt_record_as_logout() {
        let store = Arc::new(MemoryStore::new());
        store.set(USER_KEY, "{\"id\":3,\"email\":\"a@example.com\"}");
        let inner = inner_over(Arc::clone(&store));

        store.set(USER_KEY, "{{{{");
        reconcile(&inner);

        assert!(inner.state().current_user.is_none());
    }
}
