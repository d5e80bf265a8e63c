//! Auth state store and event bridge.
//!
//! The store is the single source of truth for "who is the current user".
//! It holds an observable snapshot behind a watch channel, refreshed on
//! mount and whenever the event hub announces a sign-in or sign-out. Page
//! handlers never write the snapshot themselves; state always flows
//! provider -> hub -> bridge -> store.
//!
//! ORDERING
//! ========
//! Overlapping `refresh()` calls are legal (rapid consecutive auth events).
//! Each completion performs one atomic snapshot write, so the last
//! completing refresh wins the user field. `loading` is derived from an
//! in-flight counter, which keeps it true exactly while any who-am-I query
//! is outstanding.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use poolgate_core::auth::{AuthEvent, AuthSnapshot};

use crate::client::AuthClient;
use crate::hub::SubscriptionMessage;

/// Event-synchronized cache of the current user.
pub struct AuthStore {
    client: Arc<AuthClient>,
    snapshot_tx: watch::Sender<AuthSnapshot>,
    in_flight: AtomicUsize,
    closed: AtomicBool,
    bridge: Mutex<Option<JoinHandle<()>>>,
}

impl AuthStore {
    /// Create the store, start the event bridge, and kick off the initial
    /// refresh. Must be called within a tokio runtime.
    pub fn mount(client: Arc<AuthClient>) -> Arc<Self> {
        let (snapshot_tx, _) = watch::channel(AuthSnapshot::initial());

        // Subscribe before the initial refresh so events raced with it are
        // not lost.
        let mut subscription = client.hub().subscribe();

        let store = Arc::new(Self {
            client,
            snapshot_tx,
            in_flight: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            bridge: Mutex::new(None),
        });

        let weak = Arc::downgrade(&store);
        let handle = tokio::spawn(async move {
            if let Some(store) = weak.upgrade() {
                store.refresh().await;
            }

            loop {
                let message = subscription.next().await;
                let Some(store) = weak.upgrade() else { break };
                match message {
                    SubscriptionMessage::Event(AuthEvent::SignedIn) => {
                        // Re-fetch the full record; the notification alone
                        // is not authoritative.
                        store.refresh().await;
                    }
                    SubscriptionMessage::Event(AuthEvent::SignedOut) => {
                        // "No session" is already known; clear immediately.
                        store.clear();
                    }
                    SubscriptionMessage::Event(_) => {}
                    SubscriptionMessage::Lagged(skipped) => {
                        tracing::warn!(skipped, "auth event subscription lagged; resynchronizing");
                        store.refresh().await;
                    }
                    SubscriptionMessage::Closed => break,
                }
            }
        });

        *store
            .bridge
            .lock()
            .expect("bridge handle lock poisoned") = Some(handle);
        store
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> AuthSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Watch receiver for snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Snapshot with any pending initial load settled.
    pub async fn settled_snapshot(&self) -> AuthSnapshot {
        let snapshot = self.snapshot();
        if !snapshot.loading {
            return snapshot;
        }
        self.refresh().await;
        self.snapshot()
    }

    /// Re-query the provider for the current user.
    ///
    /// Expected absence (no session, expired token, unconfigured client) is
    /// a normal outcome and yields an empty snapshot; it never propagates
    /// as an error.
    pub async fn refresh(&self) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }

        self.in_flight.fetch_add(1, Ordering::AcqRel);
        self.snapshot_tx.send_modify(|snapshot| snapshot.loading = true);

        let user = match self.client.provider() {
            Err(_) => None,
            Ok(provider) => match provider.current_user().await {
                Ok(user) => Some(user),
                Err(e) => {
                    if !e.is_expected_absence() {
                        tracing::warn!(error = %e, "who-am-I query failed");
                    }
                    None
                }
            },
        };

        let remaining = self.in_flight.fetch_sub(1, Ordering::AcqRel) - 1;

        // Stale response guard: never mutate after teardown.
        if self.closed.load(Ordering::Acquire) {
            return;
        }

        self.snapshot_tx.send_replace(AuthSnapshot {
            user,
            loading: remaining > 0,
        });
    }

    /// Drop the user immediately (signed-out event).
    fn clear(&self) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        self.snapshot_tx.send_replace(AuthSnapshot {
            user: None,
            loading: self.in_flight.load(Ordering::Acquire) > 0,
        });
    }

    /// Tear the store down: stop the bridge and freeze the snapshot.
    /// Idempotent; also invoked on drop.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(handle) = self
            .bridge
            .lock()
            .expect("bridge handle lock poisoned")
            .take()
        {
            handle.abort();
        }
    }
}

impl Drop for AuthStore {
    fn drop(&mut self) {
        self.close();
    }
}
