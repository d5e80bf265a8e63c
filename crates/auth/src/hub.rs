//! Auth event hub.
//!
//! A process-wide publish/subscribe bus for auth lifecycle events, built on
//! a tokio broadcast channel. Providers publish `SignedIn`/`SignedOut`
//! after the corresponding operation completes; the state store subscribes
//! and re-synchronizes. Dropping a `HubSubscription` unsubscribes.

use tokio::sync::broadcast;

use poolgate_core::auth::AuthEvent;

/// Channel capacity for auth events.
const CHANNEL_CAPACITY: usize = 100;

/// Publish/subscribe bus for auth lifecycle events.
#[derive(Debug, Clone)]
pub struct AuthHub {
    sender: broadcast::Sender<AuthEvent>,
}

impl AuthHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Publishing with no subscribers is fine - it just means nobody is
    /// listening yet.
    pub fn publish(&self, event: AuthEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to events published after this call.
    pub fn subscribe(&self) -> HubSubscription {
        HubSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live subscriptions, for lifecycle assertions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for AuthHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Message delivered to a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionMessage {
    Event(AuthEvent),
    /// The subscriber fell behind and `skipped` events were dropped.
    Lagged(u64),
    /// The hub was dropped; no further events will arrive.
    Closed,
}

/// Handle to an active hub subscription. Drop it to unsubscribe.
pub struct HubSubscription {
    receiver: broadcast::Receiver<AuthEvent>,
}

impl HubSubscription {
    /// Wait for the next message.
    pub async fn next(&mut self) -> SubscriptionMessage {
        match self.receiver.recv().await {
            Ok(event) => SubscriptionMessage::Event(event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                SubscriptionMessage::Lagged(skipped)
            }
            Err(broadcast::error::RecvError::Closed) => SubscriptionMessage::Closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_and_subscribe() {
        let hub = AuthHub::new();
        let mut subscription = hub.subscribe();

        hub.publish(AuthEvent::SignedIn);

        assert_eq!(
            subscription.next().await,
            SubscriptionMessage::Event(AuthEvent::SignedIn)
        );
    }

    #[tokio::test]
    async fn test_multiple_subscribers_all_receive() {
        let hub = AuthHub::new();
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();

        hub.publish(AuthEvent::SignedOut);

        assert_eq!(
            first.next().await,
            SubscriptionMessage::Event(AuthEvent::SignedOut)
        );
        assert_eq!(
            second.next().await,
            SubscriptionMessage::Event(AuthEvent::SignedOut)
        );
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let hub = AuthHub::new();
        hub.publish(AuthEvent::TokenRefreshed);
    }

    #[tokio::test]
    async fn test_events_published_before_subscribing_are_not_delivered() {
        let hub = AuthHub::new();
        hub.publish(AuthEvent::SignedIn);

        let mut subscription = hub.subscribe();
        hub.publish(AuthEvent::SignedOut);

        assert_eq!(
            subscription.next().await,
            SubscriptionMessage::Event(AuthEvent::SignedOut)
        );
    }

    #[tokio::test]
    async fn test_dropping_subscription_unsubscribes() {
        let hub = AuthHub::new();
        let subscription = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 1);

        drop(subscription);
        assert_eq!(hub.subscriber_count(), 0);
    }
}
