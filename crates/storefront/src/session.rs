//! Session-change notifications.
//!
//! Every sign-in, sign-out and detected expiry is published on a
//! [`SessionFeed`]. Listeners hold a [`SessionSubscription`]; dropping it
//! detaches the listener.

use tokio::sync::broadcast;

use crate::models::SessionUser;

/// Buffered events per subscriber before the slowest one starts lagging.
const FEED_CAPACITY: usize = 64;

/// A change to some visitor's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(SessionUser),
    SignedOut(SessionUser),
    /// The provider no longer recognizes a mirrored session.
    Expired(SessionUser),
}

impl SessionEvent {
    #[must_use]
    pub const fn user(&self) -> &SessionUser {
        match self {
            Self::SignedIn(user) | Self::SignedOut(user) | Self::Expired(user) => user,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SignedIn(_) => "signed_in",
            Self::SignedOut(_) => "signed_out",
            Self::Expired(_) => "expired",
        }
    }
}

/// Broadcast channel of [`SessionEvent`]s.
#[derive(Debug, Clone)]
pub struct SessionFeed {
    sender: broadcast::Sender<SessionEvent>,
}

impl Default for SessionFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionFeed {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);
        Self { sender }
    }

    /// Publish an event to every current subscriber.
    ///
    /// Having no subscribers is not an error.
    pub fn publish(&self, event: SessionEvent) {
        let _ = self.sender.send(event);
    }

    /// Start listening; only events published after this call are seen.
    #[must_use]
    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// A live listener on a [`SessionFeed`].
#[derive(Debug)]
pub struct SessionSubscription {
    receiver: broadcast::Receiver<SessionEvent>,
}

impl SessionSubscription {
    /// Wait for the next event.
    ///
    /// Returns `None` once every feed handle is gone. Events missed because
    /// this subscriber fell behind are skipped.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Session subscriber lagged, events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Detach from the feed.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use paws_claws_core::{Email, UserId};

    use super::*;

    fn user() -> SessionUser {
        SessionUser {
            id: UserId::new("u-1"),
            email: Email::parse("rex@dogs.io").unwrap(),
        }
    }

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let feed = SessionFeed::new();
        let mut subscription = feed.subscribe();

        feed.publish(SessionEvent::SignedIn(user()));
        feed.publish(SessionEvent::SignedOut(user()));

        assert_eq!(subscription.next().await, Some(SessionEvent::SignedIn(user())));
        assert_eq!(subscription.next().await, Some(SessionEvent::SignedOut(user())));
    }

    #[tokio::test]
    async fn test_drop_detaches() {
        let feed = SessionFeed::new();
        let first = feed.subscribe();
        let second = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 2);

        drop(first);
        assert_eq!(feed.subscriber_count(), 1);

        second.unsubscribe();
        assert_eq!(feed.subscriber_count(), 0);

        // Publishing with nobody listening is fine.
        feed.publish(SessionEvent::Expired(user()));
    }

    #[tokio::test]
    async fn test_closed_feed_ends_subscription() {
        let feed = SessionFeed::new();
        let mut subscription = feed.subscribe();
        drop(feed);
        assert_eq!(subscription.next().await, None);
    }

    #[test]
    fn test_event_accessors() {
        let event = SessionEvent::Expired(user());
        assert_eq!(event.kind(), "expired");
        assert_eq!(event.user().id.as_str(), "u-1");
    }
}
