//! Auth-change event distribution.
//!
//! The hosted SDK pushes auth-state notifications (sign-in, sign-out, token
//! refresh) to registered listeners. [`AuthChannel`] is the client-side
//! fan-out for those notifications: every subscriber gets a copy of every
//! change, in publish order. Dropping an [`AuthSubscription`] releases it;
//! dead subscribers are pruned on the next publish.

use std::sync::Mutex;

use tokio::sync::mpsc;

use bombeiro_auth::AuthChange;

/// A live subscription to auth-state changes.
///
/// Consumed by a single task; `recv` returns `None` once the channel side is
/// gone (backend dropped).
#[derive(Debug)]
pub struct AuthSubscription {
    receiver: mpsc::UnboundedReceiver<AuthChange>,
}

impl AuthSubscription {
    pub fn new(receiver: mpsc::UnboundedReceiver<AuthChange>) -> Self {
        Self { receiver }
    }

    /// Wait for the next auth-state change.
    pub async fn recv(&mut self) -> Option<AuthChange> {
        self.receiver.recv().await
    }
}

/// Broadcast fan-out of [`AuthChange`] notifications.
///
/// Best-effort: publishing to a dropped subscriber just prunes it.
#[derive(Debug, Default)]
pub struct AuthChannel {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<AuthChange>>>,
}

impl AuthChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> AuthSubscription {
        let (tx, rx) = mpsc::unbounded_channel();

        // If the lock is poisoned we still hand out a subscription; it just
        // won't receive anything.
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }

        AuthSubscription::new(rx)
    }

    pub fn publish(&self, change: AuthChange) {
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.retain(|tx| tx.send(change.clone()).is_ok());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bombeiro_auth::AuthEvent;

    #[tokio::test]
    async fn every_subscriber_sees_every_change() {
        let channel = AuthChannel::new();
        let mut a = channel.subscribe();
        let mut b = channel.subscribe();

        channel.publish(AuthChange::signed_out());

        let got_a = a.recv().await.unwrap();
        let got_b = b.recv().await.unwrap();
        assert_eq!(got_a.event, AuthEvent::SignedOut);
        assert_eq!(got_b.event, AuthEvent::SignedOut);
    }

    #[tokio::test]
    async fn dropped_subscribers_are_pruned() {
        let channel = AuthChannel::new();
        let sub = channel.subscribe();
        drop(sub);

        channel.publish(AuthChange::signed_out());

        let mut live = channel.subscribe();
        channel.publish(AuthChange::signed_out());
        assert!(live.recv().await.is_some());
    }
}
