//! Host notification bus
//!
//! Explicit publish/subscribe channel replacing ambient plugin-bus state.
//! Components receive the bus as a constructor-time dependency; the tick
//! owner drains subscriptions and pumps delayed posts once per tick.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};

/// Subscription handle; drain with `try_recv` from the tick thread
pub type NotificationReceiver = Receiver<Notification>;

/// Bus messages, produced and consumed by the core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "subject")]
pub enum Notification {
    /// `picoflexx.disconnected` - sustained frame loss detected
    #[serde(rename = "picoflexx.disconnected")]
    Disconnected,

    /// `picoflexx.reconnected` - device back online
    #[serde(rename = "picoflexx.reconnected")]
    Reconnected,

    /// `picoflexx.set_exposure` - delayed-apply of an exposure change
    #[serde(rename = "picoflexx.set_exposure")]
    SetExposure { exposure: u32 },

    /// `recording.started` - host opened a recording session
    #[serde(rename = "recording.started")]
    RecordingStarted { rec_path: PathBuf },

    /// `recording.stopped` - host closed the recording session
    #[serde(rename = "recording.stopped")]
    RecordingStopped,
}

impl Notification {
    /// Wire subject of this notification
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Disconnected => "picoflexx.disconnected",
            Self::Reconnected => "picoflexx.reconnected",
            Self::SetExposure { .. } => "picoflexx.set_exposure",
            Self::RecordingStarted { .. } => "recording.started",
            Self::RecordingStopped => "recording.stopped",
        }
    }
}

/// A post scheduled for later delivery
#[derive(Debug)]
struct DelayedPost {
    deliver_at: f64,
    notification: Notification,
}

#[derive(Debug, Default)]
struct BusInner {
    subscribers: Vec<Sender<Notification>>,
    delayed: Vec<DelayedPost>,
}

/// Multi-subscriber notification bus with host-time-delayed posts
///
/// Fan-out is immediate on `post`; delayed posts are held until `pump(now)`
/// observes their due time. Single-threaded tick use; the internal mutex only
/// guards against clones living on other threads.
#[derive(Debug, Clone, Default)]
pub struct NotificationBus {
    inner: Arc<Mutex<BusInner>>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber receiving every subsequent notification
    pub fn subscribe(&self) -> NotificationReceiver {
        let (tx, rx) = async_channel::unbounded();
        self.inner.lock().unwrap().subscribers.push(tx);
        rx
    }

    /// Deliver `notification` to all current subscribers
    pub fn post(&self, notification: Notification) {
        let mut inner = self.inner.lock().unwrap();
        Self::fan_out(&mut inner.subscribers, notification);
    }

    /// Hold `notification` until the host clock reaches `deliver_at`
    pub fn post_delayed(&self, notification: Notification, deliver_at: f64) {
        self.inner.lock().unwrap().delayed.push(DelayedPost {
            deliver_at,
            notification,
        });
    }

    /// Deliver all delayed posts whose due time has passed
    pub fn pump(&self, now: f64) {
        let mut inner = self.inner.lock().unwrap();
        let mut due: Vec<Notification> = Vec::new();
        inner.delayed.retain(|post| {
            if post.deliver_at <= now {
                due.push(post.notification.clone());
                false
            } else {
                true
            }
        });
        for notification in due {
            Self::fan_out(&mut inner.subscribers, notification);
        }
    }

    fn fan_out(subscribers: &mut Vec<Sender<Notification>>, notification: Notification) {
        // Drop subscribers whose receiver is gone
        subscribers.retain(|tx| tx.try_send(notification.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_out_to_all_subscribers() {
        let bus = NotificationBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();

        bus.post(Notification::Disconnected);

        assert_eq!(a.try_recv().unwrap(), Notification::Disconnected);
        assert_eq!(b.try_recv().unwrap(), Notification::Disconnected);
    }

    #[test]
    fn test_delayed_post_held_until_due() {
        let bus = NotificationBus::new();
        let rx = bus.subscribe();

        bus.post_delayed(Notification::SetExposure { exposure: 2000 }, 10.3);

        bus.pump(10.0);
        assert!(rx.try_recv().is_err());

        bus.pump(10.3);
        assert_eq!(
            rx.try_recv().unwrap(),
            Notification::SetExposure { exposure: 2000 }
        );
        // Delivered once only
        bus.pump(11.0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let bus = NotificationBus::new();
        let rx = bus.subscribe();
        drop(rx);

        // Must not error or leak
        bus.post(Notification::RecordingStopped);
    }

    #[test]
    fn test_subjects_are_stable() {
        assert_eq!(Notification::Disconnected.subject(), "picoflexx.disconnected");
        assert_eq!(Notification::Reconnected.subject(), "picoflexx.reconnected");
        assert_eq!(
            Notification::SetExposure { exposure: 1 }.subject(),
            "picoflexx.set_exposure"
        );
        assert_eq!(
            Notification::RecordingStarted {
                rec_path: PathBuf::from("/rec")
            }
            .subject(),
            "recording.started"
        );
        assert_eq!(Notification::RecordingStopped.subject(), "recording.stopped");
    }
}
