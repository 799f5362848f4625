//! # Notification Center
//!
//! Transient, auto-dismissing notifications for transfer outcomes.
//!
//! Notifications live independently of any workflow invocation: a success
//! message stays visible after the workflow that produced it has closed.
//! Expiry is evaluated lazily against the injected `Clock` whenever the
//! active list is read.

use bridge_traits::Clock;
use chrono::{DateTime, Utc};
use core_runtime::config::DEFAULT_NOTIFICATION_TTL_MS;
use core_runtime::events::{CoreEvent, EventBus, NotificationEvent, NotificationKind};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

pub struct NotificationCenter {
    clock: Arc<dyn Clock>,
    ttl: chrono::Duration,
    event_bus: EventBus,
    entries: Mutex<Vec<Notification>>,
}

impl NotificationCenter {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration, event_bus: EventBus) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| {
            chrono::Duration::milliseconds(DEFAULT_NOTIFICATION_TTL_MS as i64)
        });
        Self {
            clock,
            ttl,
            event_bus,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Show a notification. Returns its id.
    pub async fn notify(&self, kind: NotificationKind, message: impl Into<String>) -> String {
        let now = self.clock.now();
        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            kind,
            message: message.into(),
            created_at: now,
            expires_at: now + self.ttl,
        };
        let id = notification.id.clone();

        debug!(notification_id = %id, ?kind, message = %notification.message, "Notification shown");
        self.event_bus
            .emit(CoreEvent::Notification(NotificationEvent::Shown {
                notification_id: id.clone(),
                kind,
                message: notification.message.clone(),
            }))
            .ok();

        self.entries.lock().await.push(notification);
        id
    }

    /// Visible notifications, oldest first. Expired ones are removed.
    pub async fn active(&self) -> Vec<Notification> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;

        let (expired, live): (Vec<_>, Vec<_>) =
            entries.drain(..).partition(|n| n.is_expired(now));
        *entries = live;

        for notification in expired {
            self.event_bus
                .emit(CoreEvent::Notification(NotificationEvent::Dismissed {
                    notification_id: notification.id,
                    expired: true,
                }))
                .ok();
        }

        entries.clone()
    }

    /// Dismiss one notification early. Returns false if it is already gone.
    pub async fn dismiss(&self, id: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|n| n.id != id);
        let removed = entries.len() != before;

        if removed {
            self.event_bus
                .emit(CoreEvent::Notification(NotificationEvent::Dismissed {
                    notification_id: id.to_string(),
                    expired: false,
                }))
                .ok();
        }
        removed
    }

    /// Most recent visible notification
    pub async fn latest(&self) -> Option<Notification> {
        self.active().await.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    struct ManualClock(StdMutex<DateTime<Utc>>);

    impl ManualClock {
        fn new() -> Self {
            Self(StdMutex::new(Utc::now()))
        }

        fn advance(&self, by: chrono::Duration) {
            let mut now = self.0.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn center(clock: Arc<ManualClock>) -> NotificationCenter {
        NotificationCenter::new(clock, Duration::from_secs(6), EventBus::default())
    }

    #[tokio::test]
    async fn test_notifications_expire() {
        let clock = Arc::new(ManualClock::new());
        let center = center(clock.clone());

        center.notify(NotificationKind::Success, "first").await;
        clock.advance(chrono::Duration::seconds(3));
        center.notify(NotificationKind::Error, "second").await;

        assert_eq!(center.active().await.len(), 2);

        clock.advance(chrono::Duration::seconds(3));
        let active = center.active().await;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].message, "second");

        clock.advance(chrono::Duration::seconds(3));
        assert!(center.active().await.is_empty());
    }

    #[tokio::test]
    async fn test_expiry_emits_dismissed() {
        let clock = Arc::new(ManualClock::new());
        let center = center(clock.clone());
        let mut events = center.event_bus.subscribe();

        let id = center.notify(NotificationKind::Info, "hello").await;
        clock.advance(chrono::Duration::seconds(10));
        center.active().await;

        assert!(matches!(
            events.recv().await.unwrap(),
            CoreEvent::Notification(NotificationEvent::Shown { .. })
        ));
        match events.recv().await.unwrap() {
            CoreEvent::Notification(NotificationEvent::Dismissed {
                notification_id,
                expired,
            }) => {
                assert_eq!(notification_id, id);
                assert!(expired);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dismiss() {
        let clock = Arc::new(ManualClock::new());
        let center = center(clock);

        let id = center.notify(NotificationKind::Success, "done").await;
        assert!(center.dismiss(&id).await);
        assert!(!center.dismiss(&id).await);
        assert!(center.latest().await.is_none());
    }
}
