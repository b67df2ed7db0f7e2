//! Notification store - transient system alerts with an unread counter

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use crate::application::subscribers::{SubscriptionId, Subscribers};
use crate::domain::entities::{NewNotification, Notification};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationChange {
    Added,
    Read,
    Removed,
    Cleared,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationState {
    /// Newest first.
    pub notifications: Vec<Notification>,
    /// Always equals the number of notifications with `read == false`.
    pub unread_count: u32,
}

/// Notification store.
///
/// Independent of the message store. The unread counter is maintained
/// incrementally by every operation rather than recomputed.
#[derive(Clone)]
pub struct NotificationStore {
    inner: Arc<Inner>,
}

struct Inner {
    state: RwLock<NotificationState>,
    subscribers: Subscribers<NotificationChange>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::with_notifications(Vec::new())
    }

    /// Seed the store; the counter is derived once from the seed.
    pub fn with_notifications(notifications: Vec<Notification>) -> Self {
        let unread_count = notifications.iter().filter(|n| !n.read).count() as u32;
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(NotificationState {
                    notifications,
                    unread_count,
                }),
                subscribers: Subscribers::new(),
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, NotificationState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut NotificationState) -> Option<NotificationChange>,
    {
        let change = {
            let mut state = self.inner.state.write().unwrap_or_else(PoisonError::into_inner);
            f(&mut state)
        };
        if let Some(change) = change {
            self.inner.subscribers.notify(&change);
        }
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&NotificationChange) + Send + Sync + 'static,
    {
        self.inner.subscribers.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.subscribers.unsubscribe(id)
    }

    pub fn state(&self) -> NotificationState {
        self.read().clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.read().notifications.clone()
    }

    pub fn unread_count(&self) -> u32 {
        self.read().unread_count
    }

    pub fn add_notification(&self, notification: NewNotification) -> Notification {
        let created = notification.into_notification();
        let stored = created.clone();
        self.update(|state| {
            state.notifications.insert(0, stored);
            state.unread_count += 1;
            Some(NotificationChange::Added)
        });
        tracing::debug!("Added {} notification {}", created.kind.as_str(), created.id);
        created
    }

    pub fn mark_as_read(&self, id: &str) {
        self.update(|state| {
            let notification = state.notifications.iter_mut().find(|n| n.id == id)?;
            if notification.read {
                return None;
            }
            notification.read = true;
            state.unread_count = state.unread_count.saturating_sub(1);
            Some(NotificationChange::Read)
        });
    }

    pub fn mark_all_as_read(&self) {
        self.update(|state| {
            for notification in state.notifications.iter_mut() {
                notification.read = true;
            }
            state.unread_count = 0;
            Some(NotificationChange::Read)
        });
    }

    pub fn remove_notification(&self, id: &str) {
        self.update(|state| {
            let index = state.notifications.iter().position(|n| n.id == id)?;
            let removed = state.notifications.remove(index);
            if !removed.read {
                state.unread_count = state.unread_count.saturating_sub(1);
            }
            Some(NotificationChange::Removed)
        });
    }

    pub fn clear_all(&self) {
        self.update(|state| {
            state.notifications.clear();
            state.unread_count = 0;
            Some(NotificationChange::Cleared)
        });
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}
