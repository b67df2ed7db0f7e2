use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What produced a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Claim,
    Message,
    Item,
    System,
}

impl NotificationKind {
    pub fn as_str(&self) -> &str {
        match self {
            NotificationKind::Claim => "claim",
            NotificationKind::Message => "message",
            NotificationKind::Item => "item",
            NotificationKind::System => "system",
        }
    }
}

/// A transient system alert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Producer-supplied part of a notification; id, timestamp and read flag
/// are filled in by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
    pub link: Option<String>,
}

impl NewNotification {
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            description: description.into(),
            link: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub(crate) fn into_notification(self) -> Notification {
        Notification {
            id: format!("notif-{}", uuid::Uuid::new_v4()),
            kind: self.kind,
            title: self.title,
            description: self.description,
            timestamp: Utc::now(),
            read: false,
            link: self.link,
        }
    }
}
