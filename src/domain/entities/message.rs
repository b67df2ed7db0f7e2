use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery lifecycle of a message.
///
/// Ordered: `Sent < Delivered < Read`. Status only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Read,
}

impl MessageStatus {
    pub fn as_str(&self) -> &str {
        match self {
            MessageStatus::Sent => "sent",
            MessageStatus::Delivered => "delivered",
            MessageStatus::Read => "read",
        }
    }

    /// The following stage, `None` once terminal.
    pub fn next(self) -> Option<Self> {
        match self {
            MessageStatus::Sent => Some(MessageStatus::Delivered),
            MessageStatus::Delivered => Some(MessageStatus::Read),
            MessageStatus::Read => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == MessageStatus::Read
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single chat message inside a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub status: MessageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Message {
    /// Fresh outgoing message: new id, stamped now, status `sent`.
    pub fn new(
        conversation_id: impl Into<String>,
        sender_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: format!("msg-{}", uuid::Uuid::new_v4()),
            conversation_id: conversation_id.into(),
            sender_id: sender_id.into(),
            content: content.into(),
            timestamp: Utc::now(),
            status: MessageStatus::Sent,
            image: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_status(mut self, status: MessageStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn is_from(&self, user_id: &str) -> bool {
        self.sender_id == user_id
    }

    /// Merge a patch into this message. Returns whether anything changed.
    ///
    /// A status that is not strictly ahead of the current one is ignored.
    pub fn apply(&mut self, patch: MessagePatch) -> bool {
        let mut changed = false;

        if let Some(content) = patch.content {
            if content != self.content {
                self.content = content;
                changed = true;
            }
        }

        if let Some(image) = patch.image {
            if self.image.as_ref() != Some(&image) {
                self.image = Some(image);
                changed = true;
            }
        }

        if let Some(status) = patch.status {
            if status > self.status {
                self.status = status;
                changed = true;
            } else if status < self.status {
                tracing::debug!(
                    "Ignoring status regression on {}: {} -> {}",
                    self.id,
                    self.status,
                    status
                );
            }
        }

        changed
    }
}

/// Partial update for a message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePatch {
    pub content: Option<String>,
    pub status: Option<MessageStatus>,
    pub image: Option<String>,
}

impl MessagePatch {
    pub fn status(status: MessageStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }
}
