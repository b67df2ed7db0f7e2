//! Domain entities - Core inbox objects with no behaviour beyond their own fields

pub mod user;
pub mod item;
pub mod message;
pub mod conversation;
pub mod notification;

pub use user::{Role, User};
pub use item::{Item, ItemKind, ItemStatus};
pub use message::{Message, MessagePatch, MessageStatus};
pub use conversation::{Conversation, ConversationPatch, ConversationSummary, PersistedInbox};
pub use notification::{NewNotification, Notification, NotificationKind};
