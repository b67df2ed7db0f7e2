//! Application services - The inbox state containers

pub mod message_store;
pub mod notification_store;

pub use message_store::{DeliveryTiming, MessageState, MessageStore, StoreChange};
pub use notification_store::{NotificationChange, NotificationState, NotificationStore};
