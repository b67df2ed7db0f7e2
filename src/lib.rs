//! campus-inbox - Conversation and message store for a campus lost-and-found
//! marketplace, with a console front end.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::errors::InboxError;
pub use application::messaging::{Messaging, InboxDispatcher};
pub use application::services::{MessageStore, NotificationStore};
pub use infrastructure::config::Config;
