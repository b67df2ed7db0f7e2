//! Domain layer - Core inbox model with no infrastructure dependencies
//!
//! This layer contains:
//! - Entities: User, Item, Message, Conversation, Notification
//! - Traits: Ports for infrastructure (Scheduler, SnapshotStore)

pub mod entities;
pub mod traits;
