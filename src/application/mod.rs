//! Application layer - State containers and use cases
//!
//! This layer contains:
//! - Services: Message and notification stores
//! - Messaging: Facade, command parsing and dispatching
//! - Subscribers: Change notification registry
//! - Errors: Domain-specific errors

pub mod errors;
pub mod messaging;
pub mod services;
pub mod subscribers;
