//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Scheduler: Timer implementations of the scheduler port
//! - Storage: Snapshot persistence and seed loading
//! - Fixtures: Demo data
//! - Adapters: Terminal front end

pub mod adapters;
pub mod config;
pub mod fixtures;
pub mod scheduler;
pub mod storage;
