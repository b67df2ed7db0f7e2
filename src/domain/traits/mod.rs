//! Domain traits - Ports implemented by the infrastructure layer

pub mod scheduler;
pub mod store;

pub use scheduler::{Scheduler, Task, TaskHandle};
pub use store::SnapshotStore;
