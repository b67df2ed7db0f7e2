//! Adapters - Front ends that drive the inbox

pub mod console;

pub use console::{ConsoleAdapter, StatusWatcher};
