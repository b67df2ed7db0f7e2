//! Messaging - Facade over the message store and the console command pipeline

pub mod dispatcher;
pub mod facade;
pub mod parser;

pub use dispatcher::{DispatchOutcome, InboxDispatcher};
pub use facade::Messaging;
pub use parser::{CommandParser, InboxCommand};
