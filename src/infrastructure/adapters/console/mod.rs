//! Console adapter for driving the inbox from a terminal

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Mutex, PoisonError};

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::application::services::{MessageStore, StoreChange};
use crate::application::subscribers::SubscriptionId;
use crate::domain::entities::{Message, MessageStatus};

/// Line-oriented terminal front end
pub struct ConsoleAdapter {
    lines: Lines<BufReader<Stdin>>,
}

impl ConsoleAdapter {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Prompt and wait for the next line; `None` on end of input.
    pub async fn read_line(&mut self, prompt: &str) -> Option<String> {
        print!("{}", prompt);
        let _ = std::io::stdout().flush();
        match self.lines.next_line().await {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Failed to read input: {}", e);
                None
            }
        }
    }

    pub fn print(&self, text: &str) {
        println!("{}", text);
    }

    /// Print status transitions of messages sent by `user_id` as they happen.
    pub fn watch_status(&self, store: &MessageStore, user_id: &str) -> SubscriptionId {
        let watcher = StatusWatcher::new(user_id);
        let observed = store.clone();
        store.subscribe(move |change| {
            if *change != StoreChange::Messages {
                return;
            }
            for line in watcher.transitions(&observed) {
                println!("{}", line);
            }
        })
    }
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// Remembers the last status seen for each of one user's messages and
/// reports what moved since.
pub struct StatusWatcher {
    user_id: String,
    seen: Mutex<HashMap<String, MessageStatus>>,
}

impl StatusWatcher {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Lines like `msg-…: delivered` for messages whose status advanced.
    /// Messages seen for the first time are recorded, not reported; deleted
    /// ones are forgotten.
    pub fn transitions(&self, store: &MessageStore) -> Vec<String> {
        let own: Vec<Message> = store
            .messages()
            .into_iter()
            .filter(|m| m.is_from(&self.user_id))
            .collect();

        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        seen.retain(|id, _| own.iter().any(|m| &m.id == id));
        let mut lines = Vec::new();

        for message in &own {
            match seen.insert(message.id.clone(), message.status) {
                Some(previous) if previous != message.status => {
                    lines.push(format!("  {} {}: {}", message.id, message.conversation_id, message.status));
                }
                _ => {}
            }
        }
        lines
    }
}
