//! Command parser - Turns console input lines into inbox commands

/// A parsed console instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboxCommand {
    Help,
    List,
    Open(String),
    Back,
    Search(String),
    Send(String),
    New {
        conversation_id: String,
        user_id: String,
        name: Option<String>,
    },
    Delete(String),
    DeleteMessage(String),
    Incoming {
        conversation_id: String,
        sender_id: String,
        content: String,
    },
    Summary(Option<String>),
    Notifications,
    Read(String),
    ReadAll,
    Dismiss(String),
    ClearNotifications,
    Quit,
    /// Malformed or unknown input, with a hint for the user.
    Invalid(String),
}

/// Parses console lines. Prefixed lines are commands, anything else is a
/// message for the open conversation.
pub struct CommandParser {
    prefix: String,
}

impl CommandParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `None` for blank lines.
    pub fn parse(&self, line: &str) -> Option<InboxCommand> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let Some(cmd_text) = line.strip_prefix(self.prefix.as_str()) else {
            return Some(InboxCommand::Send(line.to_string()));
        };

        let (name, rest) = match cmd_text.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (cmd_text, ""),
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match name.to_lowercase().as_str() {
            "help" | "h" => InboxCommand::Help,
            "list" | "ls" => InboxCommand::List,
            "open" => match args.first() {
                Some(id) => InboxCommand::Open(id.to_string()),
                None => self.usage("open <conversation-id>"),
            },
            "back" => InboxCommand::Back,
            "search" => InboxCommand::Search(rest.to_string()),
            "send" => InboxCommand::Send(rest.to_string()),
            "new" => match args.as_slice() {
                [conversation_id, user_id, name @ ..] => InboxCommand::New {
                    conversation_id: conversation_id.to_string(),
                    user_id: user_id.to_string(),
                    name: if name.is_empty() { None } else { Some(name.join(" ")) },
                },
                _ => self.usage("new <conversation-id> <user-id> [name]"),
            },
            "delete" => match args.first() {
                Some(id) => InboxCommand::Delete(id.to_string()),
                None => self.usage("delete <conversation-id>"),
            },
            "delete-message" => match args.first() {
                Some(id) => InboxCommand::DeleteMessage(id.to_string()),
                None => self.usage("delete-message <message-id>"),
            },
            "incoming" => match args.as_slice() {
                [conversation_id, sender_id, content @ ..] if !content.is_empty() => {
                    InboxCommand::Incoming {
                        conversation_id: conversation_id.to_string(),
                        sender_id: sender_id.to_string(),
                        content: content.join(" "),
                    }
                }
                _ => self.usage("incoming <conversation-id> <sender-id> <text>"),
            },
            "summary" => InboxCommand::Summary(args.first().map(|s| s.to_string())),
            "notifications" | "n" => InboxCommand::Notifications,
            "read" => match args.first() {
                Some(id) => InboxCommand::Read(id.to_string()),
                None => self.usage("read <notification-id>"),
            },
            "read-all" => InboxCommand::ReadAll,
            "dismiss" => match args.first() {
                Some(id) => InboxCommand::Dismiss(id.to_string()),
                None => self.usage("dismiss <notification-id>"),
            },
            "clear-notifications" => InboxCommand::ClearNotifications,
            "quit" | "exit" | "q" => InboxCommand::Quit,
            other => InboxCommand::Invalid(format!(
                "Unknown command: {}{}. Try {}help",
                self.prefix, other, self.prefix
            )),
        };

        Some(command)
    }

    fn usage(&self, usage: &str) -> InboxCommand {
        InboxCommand::Invalid(format!("Usage: {}{}", self.prefix, usage))
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new("/")
    }
}
