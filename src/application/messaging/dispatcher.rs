//! Command dispatcher - Routes parsed console commands to the inbox

use std::fmt::Write;

use super::facade::Messaging;
use super::parser::InboxCommand;
use crate::application::services::NotificationStore;
use crate::domain::entities::{
    Conversation, Message, MessageStatus, NewNotification, Notification, NotificationKind, User,
};

const HELP: &str = "\
Commands:
  /list                          Show conversations (filtered by search)
  /open <conv-id>                Open a conversation and mark it read
  /back                          Return to the conversation list
  /search [query]                Filter by participant name or item title
  /send <text>                   Send to the open conversation (bare text works too)
  /new <conv-id> <user-id> [name]  Start a conversation
  /delete <conv-id>              Delete a conversation
  /delete-message <msg-id>       Delete a message
  /incoming <conv-id> <sender-id> <text>  Simulate an inbound message
  /summary [conv-id]             Summarize a conversation
  /notifications                 List notifications
  /read <notif-id>               Mark a notification read
  /read-all                      Mark every notification read
  /dismiss <notif-id>            Remove a notification
  /clear-notifications           Remove all notifications
  /quit                          Save and exit";

const PREVIEW_CHARS: usize = 50;

/// What the console loop should do after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Reply(String),
    Quit,
}

/// Executes inbox commands against the messaging facade and the
/// notification store, producing text replies.
pub struct InboxDispatcher {
    messaging: Messaging,
    notifications: NotificationStore,
    current_user: User,
}

impl InboxDispatcher {
    pub fn new(messaging: Messaging, notifications: NotificationStore, current_user: User) -> Self {
        Self {
            messaging,
            notifications,
            current_user,
        }
    }

    pub fn messaging(&self) -> &Messaging {
        &self.messaging
    }

    pub fn notifications(&self) -> &NotificationStore {
        &self.notifications
    }

    pub fn dispatch(&self, command: InboxCommand) -> DispatchOutcome {
        tracing::debug!("Dispatching {:?}", command);

        let reply = match command {
            InboxCommand::Quit => return DispatchOutcome::Quit,
            InboxCommand::Help => HELP.to_string(),
            InboxCommand::List => self.render_list(),
            InboxCommand::Open(id) => self.open(&id),
            InboxCommand::Back => {
                self.messaging.handle_back_to_list();
                self.render_list()
            }
            InboxCommand::Search(query) => {
                self.messaging.handle_search_change(&query);
                self.render_list()
            }
            InboxCommand::Send(text) => self.send(&text),
            InboxCommand::New {
                conversation_id,
                user_id,
                name,
            } => self.create(conversation_id, user_id, name),
            InboxCommand::Delete(id) => {
                if self.messaging.store().conversation(&id).is_none() {
                    format!("No conversation {}", id)
                } else {
                    self.messaging.handle_delete_conversation(&id);
                    format!("Deleted conversation {}", id)
                }
            }
            InboxCommand::DeleteMessage(id) => {
                if self.messaging.store().message(&id).is_none() {
                    format!("No message {}", id)
                } else {
                    self.messaging.handle_delete_message(&id);
                    format!("Deleted message {}", id)
                }
            }
            InboxCommand::Incoming {
                conversation_id,
                sender_id,
                content,
            } => self.incoming(conversation_id, sender_id, content),
            InboxCommand::Summary(id) => self.summary(id),
            InboxCommand::Notifications => self.render_notifications(),
            InboxCommand::Read(id) => {
                self.notifications.mark_as_read(&id);
                self.render_notifications()
            }
            InboxCommand::ReadAll => {
                self.notifications.mark_all_as_read();
                self.render_notifications()
            }
            InboxCommand::Dismiss(id) => {
                self.notifications.remove_notification(&id);
                self.render_notifications()
            }
            InboxCommand::ClearNotifications => {
                self.notifications.clear_all();
                "Notifications cleared".to_string()
            }
            InboxCommand::Invalid(hint) => hint,
        };

        DispatchOutcome::Reply(reply)
    }

    fn open(&self, conversation_id: &str) -> String {
        if self.messaging.store().conversation(conversation_id).is_none() {
            return format!("No conversation {}", conversation_id);
        }
        self.messaging.handle_select_conversation(conversation_id);
        self.render_thread()
    }

    fn send(&self, text: &str) -> String {
        let store = self.messaging.store();
        if store.selected_conversation_id().is_none() {
            return "Open a conversation first: /open <conv-id>".to_string();
        }
        if text.trim().is_empty() {
            return "Nothing to send".to_string();
        }

        let before = store.messages().len();
        self.messaging.handle_send_message(text);

        if let Some(error) = store.error() {
            store.clear_error();
            return format!("Send failed: {}", error);
        }

        match store.messages().get(before) {
            Some(message) => self.render_message(message),
            None => "Nothing sent".to_string(),
        }
    }

    fn create(&self, conversation_id: String, user_id: String, name: Option<String>) -> String {
        if self.messaging.store().conversation(&conversation_id).is_some() {
            self.messaging.handle_select_conversation(&conversation_id);
            return format!("Conversation {} already exists, opened it", conversation_id);
        }

        let other = User::new(user_id.clone(), name.unwrap_or(user_id));
        let conversation = Conversation::new(conversation_id.clone())
            .with_participants(vec![self.current_user.clone(), other]);
        self.messaging.handle_create_conversation(conversation);
        format!("Started conversation {}", conversation_id)
    }

    fn incoming(&self, conversation_id: String, sender_id: String, content: String) -> String {
        let message = Message::new(conversation_id.clone(), sender_id.clone(), content.clone())
            .with_status(MessageStatus::Delivered);
        self.messaging.handle_incoming_message(message);

        let sender = self
            .messaging
            .store()
            .conversation(&conversation_id)
            .and_then(|c| c.participants.iter().find(|p| p.id == sender_id).cloned())
            .map(|u| u.name)
            .unwrap_or(sender_id);
        let notification = self.notifications.add_notification(
            NewNotification::new(
                NotificationKind::Message,
                format!("New message from {}", sender),
                preview(&content),
            )
            .with_link("/messages"),
        );

        format!("{} -> {}: {} ({})", sender, conversation_id, content, notification.id)
    }

    fn summary(&self, conversation_id: Option<String>) -> String {
        let Some(id) = conversation_id.or_else(|| self.messaging.store().selected_conversation_id()) else {
            return "Usage: /summary <conv-id>".to_string();
        };
        let Some(summary) = self.messaging.conversation_summary(&id) else {
            return format!("No conversation {}", id);
        };

        let mut out = format!(
            "{}: {} participants, {} messages{}",
            id,
            summary.participant_count,
            summary.message_count,
            if summary.is_unread { ", unread" } else { "" }
        );
        if let Some(first) = summary.first_message {
            let _ = write!(out, "\n  first: {}", preview(&first.content));
        }
        if let Some(last) = summary.last_message {
            let _ = write!(out, "\n  last:  {}", preview(&last.content));
        }
        out
    }

    // ====================================================================
    // Rendering
    // ====================================================================

    fn render_list(&self) -> String {
        let conversations = self.messaging.filtered_conversations();
        let store = self.messaging.store();
        let selected = store.selected_conversation_id();
        let query = store.search_query();

        let mut out = if query.is_empty() {
            format!("Conversations ({} unread)", self.messaging.total_unread_count())
        } else {
            format!("Conversations matching \"{}\"", query)
        };
        if conversations.is_empty() {
            out.push_str("\n  (none)");
        }

        for conv in &conversations {
            let marker = if selected.as_deref() == Some(conv.id.as_str()) { '*' } else { ' ' };
            let who = conv
                .other_participant(self.messaging.current_user_id())
                .map(|u| u.name.clone())
                .unwrap_or_else(|| "(no participants)".to_string());
            let _ = write!(out, "\n{} {}  {}", marker, conv.id, who);
            if let Some(item) = &conv.item {
                let _ = write!(out, "  [{}]", item.title);
            }
            if conv.has_unread() {
                let _ = write!(out, "  ({} unread)", conv.unread_count());
            }
            if let Some(last) = &conv.last_message {
                let _ = write!(out, "\n    {}", preview(&last.content));
            }
        }
        out
    }

    fn render_thread(&self) -> String {
        let Some(conv) = self.messaging.active_conversation() else {
            return "No conversation open".to_string();
        };
        let title = self
            .messaging
            .other_participant()
            .map(|u| u.name)
            .unwrap_or_else(|| conv.id.clone());

        let mut out = format!("== {} ({}) ==", title, conv.id);
        if let Some(item) = &conv.item {
            let _ = write!(out, "\nAbout: {}", item.title);
        }
        let messages = self.messaging.conversation_messages();
        if messages.is_empty() {
            out.push_str("\n  (no messages yet)");
        }
        for message in &messages {
            out.push('\n');
            out.push_str(&self.render_message(message));
        }
        out
    }

    fn render_message(&self, message: &Message) -> String {
        let who = if message.is_from(self.messaging.current_user_id()) {
            "you".to_string()
        } else {
            message.sender_id.clone()
        };
        format!(
            "  [{}] {} {}: {}",
            message.timestamp.format("%H:%M"),
            message.status,
            who,
            message.content
        )
    }

    fn render_notifications(&self) -> String {
        let state = self.notifications.state();
        let mut out = format!("Notifications ({} unread)", state.unread_count);
        if state.notifications.is_empty() {
            out.push_str("\n  (none)");
        }
        for n in &state.notifications {
            out.push('\n');
            out.push_str(&render_notification(n));
        }
        out
    }
}

fn render_notification(n: &Notification) -> String {
    format!(
        "{} {} [{}] {}: {}",
        if n.read { ' ' } else { '•' },
        n.id,
        n.kind.as_str(),
        n.title,
        n.description
    )
}

fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", cut)
}
