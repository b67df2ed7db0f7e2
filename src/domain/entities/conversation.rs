use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Item, Message, User};

/// A thread between participants, optionally anchored to an item listing.
///
/// `unread_count` is only mutated by the message store after construction;
/// callers can seed it through [`Conversation::with_unread_count`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub participants: Vec<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<Item>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<Message>,
    #[serde(default)]
    pub(crate) unread_count: u32,
}

impl Conversation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            participants: Vec::new(),
            item_id: None,
            item: None,
            last_message: None,
            unread_count: 0,
        }
    }

    pub fn with_participants(mut self, participants: Vec<User>) -> Self {
        self.participants = participants;
        self
    }

    pub fn with_participant(mut self, user: User) -> Self {
        self.participants.push(user);
        self
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.item_id = Some(item.id.clone());
        self.item = Some(item);
        self
    }

    pub fn with_last_message(mut self, message: Message) -> Self {
        self.last_message = Some(message);
        self
    }

    pub fn with_unread_count(mut self, count: u32) -> Self {
        self.unread_count = count;
        self
    }

    pub fn unread_count(&self) -> u32 {
        self.unread_count
    }

    pub fn has_unread(&self) -> bool {
        self.unread_count > 0
    }

    /// First participant that is not `current_user_id`.
    pub fn other_participant(&self, current_user_id: &str) -> Option<&User> {
        self.participants.iter().find(|p| p.id != current_user_id)
    }

    /// Case-insensitive match of `query` against the other participant's
    /// name or the anchored item's title. An empty query matches everything.
    pub fn matches_search(&self, current_user_id: &str, query: &str) -> bool {
        let query = query.to_lowercase();
        if query.is_empty() {
            return true;
        }

        let by_name = self
            .other_participant(current_user_id)
            .map(|p| p.name.to_lowercase().contains(&query))
            .unwrap_or(false);
        let by_item = self
            .item
            .as_ref()
            .map(|i| i.title.to_lowercase().contains(&query))
            .unwrap_or(false);

        by_name || by_item
    }

    /// Merge a patch. Returns whether anything was written.
    pub fn apply(&mut self, patch: ConversationPatch) -> bool {
        let mut changed = false;
        if let Some(participants) = patch.participants {
            self.participants = participants;
            changed = true;
        }
        if let Some(item_id) = patch.item_id {
            self.item_id = Some(item_id);
            changed = true;
        }
        if let Some(item) = patch.item {
            self.item = Some(item);
            changed = true;
        }
        if let Some(message) = patch.last_message {
            self.last_message = Some(message);
            changed = true;
        }
        changed
    }
}

/// Partial update for a conversation. The unread counter is deliberately
/// absent: only store operations adjust it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationPatch {
    pub participants: Option<Vec<User>>,
    pub item_id: Option<String>,
    pub item: Option<Item>,
    pub last_message: Option<Message>,
}

impl ConversationPatch {
    pub fn last_message(message: Message) -> Self {
        Self {
            last_message: Some(message),
            ..Self::default()
        }
    }
}

/// Overview of one conversation and its slice of the message log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub participant_count: usize,
    pub message_count: usize,
    pub first_message: Option<Message>,
    pub last_message: Option<Message>,
    pub is_unread: bool,
}

/// The slice of inbox state that survives restarts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedInbox {
    #[serde(default)]
    pub selected_conversation_id: Option<String>,
    #[serde(default)]
    pub search_query: String,
    #[serde(default)]
    pub unread_counts: BTreeMap<String, u32>,
}
