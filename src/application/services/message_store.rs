//! Message store - the single authoritative container for conversations and messages

use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard};
use std::time::Duration;

use crate::application::errors::{ConfigError, InboxError, SchedulerError};
use crate::application::subscribers::{SubscriptionId, Subscribers};
use crate::domain::entities::{
    Conversation, ConversationPatch, ConversationSummary, Message, MessagePatch, MessageStatus,
    PersistedInbox,
};
use crate::domain::traits::{Scheduler, Task, TaskHandle};

/// Which slice of the state a mutation touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreChange {
    Conversations,
    Messages,
    Selection,
    Input,
    Search,
    MobileView,
    Status,
    Reset,
}

/// Delays of the simulated status progression, both measured from send time.
///
/// Always satisfies `0 < delivered_after < read_after`, so `delivered` is
/// observed strictly before `read`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryTiming {
    delivered_after: Duration,
    read_after: Duration,
}

impl DeliveryTiming {
    pub fn new(delivered_after: Duration, read_after: Duration) -> Result<Self, ConfigError> {
        if delivered_after.is_zero() || read_after <= delivered_after {
            return Err(ConfigError::InvalidValue(format!(
                "delivery delays must satisfy 0 < delivered ({:?}) < read ({:?})",
                delivered_after, read_after
            )));
        }
        Ok(Self {
            delivered_after,
            read_after,
        })
    }

    pub fn delivered_after(&self) -> Duration {
        self.delivered_after
    }

    pub fn read_after(&self) -> Duration {
        self.read_after
    }
}

impl Default for DeliveryTiming {
    fn default() -> Self {
        Self {
            delivered_after: Duration::from_millis(500),
            read_after: Duration::from_millis(1500),
        }
    }
}

/// Full readable state surface of the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageState {
    pub conversations: Vec<Conversation>,
    pub messages: Vec<Message>,
    pub selected_conversation_id: Option<String>,
    pub message_input: String,
    pub search_query: String,
    pub show_mobile_chat: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl MessageState {
    pub fn conversation(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    fn conversation_mut(&mut self, id: &str) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id == id)
    }

    fn message_mut(&mut self, id: &str) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }
}

/// Conversation and message store.
///
/// Cheap to clone; clones share the same state. Every mutation goes through
/// one of the methods below, runs under a single write lock, and notifies
/// subscribers once the lock is released. Operations on unknown ids are
/// silent no-ops.
#[derive(Clone)]
pub struct MessageStore {
    inner: Arc<Inner>,
}

struct Inner {
    state: RwLock<MessageState>,
    subscribers: Subscribers<StoreChange>,
    scheduler: Arc<dyn Scheduler>,
    timing: DeliveryTiming,
    pending: Mutex<Vec<TaskHandle>>,
}

impl MessageStore {
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self::with_timing(scheduler, DeliveryTiming::default())
    }

    pub fn with_timing(scheduler: Arc<dyn Scheduler>, timing: DeliveryTiming) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(MessageState::default()),
                subscribers: Subscribers::new(),
                scheduler,
                timing,
                pending: Mutex::new(Vec::new()),
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, MessageState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `f` under the write lock; `f` returns the slices it changed.
    fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut MessageState) -> Vec<StoreChange>,
    {
        let changes = {
            let mut state = self.inner.state.write().unwrap_or_else(PoisonError::into_inner);
            f(&mut state)
        };
        for change in &changes {
            self.inner.subscribers.notify(change);
        }
        !changes.is_empty()
    }

    // ====================================================================
    // Subscriptions
    // ====================================================================

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&StoreChange) + Send + Sync + 'static,
    {
        self.inner.subscribers.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.subscribers.unsubscribe(id)
    }

    // ====================================================================
    // Reads
    // ====================================================================

    pub fn state(&self) -> MessageState {
        self.read().clone()
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.read().conversations.clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.read().messages.clone()
    }

    pub fn conversation(&self, id: &str) -> Option<Conversation> {
        self.read().conversation(id).cloned()
    }

    pub fn message(&self, id: &str) -> Option<Message> {
        self.read().messages.iter().find(|m| m.id == id).cloned()
    }

    pub fn selected_conversation_id(&self) -> Option<String> {
        self.read().selected_conversation_id.clone()
    }

    pub fn message_input(&self) -> String {
        self.read().message_input.clone()
    }

    pub fn search_query(&self) -> String {
        self.read().search_query.clone()
    }

    pub fn show_mobile_chat(&self) -> bool {
        self.read().show_mobile_chat
    }

    pub fn is_loading(&self) -> bool {
        self.read().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    pub fn timing(&self) -> DeliveryTiming {
        self.inner.timing
    }

    /// Conversations whose other participant's name or item title contains
    /// the current search query, case-insensitively.
    pub fn filtered_conversations(&self, current_user_id: &str) -> Vec<Conversation> {
        let state = self.read();
        state
            .conversations
            .iter()
            .filter(|c| c.matches_search(current_user_id, &state.search_query))
            .cloned()
            .collect()
    }

    /// Messages of one conversation in log (insertion) order.
    pub fn conversation_messages(&self, conversation_id: &str) -> Vec<Message> {
        self.read()
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect()
    }

    pub fn conversation_summary(&self, conversation_id: &str) -> Option<ConversationSummary> {
        let state = self.read();
        let conversation = state.conversation(conversation_id)?;
        let messages: Vec<&Message> = state
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .collect();

        Some(ConversationSummary {
            participant_count: conversation.participants.len(),
            message_count: messages.len(),
            first_message: messages.first().map(|m| (*m).clone()),
            last_message: messages.last().map(|m| (*m).clone()),
            is_unread: conversation.has_unread(),
        })
    }

    // ====================================================================
    // Conversation management
    // ====================================================================

    /// Select a conversation (or clear the selection). The id is not
    /// validated; the mobile chat view follows the selection.
    pub fn set_selected_conversation(&self, conversation_id: Option<&str>) {
        let id = conversation_id.map(str::to_string);
        self.update(|state| {
            state.show_mobile_chat = id.is_some();
            state.selected_conversation_id = id;
            vec![StoreChange::Selection, StoreChange::MobileView]
        });
    }

    pub fn set_conversations(&self, conversations: Vec<Conversation>) {
        self.update(|state| {
            state.conversations = conversations;
            vec![StoreChange::Conversations]
        });
    }

    /// Prepend a conversation. An id already present is left untouched and
    /// `false` is returned.
    pub fn create_conversation(&self, conversation: Conversation) -> bool {
        self.update(|state| {
            if state.conversation(&conversation.id).is_some() {
                tracing::warn!("Conversation {} already exists, keeping existing entry", conversation.id);
                return vec![];
            }
            tracing::debug!("Created conversation {}", conversation.id);
            state.conversations.insert(0, conversation);
            vec![StoreChange::Conversations]
        })
    }

    pub fn update_conversation(&self, conversation_id: &str, patch: ConversationPatch) {
        self.update(|state| {
            let Some(conv) = state.conversation_mut(conversation_id) else {
                tracing::debug!("update_conversation: {} not found", conversation_id);
                return vec![];
            };
            if conv.apply(patch) {
                vec![StoreChange::Conversations]
            } else {
                vec![]
            }
        });
    }

    /// Remove a conversation. Its messages stay in the log; use
    /// [`MessageStore::clear_messages`] to drop them. A deleted selection
    /// moves to the first remaining conversation.
    pub fn delete_conversation(&self, conversation_id: &str) {
        self.update(|state| {
            let before = state.conversations.len();
            state.conversations.retain(|c| c.id != conversation_id);
            if state.conversations.len() == before {
                tracing::debug!("delete_conversation: {} not found", conversation_id);
                return vec![];
            }

            let mut changes = vec![StoreChange::Conversations];
            if state.selected_conversation_id.as_deref() == Some(conversation_id) {
                state.selected_conversation_id = state.conversations.first().map(|c| c.id.clone());
                changes.push(StoreChange::Selection);
            }
            changes
        });
    }

    /// Zero the unread counter. Message statuses are not touched.
    pub fn mark_conversation_as_read(&self, conversation_id: &str) {
        self.update(|state| match state.conversation_mut(conversation_id) {
            Some(conv) if conv.unread_count > 0 => {
                conv.unread_count = 0;
                vec![StoreChange::Conversations]
            }
            _ => vec![],
        });
    }

    // ====================================================================
    // Message management
    // ====================================================================

    /// Append to the log. Does not touch the owning conversation.
    pub fn add_message(&self, message: Message) {
        self.update(|state| {
            state.messages.push(message);
            vec![StoreChange::Messages]
        });
    }

    /// Inbound message from another participant: appended to the log, set as
    /// the conversation's last message, and counted as unread.
    pub fn receive_message(&self, message: Message) {
        self.update(|state| {
            let mut changes = vec![StoreChange::Messages];
            match state.conversation_mut(&message.conversation_id) {
                Some(conv) => {
                    conv.last_message = Some(message.clone());
                    conv.unread_count += 1;
                    changes.push(StoreChange::Conversations);
                }
                None => {
                    tracing::debug!(
                        "receive_message: conversation {} not found, logging message only",
                        message.conversation_id
                    );
                }
            }
            state.messages.push(message);
            changes
        });
    }

    /// Replace every message of one conversation; the new ones go to the end.
    pub fn set_messages(&self, conversation_id: &str, messages: Vec<Message>) {
        self.update(|state| {
            state.messages.retain(|m| m.conversation_id != conversation_id);
            state.messages.extend(messages);
            vec![StoreChange::Messages]
        });
    }

    pub fn update_message(&self, message_id: &str, patch: MessagePatch) {
        self.update(|state| {
            let Some(msg) = state.message_mut(message_id) else {
                tracing::debug!("update_message: {} not found", message_id);
                return vec![];
            };
            if msg.apply(patch) {
                vec![StoreChange::Messages]
            } else {
                vec![]
            }
        });
    }

    pub fn delete_message(&self, message_id: &str) {
        self.update(|state| {
            let before = state.messages.len();
            state.messages.retain(|m| m.id != message_id);
            if state.messages.len() == before {
                vec![]
            } else {
                vec![StoreChange::Messages]
            }
        });
    }

    pub fn clear_messages(&self, conversation_id: &str) {
        self.update(|state| {
            let before = state.messages.len();
            state.messages.retain(|m| m.conversation_id != conversation_id);
            if state.messages.len() == before {
                vec![]
            } else {
                vec![StoreChange::Messages]
            }
        });
    }

    // ====================================================================
    // Sending
    // ====================================================================

    /// Send `content` into a conversation.
    ///
    /// Blank content is ignored. Otherwise the message is committed with
    /// status `sent`, the input is cleared, the conversation's last message
    /// is updated, and the `delivered`/`read` transitions are scheduled.
    /// Returns once the message is committed; the transitions fire later.
    /// Failures are reported through [`MessageStore::error`].
    pub fn send_message(&self, conversation_id: &str, content: &str, sender_id: &str) {
        if content.trim().is_empty() {
            tracing::debug!("send_message: ignoring blank content");
            return;
        }

        self.update(|state| {
            state.is_loading = true;
            state.error = None;
            vec![StoreChange::Status]
        });

        match self.enqueue_outgoing(conversation_id, content, sender_id) {
            Ok(message) => {
                tracing::info!("Sent {} to {}", message.id, conversation_id);
            }
            Err(e) => {
                tracing::warn!("Failed to send message to {}: {}", conversation_id, e);
                self.update(|state| {
                    state.error = Some(e.to_string());
                    state.is_loading = false;
                    vec![StoreChange::Status]
                });
            }
        }
    }

    fn enqueue_outgoing(
        &self,
        conversation_id: &str,
        content: &str,
        sender_id: &str,
    ) -> Result<Message, InboxError> {
        let message = Message::new(conversation_id, sender_id, content);
        let mut scheduled = Ok(Vec::new());

        // Timers are started under the same write lock that commits the
        // message, so a transition can never run before the message exists.
        self.update(|state| {
            scheduled = self.schedule_progression(&message.id);
            if scheduled.is_err() {
                return vec![];
            }

            let mut changes = vec![StoreChange::Messages, StoreChange::Input, StoreChange::Status];
            state.messages.push(message.clone());
            state.message_input.clear();
            if let Some(conv) = state.conversation_mut(conversation_id) {
                conv.last_message = Some(message.clone());
                changes.push(StoreChange::Conversations);
            }
            state.is_loading = false;
            changes
        });

        self.track(scheduled?);
        Ok(message)
    }

    /// Schedule `delivered` then `read` for a message. All-or-nothing: if a
    /// step cannot be scheduled the earlier ones are cancelled. Must not
    /// touch the store state; callers may hold the write lock.
    fn schedule_progression(&self, message_id: &str) -> Result<Vec<TaskHandle>, SchedulerError> {
        let timing = self.inner.timing;
        let steps = [
            (timing.delivered_after, MessageStatus::Delivered),
            (timing.read_after, MessageStatus::Read),
        ];

        let mut handles = Vec::with_capacity(steps.len());
        for (delay, status) in steps {
            let store = Arc::downgrade(&self.inner);
            let id = message_id.to_string();
            let task: Task = Box::new(move || {
                // The store may be gone by the time the timer fires.
                if let Some(inner) = store.upgrade() {
                    MessageStore { inner }.update_message(&id, MessagePatch::status(status));
                }
            });

            match self.inner.scheduler.schedule(delay, task) {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    for handle in &handles {
                        handle.cancel();
                    }
                    return Err(e);
                }
            }
        }
        Ok(handles)
    }

    fn track(&self, handles: Vec<TaskHandle>) {
        let mut pending = self.inner.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.retain(TaskHandle::is_pending);
        pending.extend(handles);
    }

    /// Number of status transitions still waiting to fire.
    pub fn pending_deliveries(&self) -> usize {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|h| h.is_pending())
            .count()
    }

    /// Cancel every outstanding status transition. Returns how many were
    /// actually cancelled.
    pub fn cancel_pending_deliveries(&self) -> usize {
        let handles: Vec<TaskHandle> = self
            .inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        handles.iter().filter(|h| h.cancel()).count()
    }

    // ====================================================================
    // Field setters
    // ====================================================================

    pub fn set_message_input(&self, input: impl Into<String>) {
        let input = input.into();
        self.update(|state| {
            state.message_input = input;
            vec![StoreChange::Input]
        });
    }

    pub fn clear_message_input(&self) {
        self.set_message_input(String::new());
    }

    pub fn set_search_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.update(|state| {
            state.search_query = query;
            vec![StoreChange::Search]
        });
    }

    pub fn set_show_mobile_chat(&self, show: bool) {
        self.update(|state| {
            state.show_mobile_chat = show;
            vec![StoreChange::MobileView]
        });
    }

    pub fn set_is_loading(&self, loading: bool) {
        self.update(|state| {
            state.is_loading = loading;
            vec![StoreChange::Status]
        });
    }

    pub fn set_error(&self, error: Option<String>) {
        self.update(|state| {
            state.error = error;
            vec![StoreChange::Status]
        });
    }

    pub fn clear_error(&self) {
        self.set_error(None);
    }

    // ====================================================================
    // Batch operations
    // ====================================================================

    /// Bulk replace both collections and select the first conversation.
    pub fn initialize_store(&self, conversations: Vec<Conversation>, messages: Vec<Message>) {
        tracing::info!(
            "Initializing store with {} conversations and {} messages",
            conversations.len(),
            messages.len()
        );
        self.update(|state| {
            state.selected_conversation_id = conversations.first().map(|c| c.id.clone());
            state.conversations = conversations;
            state.messages = messages;
            vec![StoreChange::Conversations, StoreChange::Messages, StoreChange::Selection]
        });
    }

    /// Restore initial empty state. Outstanding status timers are cancelled.
    pub fn reset(&self) {
        let cancelled = self.cancel_pending_deliveries();
        if cancelled > 0 {
            tracing::debug!("reset: cancelled {} pending status updates", cancelled);
        }
        self.update(|state| {
            *state = MessageState::default();
            vec![StoreChange::Reset]
        });
    }

    // ====================================================================
    // Persistence
    // ====================================================================

    /// The durable subset: selection, search query and unread counters.
    pub fn persisted(&self) -> PersistedInbox {
        let state = self.read();
        PersistedInbox {
            selected_conversation_id: state.selected_conversation_id.clone(),
            search_query: state.search_query.clone(),
            unread_counts: state
                .conversations
                .iter()
                .map(|c| (c.id.clone(), c.unread_count))
                .collect(),
        }
    }

    /// Apply a persisted snapshot. Unread counters are applied to the
    /// conversations currently loaded; unknown ids are skipped.
    pub fn restore(&self, snapshot: PersistedInbox) {
        self.update(|state| {
            state.selected_conversation_id = snapshot.selected_conversation_id;
            state.search_query = snapshot.search_query;
            for conv in state.conversations.iter_mut() {
                if let Some(count) = snapshot.unread_counts.get(&conv.id) {
                    conv.unread_count = *count;
                }
            }
            vec![StoreChange::Selection, StoreChange::Search, StoreChange::Conversations]
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::User;
    use crate::infrastructure::scheduler::ManualScheduler;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn store() -> (MessageStore, Arc<ManualScheduler>) {
        let scheduler = Arc::new(ManualScheduler::new());
        (MessageStore::new(scheduler.clone()), scheduler)
    }

    fn conv(id: &str) -> Conversation {
        Conversation::new(id)
    }

    fn msg(id: &str, conversation_id: &str) -> Message {
        Message::new(conversation_id, "user-1", format!("body of {}", id)).with_id(id)
    }

    // ========================================================================
    // Initial state
    // ========================================================================

    #[test]
    fn starts_empty() {
        let (store, _) = store();
        let state = store.state();
        assert!(state.conversations.is_empty());
        assert!(state.messages.is_empty());
        assert!(state.selected_conversation_id.is_none());
        assert_eq!(state.message_input, "");
        assert!(!state.is_loading);
        assert!(state.error.is_none());
    }

    // ========================================================================
    // Conversations
    // ========================================================================

    #[test]
    fn create_conversation_prepends() {
        let (store, _) = store();
        store.create_conversation(conv("conv-1"));
        store.create_conversation(conv("conv-2"));

        let ids: Vec<String> = store.conversations().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["conv-2", "conv-1"]);
    }

    #[test]
    fn create_conversation_rejects_duplicate_id() {
        let (store, _) = store();
        assert!(store.create_conversation(conv("conv-1").with_unread_count(2)));
        assert!(!store.create_conversation(conv("conv-1")));

        let conversations = store.conversations();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].unread_count(), 2);
    }

    #[test]
    fn select_toggles_mobile_chat() {
        let (store, _) = store();
        store.set_selected_conversation(Some("missing"));
        assert_eq!(store.selected_conversation_id().as_deref(), Some("missing"));
        assert!(store.show_mobile_chat());

        store.set_selected_conversation(None);
        assert!(store.selected_conversation_id().is_none());
        assert!(!store.show_mobile_chat());
    }

    #[test]
    fn update_conversation_merges_and_ignores_unknown() {
        let (store, _) = store();
        store.create_conversation(conv("conv-1"));
        let patch = ConversationPatch {
            participants: Some(vec![User::new("user-2", "Ama Serwaa")]),
            ..ConversationPatch::default()
        };
        store.update_conversation("conv-1", patch.clone());
        store.update_conversation("conv-9", patch);

        let conversations = store.conversations();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].participants.len(), 1);
    }

    #[test]
    fn delete_selected_moves_to_first_remaining() {
        let (store, _) = store();
        store.initialize_store(vec![conv("a"), conv("b")], vec![]);
        assert_eq!(store.selected_conversation_id().as_deref(), Some("a"));

        store.delete_conversation("a");
        assert_eq!(store.selected_conversation_id().as_deref(), Some("b"));

        store.delete_conversation("b");
        assert!(store.selected_conversation_id().is_none());
    }

    #[test]
    fn delete_unselected_keeps_selection() {
        let (store, _) = store();
        store.initialize_store(vec![conv("a"), conv("b")], vec![]);
        store.delete_conversation("b");
        assert_eq!(store.selected_conversation_id().as_deref(), Some("a"));
    }

    #[test]
    fn delete_conversation_keeps_its_messages() {
        let (store, _) = store();
        store.initialize_store(vec![conv("a")], vec![msg("m1", "a"), msg("m2", "a")]);
        store.delete_conversation("a");
        assert_eq!(store.messages().len(), 2);

        store.clear_messages("a");
        assert!(store.messages().is_empty());
    }

    #[test]
    fn mark_as_read_zeroes_counter_only() {
        let (store, _) = store();
        store.create_conversation(conv("conv-1").with_unread_count(5));
        store.add_message(msg("m1", "conv-1"));

        store.mark_conversation_as_read("conv-1");
        assert_eq!(store.conversations()[0].unread_count(), 0);
        assert_eq!(store.messages()[0].status, MessageStatus::Sent);
    }

    // ========================================================================
    // Messages
    // ========================================================================

    #[test]
    fn add_message_does_not_touch_conversation() {
        let (store, _) = store();
        store.create_conversation(conv("conv-1"));
        store.add_message(msg("m1", "conv-1"));

        let c = store.conversation("conv-1").unwrap();
        assert!(c.last_message.is_none());
        assert_eq!(c.unread_count(), 0);
    }

    #[test]
    fn receive_message_counts_unread() {
        let (store, _) = store();
        store.create_conversation(conv("conv-1"));
        let inbound = Message::new("conv-1", "user-2", "Found it").with_status(MessageStatus::Delivered);

        store.receive_message(inbound.clone());
        store.receive_message(Message::new("conv-1", "user-2", "Still there?"));

        let c = store.conversation("conv-1").unwrap();
        assert_eq!(c.unread_count(), 2);
        assert_eq!(c.last_message.unwrap().content, "Still there?");
        assert_eq!(store.messages().len(), 2);
    }

    #[test]
    fn update_message_patches_status() {
        let (store, _) = store();
        store.add_message(msg("m1", "conv-1"));
        store.update_message("m1", MessagePatch::status(MessageStatus::Delivered));
        assert_eq!(store.message("m1").unwrap().status, MessageStatus::Delivered);

        store.update_message("missing", MessagePatch::status(MessageStatus::Read));
        assert_eq!(store.messages().len(), 1);
    }

    #[test]
    fn delete_message_twice_is_noop() {
        let (store, _) = store();
        store.add_message(msg("m1", "c"));
        store.add_message(msg("m2", "c"));

        store.delete_message("m1");
        let once = store.messages();
        store.delete_message("m1");
        assert_eq!(store.messages(), once);
        assert_eq!(once.len(), 1);
    }

    #[test]
    fn set_messages_replaces_one_conversation() {
        let (store, _) = store();
        store.add_message(msg("a1", "a"));
        store.add_message(msg("b1", "b"));
        store.add_message(msg("a2", "a"));

        store.set_messages("a", vec![msg("a3", "a")]);

        let ids: Vec<String> = store.messages().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["b1", "a3"]);
    }

    #[test]
    fn conversation_messages_keep_insertion_order() {
        let (store, _) = store();
        store.add_message(msg("a1", "a"));
        store.add_message(msg("b1", "b"));
        store.add_message(msg("a2", "a"));
        store.add_message(msg("a3", "a"));

        let ids: Vec<String> = store.conversation_messages("a").into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["a1", "a2", "a3"]);
    }

    #[test]
    fn summary_reports_message_slice() {
        let (store, _) = store();
        store.initialize_store(
            vec![conv("a").with_unread_count(1).with_participant(User::new("user-1", "Kwame"))],
            vec![msg("a1", "a"), msg("b1", "b"), msg("a2", "a")],
        );

        let summary = store.conversation_summary("a").unwrap();
        assert_eq!(summary.participant_count, 1);
        assert_eq!(summary.message_count, 2);
        assert_eq!(summary.first_message.unwrap().id, "a1");
        assert_eq!(summary.last_message.unwrap().id, "a2");
        assert!(summary.is_unread);
        assert!(store.conversation_summary("zzz").is_none());
    }

    // ========================================================================
    // Sending
    // ========================================================================

    #[test]
    fn blank_send_is_ignored() {
        let (store, scheduler) = store();
        store.set_message_input("draft");
        store.send_message("conv-1", "   ", "user-1");

        assert!(store.messages().is_empty());
        assert_eq!(store.message_input(), "draft");
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn send_commits_and_schedules_progression() {
        let (store, scheduler) = store();
        store.create_conversation(conv("conv-1"));
        store.set_message_input("Hi there");

        store.send_message("conv-1", "Hi there", "user-1");

        let state = store.state();
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].status, MessageStatus::Sent);
        assert_eq!(state.message_input, "");
        assert!(!state.is_loading);
        assert_eq!(
            state.conversations[0].last_message.as_ref().map(|m| &m.id),
            Some(&state.messages[0].id)
        );
        assert_eq!(scheduler.pending(), 2);
        assert_eq!(store.pending_deliveries(), 2);
    }

    #[test]
    fn send_to_unknown_conversation_still_logs_message() {
        let (store, _) = store();
        store.send_message("ghost", "hello", "user-1");
        assert_eq!(store.messages().len(), 1);
        assert!(store.conversations().is_empty());
    }

    #[test]
    fn scheduler_failure_sets_error_without_partial_message() {
        let (store, scheduler) = store();
        scheduler.close();
        store.set_message_input("Hi");

        store.send_message("conv-1", "Hi", "user-1");

        assert!(store.messages().is_empty());
        assert!(!store.is_loading());
        assert_eq!(store.message_input(), "Hi");
        assert!(store.error().unwrap().contains("closed"));

        store.clear_error();
        assert!(store.error().is_none());
    }

    #[test]
    fn reset_cancels_pending_transitions() {
        let (store, scheduler) = store();
        store.send_message("conv-1", "Hi", "user-1");
        assert_eq!(store.pending_deliveries(), 2);

        store.reset();
        assert_eq!(store.pending_deliveries(), 0);
        scheduler.advance(Duration::from_secs(5));
        assert!(store.messages().is_empty());
    }

    #[test]
    fn late_transition_after_delete_is_harmless() {
        let (store, scheduler) = store();
        store.send_message("conv-1", "Hi", "user-1");
        let id = store.messages()[0].id.clone();

        store.delete_message(&id);
        scheduler.advance(Duration::from_secs(2));

        assert!(store.messages().is_empty());
    }

    #[test]
    fn dropped_store_ignores_timers() {
        let scheduler = Arc::new(ManualScheduler::new());
        let store = MessageStore::new(scheduler.clone());
        store.send_message("conv-1", "Hi", "user-1");
        drop(store);

        scheduler.advance(Duration::from_secs(2));
        assert_eq!(scheduler.pending(), 0);
    }

    // ========================================================================
    // Search, batch, persistence
    // ========================================================================

    #[test]
    fn filtered_conversations_follow_search_query() {
        let (store, _) = store();
        let me = User::new("user-1", "Kwame Asante");
        store.initialize_store(
            vec![
                conv("c1").with_participants(vec![me.clone(), User::new("user-2", "Ama Serwaa")]),
                conv("c2").with_participants(vec![me, User::new("user-3", "Kofi Mensah")]),
            ],
            vec![],
        );

        assert_eq!(store.filtered_conversations("user-1").len(), 2);
        store.set_search_query("ama");
        let found = store.filtered_conversations("user-1");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "c1");
    }

    #[test]
    fn initialize_selects_first_and_reset_clears() {
        let (store, _) = store();
        store.initialize_store(vec![conv("x"), conv("y")], vec![msg("m", "x")]);
        assert_eq!(store.selected_conversation_id().as_deref(), Some("x"));

        store.set_search_query("q");
        store.reset();
        assert_eq!(store.state(), MessageState::default());
    }

    #[test]
    fn persisted_round_trips_through_restore() {
        let (store, _) = store();
        store.initialize_store(vec![conv("a").with_unread_count(3), conv("b")], vec![]);
        store.set_selected_conversation(Some("b"));
        store.set_search_query("kofi");
        let saved = store.persisted();

        let (fresh, _) = self::store();
        fresh.initialize_store(vec![conv("a"), conv("b")], vec![]);
        fresh.restore(saved);

        assert_eq!(fresh.selected_conversation_id().as_deref(), Some("b"));
        assert_eq!(fresh.search_query(), "kofi");
        assert_eq!(fresh.conversation("a").unwrap().unread_count(), 3);
        assert!(!fresh.show_mobile_chat());
    }

    #[test]
    fn subscribers_hear_changes_but_not_noops() {
        let (store, _) = store();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let id = store.subscribe(move |change| {
            if *change == StoreChange::Messages {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        store.add_message(msg("m1", "c"));
        store.delete_message("nope");
        store.update_message("nope", MessagePatch::status(MessageStatus::Read));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert!(store.unsubscribe(id));
        store.add_message(msg("m2", "c"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    // ========================================================================
    // Field setters and timing
    // ========================================================================

    fn record(store: &MessageStore) -> Arc<Mutex<Vec<StoreChange>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        store.subscribe(move |change| sink.lock().unwrap().push(*change));
        log
    }

    #[test]
    fn set_is_loading_touches_only_status() {
        let (store, _) = store();
        store.initialize_store(vec![conv("a")], vec![msg("m1", "a")]);
        store.set_message_input("draft");
        let before = store.state();
        let changes = record(&store);

        store.set_is_loading(true);

        let after = store.state();
        assert!(after.is_loading);
        assert_eq!(MessageState { is_loading: false, ..after }, before);
        assert_eq!(*changes.lock().unwrap(), vec![StoreChange::Status]);
    }

    #[test]
    fn clear_message_input_touches_only_input() {
        let (store, _) = store();
        store.initialize_store(vec![conv("a")], vec![]);
        store.set_message_input("Is it still there?");
        let before = store.state();
        let changes = record(&store);

        store.clear_message_input();

        let after = store.state();
        assert_eq!(after.message_input, "");
        assert_eq!(
            MessageState {
                message_input: before.message_input.clone(),
                ..after
            },
            before
        );
        assert_eq!(*changes.lock().unwrap(), vec![StoreChange::Input]);
    }

    #[test]
    fn set_conversations_keeps_selection_and_messages() {
        let (store, _) = store();
        store.initialize_store(vec![conv("a"), conv("b")], vec![msg("m1", "a"), msg("m2", "b")]);
        store.set_selected_conversation(Some("b"));
        let changes = record(&store);

        store.set_conversations(vec![conv("c")]);

        let ids: Vec<String> = store.conversations().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["c"]);
        assert_eq!(store.selected_conversation_id().as_deref(), Some("b"));
        assert_eq!(store.messages().len(), 2);
        assert_eq!(*changes.lock().unwrap(), vec![StoreChange::Conversations]);
    }

    #[test]
    fn timing_rejects_unordered_delays() {
        let ms = Duration::from_millis;
        assert!(matches!(
            DeliveryTiming::new(ms(1500), ms(500)),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(DeliveryTiming::new(ms(500), ms(500)).is_err());
        assert!(DeliveryTiming::new(Duration::ZERO, ms(500)).is_err());

        let timing = DeliveryTiming::new(ms(10), ms(20)).unwrap();
        assert_eq!(timing.delivered_after(), ms(10));
        assert_eq!(timing.read_after(), ms(20));
    }

    #[test]
    fn custom_timing_still_delivers_before_read() {
        let scheduler = Arc::new(ManualScheduler::new());
        let timing = DeliveryTiming::new(Duration::from_millis(10), Duration::from_millis(20)).unwrap();
        let store = MessageStore::with_timing(scheduler.clone(), timing);
        store.create_conversation(conv("conv-1"));

        let observed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&observed);
        let watched = store.clone();
        let id = store.subscribe(move |change| {
            if *change == StoreChange::Messages {
                if let Some(m) = watched.messages().first() {
                    sink.lock().unwrap().push(m.status);
                }
            }
        });

        store.send_message("conv-1", "Hi", "user-1");
        scheduler.advance(Duration::from_millis(9));
        assert_eq!(store.messages()[0].status, MessageStatus::Sent);
        scheduler.advance(Duration::from_secs(1));
        store.unsubscribe(id);

        assert_eq!(
            *observed.lock().unwrap(),
            vec![MessageStatus::Sent, MessageStatus::Delivered, MessageStatus::Read]
        );
    }

    /// Runs every task at once on its own thread, ignoring the delay.
    struct ThreadScheduler {
        threads: Mutex<Vec<std::thread::JoinHandle<()>>>,
    }

    impl Scheduler for ThreadScheduler {
        fn schedule(&self, _delay: Duration, task: Task) -> Result<TaskHandle, SchedulerError> {
            let handle = TaskHandle::new();
            let guard = handle.clone();
            self.threads.lock().unwrap().push(std::thread::spawn(move || {
                if guard.try_complete() {
                    task();
                }
            }));
            Ok(handle)
        }
    }

    #[test]
    fn immediate_transitions_find_the_committed_message() {
        let scheduler = Arc::new(ThreadScheduler {
            threads: Mutex::new(Vec::new()),
        });
        let store = MessageStore::new(scheduler.clone());
        store.create_conversation(conv("conv-1"));

        store.send_message("conv-1", "Hi", "user-1");
        for thread in scheduler.threads.lock().unwrap().drain(..) {
            thread.join().unwrap();
        }

        assert_eq!(store.messages()[0].status, MessageStatus::Read);
    }
}
