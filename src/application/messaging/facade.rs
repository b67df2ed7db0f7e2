//! Messaging facade - derived views and intent handlers bound to one user

use crate::application::services::MessageStore;
use crate::domain::entities::{Conversation, ConversationSummary, Message, User};

/// Binds a current user to the message store.
///
/// Holds no state of its own: every view below is recomputed from the store
/// on each call.
#[derive(Clone)]
pub struct Messaging {
    store: MessageStore,
    current_user_id: String,
}

impl Messaging {
    pub fn new(store: MessageStore, current_user_id: impl Into<String>) -> Self {
        Self {
            store,
            current_user_id: current_user_id.into(),
        }
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn current_user_id(&self) -> &str {
        &self.current_user_id
    }

    // ====================================================================
    // Derived views
    // ====================================================================

    pub fn active_conversation(&self) -> Option<Conversation> {
        let id = self.store.selected_conversation_id()?;
        self.store.conversation(&id)
    }

    pub fn conversation_messages(&self) -> Vec<Message> {
        let id = self.store.selected_conversation_id().unwrap_or_default();
        self.store.conversation_messages(&id)
    }

    pub fn other_participant(&self) -> Option<User> {
        self.active_conversation()?
            .other_participant(&self.current_user_id)
            .cloned()
    }

    pub fn filtered_conversations(&self) -> Vec<Conversation> {
        self.store.filtered_conversations(&self.current_user_id)
    }

    pub fn total_unread_count(&self) -> u32 {
        self.store
            .conversations()
            .iter()
            .map(Conversation::unread_count)
            .sum()
    }

    pub fn unread_conversations(&self) -> Vec<Conversation> {
        self.store
            .conversations()
            .into_iter()
            .filter(Conversation::has_unread)
            .collect()
    }

    pub fn conversation_summary(&self, conversation_id: &str) -> Option<ConversationSummary> {
        self.store.conversation_summary(conversation_id)
    }

    // ====================================================================
    // Intent handlers
    // ====================================================================

    /// Select, open the chat view, then mark read, in that order.
    pub fn handle_select_conversation(&self, conversation_id: &str) {
        self.store.set_selected_conversation(Some(conversation_id));
        self.store.set_show_mobile_chat(true);
        self.store.mark_conversation_as_read(conversation_id);
    }

    /// Leave the chat view; the selection is kept.
    pub fn handle_back_to_list(&self) {
        self.store.set_show_mobile_chat(false);
    }

    pub fn handle_send_message(&self, content: &str) {
        let Some(conversation_id) = self.store.selected_conversation_id() else {
            tracing::debug!("handle_send_message: no conversation selected");
            return;
        };
        if content.trim().is_empty() {
            return;
        }
        self.store
            .send_message(&conversation_id, content, &self.current_user_id);
    }

    pub fn handle_create_conversation(&self, conversation: Conversation) {
        let id = conversation.id.clone();
        self.store.create_conversation(conversation);
        self.store.set_selected_conversation(Some(&id));
    }

    /// Inbound message; read straight away if its conversation is open.
    pub fn handle_incoming_message(&self, message: Message) {
        let conversation_id = message.conversation_id.clone();
        self.store.receive_message(message);
        if self.store.selected_conversation_id().as_deref() == Some(conversation_id.as_str()) {
            self.store.mark_conversation_as_read(&conversation_id);
        }
    }

    pub fn handle_delete_conversation(&self, conversation_id: &str) {
        self.store.delete_conversation(conversation_id);
    }

    pub fn handle_delete_message(&self, message_id: &str) {
        self.store.delete_message(message_id);
    }

    pub fn handle_search_change(&self, query: &str) {
        self.store.set_search_query(query);
    }

    pub fn handle_input_change(&self, input: &str) {
        self.store.set_message_input(input);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::MessageStatus;
    use crate::infrastructure::scheduler::ManualScheduler;
    use std::sync::Arc;
    use std::time::Duration;

    fn kwame() -> User {
        User::new("user-1", "Kwame Asante")
    }

    fn messaging() -> (Messaging, Arc<ManualScheduler>) {
        let scheduler = Arc::new(ManualScheduler::new());
        let store = MessageStore::new(scheduler.clone());
        store.initialize_store(
            vec![
                Conversation::new("conv-1")
                    .with_participants(vec![kwame(), User::new("user-2", "Ama Serwaa")]),
                Conversation::new("conv-2")
                    .with_participants(vec![kwame(), User::new("user-3", "Kofi Mensah")])
                    .with_unread_count(2),
            ],
            vec![],
        );
        store.set_selected_conversation(None);
        (Messaging::new(store, "user-1"), scheduler)
    }

    #[test]
    fn select_marks_read_and_opens_chat() {
        let (m, _) = messaging();
        assert_eq!(m.total_unread_count(), 2);

        m.handle_select_conversation("conv-2");

        assert_eq!(m.active_conversation().unwrap().id, "conv-2");
        assert_eq!(m.other_participant().unwrap().name, "Kofi Mensah");
        assert!(m.store().show_mobile_chat());
        assert_eq!(m.total_unread_count(), 0);
        assert!(m.unread_conversations().is_empty());
    }

    #[test]
    fn back_to_list_keeps_selection() {
        let (m, _) = messaging();
        m.handle_select_conversation("conv-1");
        m.handle_back_to_list();

        assert!(!m.store().show_mobile_chat());
        assert_eq!(m.store().selected_conversation_id().as_deref(), Some("conv-1"));
    }

    #[test]
    fn send_requires_selection_and_content() {
        let (m, _) = messaging();
        m.handle_send_message("hello");
        assert!(m.store().messages().is_empty());

        m.handle_select_conversation("conv-1");
        m.handle_send_message("  \t ");
        assert!(m.store().messages().is_empty());

        m.handle_send_message("hello");
        let sent = m.conversation_messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].sender_id, "user-1");
        assert_eq!(sent[0].conversation_id, "conv-1");
    }

    #[test]
    fn sent_message_progresses_through_statuses() {
        let (m, scheduler) = messaging();
        m.handle_select_conversation("conv-1");
        m.handle_send_message("Is the ID card still with you?");

        let status = || m.conversation_messages()[0].status;
        assert_eq!(status(), MessageStatus::Sent);
        scheduler.advance(Duration::from_millis(500));
        assert_eq!(status(), MessageStatus::Delivered);
        scheduler.advance(Duration::from_millis(1000));
        assert_eq!(status(), MessageStatus::Read);
    }

    #[test]
    fn create_conversation_selects_it() {
        let (m, _) = messaging();
        m.handle_create_conversation(Conversation::new("conv-3"));

        assert_eq!(m.store().conversations()[0].id, "conv-3");
        assert_eq!(m.active_conversation().unwrap().id, "conv-3");
        assert!(m.conversation_messages().is_empty());
        assert!(m.other_participant().is_none());
    }

    #[test]
    fn incoming_counts_unless_open() {
        let (m, _) = messaging();
        m.handle_select_conversation("conv-1");

        m.handle_incoming_message(Message::new("conv-1", "user-2", "Come by at 4pm"));
        m.handle_incoming_message(Message::new("conv-2", "user-3", "Any news?"));

        assert_eq!(m.store().conversation("conv-1").unwrap().unread_count(), 0);
        assert_eq!(m.store().conversation("conv-2").unwrap().unread_count(), 3);
        assert_eq!(m.unread_conversations().len(), 1);
    }

    #[test]
    fn search_narrows_filtered_view() {
        let (m, _) = messaging();
        m.handle_search_change("KOFI");
        let found = m.filtered_conversations();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "conv-2");

        m.handle_search_change("");
        assert_eq!(m.filtered_conversations().len(), 2);
    }

    #[test]
    fn thin_delegations_reach_store() {
        let (m, _) = messaging();
        m.handle_input_change("draft");
        assert_eq!(m.store().message_input(), "draft");

        m.store().add_message(Message::new("conv-1", "user-1", "x").with_id("m-1"));
        m.handle_delete_message("m-1");
        assert!(m.store().messages().is_empty());

        m.handle_delete_conversation("conv-1");
        assert_eq!(m.store().conversations().len(), 1);
    }

    #[test]
    fn no_selection_yields_empty_views() {
        let (m, _) = messaging();
        assert!(m.active_conversation().is_none());
        assert!(m.other_participant().is_none());
        assert!(m.conversation_messages().is_empty());
    }
}
