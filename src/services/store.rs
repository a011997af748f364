use crate::models::{Conversation, Message, Role};

/// Titles keep this many characters of the first user message.
pub const TITLE_MAX_CHARS: usize = 30;

/// In-memory list of conversations, newest first, plus the active pointer.
///
/// The store never touches disk or network; callers that want durability
/// mirror mutations into [`crate::services::history::HistoryDatabase`].
#[derive(Debug, Default)]
pub struct ConversationStore {
    conversations: Vec<Conversation>,
    active_id: Option<String>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append saved conversations behind the ones created this session,
    /// skipping any id the store already holds.
    pub fn merge_saved(&mut self, saved: Vec<Conversation>) {
        for conv in saved {
            if self.get(&conv.id).is_none() {
                self.conversations.push(conv);
            }
        }
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    /// The active conversation, if the pointer names one that still exists.
    pub fn active(&self) -> Option<&Conversation> {
        self.active_id.as_deref().and_then(|id| self.get(id))
    }

    /// Insert a fresh conversation at the head of the list and make it active.
    pub fn create_conversation(&mut self) -> &Conversation {
        let conversation = Conversation::new();
        self.active_id = Some(conversation.id.clone());
        self.conversations.insert(0, conversation);
        &self.conversations[0]
    }

    /// Append to the conversation's transcript. Unknown ids are ignored.
    ///
    /// Returns the conversation's new title when this append renamed it.
    pub fn append_message(&mut self, conversation_id: &str, message: Message) -> Option<String> {
        let Some(conv) = self
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
        else {
            tracing::debug!(
                "Dropping message {} for unknown conversation {}",
                message.id,
                conversation_id
            );
            return None;
        };

        let renamed = if conv.messages.is_empty() && message.role == Role::User {
            conv.title = truncate_title(&message.content);
            Some(conv.title.clone())
        } else {
            None
        };

        conv.messages.push(message);
        renamed
    }

    /// Remove a conversation. Clears the active pointer when it pointed here.
    pub fn delete_conversation(&mut self, id: &str) -> bool {
        let before = self.conversations.len();
        self.conversations.retain(|c| c.id != id);
        if self.active_id.as_deref() == Some(id) {
            self.active_id = None;
        }
        self.conversations.len() != before
    }

    pub fn set_active(&mut self, id: Option<String>) {
        self.active_id = id;
    }
}

/// First [`TITLE_MAX_CHARS`] characters of `text`, with `...` appended when
/// anything was cut off.
pub fn truncate_title(text: &str) -> String {
    match text.char_indices().nth(TITLE_MAX_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
