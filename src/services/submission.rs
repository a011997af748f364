use tokio_util::sync::CancellationToken;

use crate::backend::{BackendError, ChatBackend, ChatReply, ChatRequest};
use crate::models::Message;
use crate::services::store::ConversationStore;

/// Shown in place of a reply whenever the backend cannot answer.
pub const FALLBACK_REPLY: &str = "Maaf, terjadi kesalahan. Silakan coba lagi.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmissionState {
    #[default]
    Idle,
    Sending,
}

/// The in-flight half of a submission, handed to the network task.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub conversation_id: String,
    pub text: String,
    /// The optimistically appended user message.
    pub user_message: Message,
    /// Set when the user message also renamed the conversation.
    pub new_title: Option<String>,
    pub cancel_token: CancellationToken,
}

#[derive(Debug)]
pub enum Outcome {
    Replied {
        conversation_id: String,
        reply: ChatReply,
    },
    Failed {
        conversation_id: String,
        error: BackendError,
    },
    Cancelled {
        conversation_id: String,
    },
}

/// Single-flight send state for one chat surface.
///
/// `begin` guards and appends the user message, `dispatch` performs the
/// request off the UI thread, and `finish` appends the assistant message.
#[derive(Debug, Default)]
pub struct ChatFlow {
    state: SubmissionState,
    in_flight: Option<(String, CancellationToken)>,
}

impl ChatFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn is_sending(&self) -> bool {
        self.state == SubmissionState::Sending
    }

    /// Conversation that owns the pending request, if any.
    pub fn in_flight_conversation(&self) -> Option<&str> {
        self.in_flight.as_ref().map(|(id, _)| id.as_str())
    }

    /// Start a submission. Returns `None`, touching nothing, when the input
    /// is blank, no conversation is active, or a request is already pending.
    pub fn begin(&mut self, store: &mut ConversationStore, input: &str) -> Option<Dispatch> {
        if self.is_sending() {
            tracing::debug!("Ignoring send while a request is in flight");
            return None;
        }

        let text = input.trim();
        if text.is_empty() {
            return None;
        }

        let conversation_id = store.active()?.id.clone();

        let user_message = Message::user(text);
        let new_title = store.append_message(&conversation_id, user_message.clone());

        let cancel_token = CancellationToken::new();
        self.state = SubmissionState::Sending;
        self.in_flight = Some((conversation_id.clone(), cancel_token.clone()));

        tracing::info!("Sending message in conversation {}", conversation_id);

        Some(Dispatch {
            conversation_id,
            text: text.to_string(),
            user_message,
            new_title,
            cancel_token,
        })
    }

    /// Run the network call for a dispatch. No timeout beyond what the
    /// backend itself applies; resolves early only when cancelled.
    pub async fn dispatch(backend: &dyn ChatBackend, dispatch: Dispatch) -> Outcome {
        let Dispatch {
            conversation_id,
            text,
            cancel_token,
            ..
        } = dispatch;

        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => Outcome::Cancelled { conversation_id },
            result = backend.send_message(ChatRequest { message: text }) => match result {
                Ok(reply) => Outcome::Replied { conversation_id, reply },
                Err(error) => Outcome::Failed { conversation_id, error },
            },
        }
    }

    /// Settle the pending submission and return to idle.
    ///
    /// Returns the appended assistant message together with its conversation
    /// id, or `None` when nothing was appended (cancelled, or the
    /// conversation no longer exists).
    pub fn finish(
        &mut self,
        store: &mut ConversationStore,
        outcome: Outcome,
    ) -> Option<(String, Message)> {
        self.state = SubmissionState::Idle;
        self.in_flight = None;

        let (conversation_id, message) = match outcome {
            Outcome::Replied {
                conversation_id,
                reply,
            } => {
                let message = Message::assistant(reply.reply, reply.files, reply.folder_url);
                (conversation_id, message)
            }
            Outcome::Failed {
                conversation_id,
                error,
            } => {
                tracing::warn!("Chat request failed: {}", error);
                (conversation_id, Message::assistant(FALLBACK_REPLY, Vec::new(), None))
            }
            Outcome::Cancelled { conversation_id } => {
                tracing::info!("Request for conversation {} was cancelled", conversation_id);
                return None;
            }
        };

        store.get(&conversation_id)?;
        store.append_message(&conversation_id, message.clone());
        Some((conversation_id, message))
    }

    /// Cancel the pending request if it belongs to `conversation_id`. The
    /// flow stays in `Sending` until the cancelled outcome is finished.
    pub fn cancel_for(&mut self, conversation_id: &str) -> bool {
        match &self.in_flight {
            Some((id, token)) if id == conversation_id => {
                token.cancel();
                true
            }
            _ => false,
        }
    }

    /// `begin`, `dispatch` and `finish` in one go.
    pub async fn submit(
        &mut self,
        store: &mut ConversationStore,
        backend: &dyn ChatBackend,
        input: &str,
    ) -> Option<(String, Message)> {
        let dispatch = self.begin(store, input)?;
        let outcome = Self::dispatch(backend, dispatch).await;
        self.finish(store, outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::backend::HealthStatus;
    use crate::models::{FileRef, Role};

    /// Returns canned results in order and records every request.
    #[derive(Default)]
    struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<ChatReply, BackendError>>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedBackend {
        fn with(result: Result<ChatReply, BackendError>) -> Self {
            let backend = Self::default();
            backend.replies.lock().unwrap().push_back(result);
            backend
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn send_message(&self, request: ChatRequest) -> Result<ChatReply, BackendError> {
            self.requests.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(BackendError::Network("no scripted reply".to_string())))
        }

        async fn health(&self) -> Result<HealthStatus, BackendError> {
            Ok(HealthStatus {
                status: "online".to_string(),
                ai_ready: true,
                mode: None,
            })
        }
    }

    /// Never answers.
    struct HangingBackend;

    #[async_trait]
    impl ChatBackend for HangingBackend {
        async fn send_message(&self, _request: ChatRequest) -> Result<ChatReply, BackendError> {
            std::future::pending().await
        }

        async fn health(&self) -> Result<HealthStatus, BackendError> {
            std::future::pending().await
        }
    }

    fn reply(text: &str) -> ChatReply {
        ChatReply {
            reply: text.to_string(),
            files: Vec::new(),
            folder_url: None,
        }
    }

    #[tokio::test]
    async fn test_successful_send_appends_user_then_assistant() {
        let mut store = ConversationStore::new();
        let id = store.create_conversation().id.clone();
        let backend = ScriptedBackend::with(Ok(reply("X")));
        let mut flow = ChatFlow::new();

        let appended = flow.submit(&mut store, &backend, "UU ketenagakerjaan").await;

        let conv = store.get(&id).unwrap();
        assert_eq!(conv.messages.len(), 2);
        assert_eq!(conv.messages[0].role, Role::User);
        assert_eq!(conv.messages[0].content, "UU ketenagakerjaan");
        assert_eq!(conv.messages[1].role, Role::Assistant);
        assert_eq!(conv.messages[1].content, "X");
        assert!(conv.messages[1].files.is_empty());
        assert_eq!(conv.messages[1].folder_url, None);
        assert_eq!(appended.map(|(cid, m)| (cid, m.content)), Some((id, "X".to_string())));
        assert_eq!(flow.state(), SubmissionState::Idle);
        assert_eq!(
            backend.requests.lock().unwrap()[0],
            ChatRequest {
                message: "UU ketenagakerjaan".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_reply_files_and_folder_are_kept() {
        let mut store = ConversationStore::new();
        let id = store.create_conversation().id.clone();
        let file = FileRef {
            filename: "UU_13_2003.pdf".to_string(),
            gdrive_url: "https://drive.google.com/file/d/u13/view".to_string(),
            gdrive_id: "u13".to_string(),
            preview: None,
        };
        let backend = ScriptedBackend::with(Ok(ChatReply {
            reply: "Saya menemukan 1 dokumen yang cocok: UU_13_2003.pdf".to_string(),
            files: vec![file.clone()],
            folder_url: Some("https://drive.google.com/drive/folders/root".to_string()),
        }));
        let mut flow = ChatFlow::new();

        flow.submit(&mut store, &backend, "ketenagakerjaan").await;

        let assistant = &store.get(&id).unwrap().messages[1];
        assert_eq!(assistant.files, vec![file]);
        assert_eq!(
            assistant.folder_url.as_deref(),
            Some("https://drive.google.com/drive/folders/root")
        );
    }

    #[tokio::test]
    async fn test_failure_appends_fallback() {
        let mut store = ConversationStore::new();
        let id = store.create_conversation().id.clone();
        let backend = ScriptedBackend::with(Err(BackendError::Status(500)));
        let mut flow = ChatFlow::new();

        flow.submit(&mut store, &backend, "halo").await;

        let conv = store.get(&id).unwrap();
        assert_eq!(conv.messages.len(), 2);
        assert_eq!(conv.messages[1].role, Role::Assistant);
        assert_eq!(conv.messages[1].content, FALLBACK_REPLY);
        assert!(conv.messages[1].files.is_empty());
        assert_eq!(flow.state(), SubmissionState::Idle);
    }

    #[tokio::test]
    async fn test_transport_failure_uses_same_fallback() {
        let mut store = ConversationStore::new();
        let id = store.create_conversation().id.clone();
        let backend = ScriptedBackend::with(Err(BackendError::Network("refused".to_string())));
        let mut flow = ChatFlow::new();

        flow.submit(&mut store, &backend, "halo").await;
        assert_eq!(store.get(&id).unwrap().messages[1].content, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_blank_input_or_no_active_conversation_is_ignored() {
        let backend = ScriptedBackend::default();
        let mut flow = ChatFlow::new();

        let mut store = ConversationStore::new();
        assert!(flow.submit(&mut store, &backend, "halo").await.is_none());
        assert!(store.conversations().is_empty());

        let id = store.create_conversation().id.clone();
        assert!(flow.submit(&mut store, &backend, "").await.is_none());
        assert!(flow.submit(&mut store, &backend, "   \n\t").await.is_none());
        assert!(store.get(&id).unwrap().messages.is_empty());

        store.set_active(None);
        assert!(flow.submit(&mut store, &backend, "halo").await.is_none());
        assert!(store.get(&id).unwrap().messages.is_empty());

        assert_eq!(backend.request_count(), 0);
        assert_eq!(flow.state(), SubmissionState::Idle);
    }

    #[test]
    fn test_input_is_trimmed_and_title_reported() {
        let mut store = ConversationStore::new();
        let id = store.create_conversation().id.clone();
        let mut flow = ChatFlow::new();

        let dispatch = flow.begin(&mut store, "  pasal 33 UUD 1945 \n").unwrap();
        assert_eq!(dispatch.text, "pasal 33 UUD 1945");
        assert_eq!(dispatch.user_message.content, "pasal 33 UUD 1945");
        assert_eq!(dispatch.new_title.as_deref(), Some("pasal 33 UUD 1945"));
        assert_eq!(dispatch.conversation_id, id);
        assert_eq!(store.get(&id).unwrap().messages.len(), 1);
        assert!(flow.is_sending());
    }

    #[test]
    fn test_second_send_while_sending_is_suppressed() {
        let mut store = ConversationStore::new();
        let id = store.create_conversation().id.clone();
        let mut flow = ChatFlow::new();

        assert!(flow.begin(&mut store, "pertama").is_some());
        assert!(flow.begin(&mut store, "kedua").is_none());
        assert_eq!(store.get(&id).unwrap().messages.len(), 1);
        assert_eq!(flow.in_flight_conversation(), Some(id.as_str()));
    }

    #[tokio::test]
    async fn test_deleting_conversation_cancels_request() {
        let mut store = ConversationStore::new();
        let id = store.create_conversation().id.clone();
        let mut flow = ChatFlow::new();

        let dispatch = flow.begin(&mut store, "halo").unwrap();
        let task = tokio::spawn(async move { ChatFlow::dispatch(&HangingBackend, dispatch).await });

        assert!(!flow.cancel_for("another"));
        store.delete_conversation(&id);
        assert!(flow.cancel_for(&id));

        let outcome = task.await.unwrap();
        assert!(matches!(outcome, Outcome::Cancelled { .. }));
        assert!(flow.finish(&mut store, outcome).is_none());
        assert_eq!(flow.state(), SubmissionState::Idle);
        assert!(store.conversations().is_empty());
    }

    #[test]
    fn test_reply_for_deleted_conversation_is_dropped() {
        let mut store = ConversationStore::new();
        let id = store.create_conversation().id.clone();
        let other = store.create_conversation().id.clone();
        store.set_active(Some(id.clone()));
        let mut flow = ChatFlow::new();

        flow.begin(&mut store, "halo").unwrap();
        store.delete_conversation(&id);

        let appended = flow.finish(
            &mut store,
            Outcome::Replied {
                conversation_id: id,
                reply: reply("terlambat"),
            },
        );
        assert!(appended.is_none());
        assert!(store.get(&other).unwrap().messages.is_empty());
        assert!(!flow.is_sending());
    }

    #[test]
    fn test_reply_lands_in_sending_conversation_after_switch() {
        let mut store = ConversationStore::new();
        let first = store.create_conversation().id.clone();
        let mut flow = ChatFlow::new();

        flow.begin(&mut store, "halo").unwrap();
        let second = store.create_conversation().id.clone();

        let appended = flow.finish(
            &mut store,
            Outcome::Replied {
                conversation_id: first.clone(),
                reply: reply("jawaban"),
            },
        );
        assert_eq!(appended.map(|(cid, _)| cid), Some(first.clone()));
        assert_eq!(store.get(&first).unwrap().messages.len(), 2);
        assert!(store.get(&second).unwrap().messages.is_empty());
    }
}
