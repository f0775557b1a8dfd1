use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::config::DEFAULT_CONVERSATION_NAME;
use crate::models::{self, Conversation, FileDescriptor, Message, PendingFile, Reference};
use crate::services::conversation::{self, derive_name, ConversationAction, ConversationState};
use crate::services::messages::{self, MessageAction, MessageState};
use crate::services::persistence::Persistence;
use crate::services::settings::AppSettings;

const SIMULATED_REPLY: &str = "I've reviewed the documents in your workspace. The agreement runs \
for twelve months with automatic renewal, payment is due within 30 days of invoice, and either \
party may terminate with 60 days written notice. Let me know if you want a closer look at any \
clause.";
const SIMULATED_REFERENCE_ID: &str = "doc-1";
const SIMULATED_REFERENCE_NAME: &str = "Service_Agreement_2024.pdf";
const SIMULATED_REFERENCE_TYPE: &str = "pdf";
const SIMULATED_QUICK_REPLIES: [&str; 2] = ["Summarize key terms", "Show related documents"];

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// State changes a UI layer re-renders from.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    ConversationsChanged,
    ActiveChanged(Option<String>),
    MessageAppended {
        conversation_id: String,
        message: Message,
    },
    TypingChanged(bool),
}

/// Replies scheduled for one conversation. They share a token so deleting
/// the conversation cancels all of them.
#[derive(Debug)]
struct PendingReplies {
    token: CancellationToken,
    count: usize,
}

#[derive(Debug, Default)]
struct ChatState {
    conversations: ConversationState,
    messages: MessageState,
    staged_files: Vec<PendingFile>,
    pending: HashMap<String, PendingReplies>,
}

impl ChatState {
    fn apply_conversations(&mut self, action: ConversationAction) {
        let state = std::mem::take(&mut self.conversations);
        self.conversations = conversation::reduce(state, action);
    }

    fn apply_messages(&mut self, action: MessageAction) {
        let state = std::mem::take(&mut self.messages);
        self.messages = messages::reduce(state, action);
    }

    fn is_typing(&self) -> bool {
        self.pending.values().any(|p| p.count > 0)
    }

    fn message_snapshot(&self, conversation_id: &str) -> Vec<Message> {
        self.messages
            .get(conversation_id)
            .map(<[Message]>::to_vec)
            .unwrap_or_default()
    }
}

struct Inner {
    persistence: Persistence,
    state: Mutex<ChatState>,
    /// Held from taking a snapshot until it is written, so storage sees
    /// snapshots in the order they were taken.
    writes: tokio::sync::Mutex<()>,
    events: broadcast::Sender<ChatEvent>,
    reply_delay: Duration,
    shutdown: CancellationToken,
}

/// Conversation and message bookkeeping for the assistant chat view.
///
/// Every mutation is applied in memory first and then written through to
/// [`Persistence`] while holding the write lock. The state lock is never
/// held across an `.await`.
#[derive(Clone)]
pub struct ChatService {
    inner: Arc<Inner>,
}

impl ChatService {
    pub fn new(persistence: Persistence, settings: &AppSettings) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(Inner {
                persistence,
                state: Mutex::new(ChatState::default()),
                writes: tokio::sync::Mutex::new(()),
                events,
                reply_delay: settings.reply_delay(),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.inner.events.subscribe()
    }

    fn state(&self) -> MutexGuard<'_, ChatState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: ChatEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }

    // --- Reads ---

    pub fn conversations(&self) -> Vec<Conversation> {
        self.state().conversations.conversations.clone()
    }

    pub fn active_id(&self) -> Option<String> {
        self.state().conversations.active_id.clone()
    }

    pub fn active_conversation(&self) -> Option<Conversation> {
        self.state().conversations.active().cloned()
    }

    /// In-memory messages for a conversation; empty if not loaded.
    pub fn messages(&self, conversation_id: &str) -> Vec<Message> {
        self.state().message_snapshot(conversation_id)
    }

    pub fn is_typing(&self) -> bool {
        self.state().is_typing()
    }

    pub fn staged_files(&self) -> Vec<FileDescriptor> {
        self.state()
            .staged_files
            .iter()
            .map(FileDescriptor::from)
            .collect()
    }

    // --- Conversations ---

    /// Read the persisted conversation list and install it.
    pub async fn load(&self) -> Result<(), ChatError> {
        let conversations = self.inner.persistence.load_conversations().await;
        tracing::info!("Loaded {} conversations", conversations.len());
        self.replace_all(conversations).await
    }

    pub async fn replace_all(&self, conversations: Vec<Conversation>) -> Result<(), ChatError> {
        let _write = self.inner.writes.lock().await;
        let (snapshot, active_id) = {
            let mut state = self.state();
            state.apply_conversations(ConversationAction::ReplaceAll(conversations));
            (
                state.conversations.conversations.clone(),
                state.conversations.active_id.clone(),
            )
        };
        self.emit(ChatEvent::ConversationsChanged);
        self.emit(ChatEvent::ActiveChanged(active_id.clone()));

        if let Some(id) = active_id {
            self.ensure_messages_loaded(&id).await;
        }
        self.persist_conversations(&snapshot).await
    }

    pub async fn new_conversation(&self) -> Result<Conversation, ChatError> {
        let conversation = Conversation::new(DEFAULT_CONVERSATION_NAME);
        let _write = self.inner.writes.lock().await;
        let snapshot = {
            let mut state = self.state();
            state.apply_conversations(ConversationAction::Add(conversation.clone()));
            state.apply_messages(MessageAction::Loaded {
                conversation_id: conversation.id.clone(),
                messages: Vec::new(),
            });
            state.conversations.conversations.clone()
        };
        tracing::debug!("Created conversation {}", conversation.id);
        self.emit(ChatEvent::ConversationsChanged);
        self.emit(ChatEvent::ActiveChanged(Some(conversation.id.clone())));

        self.persist_conversations(&snapshot).await?;
        Ok(conversation)
    }

    /// Make `id` active and return its messages. The id is not checked
    /// against the conversation list.
    pub async fn select_conversation(&self, id: &str) -> Vec<Message> {
        self.state()
            .apply_conversations(ConversationAction::Select(id.to_string()));
        self.emit(ChatEvent::ActiveChanged(Some(id.to_string())));

        self.ensure_messages_loaded(id).await;
        self.messages(id)
    }

    pub async fn rename_conversation(&self, id: &str, name: &str) -> Result<(), ChatError> {
        let _write = self.inner.writes.lock().await;
        let snapshot = {
            let mut state = self.state();
            state.apply_conversations(ConversationAction::Rename {
                id: id.to_string(),
                name: name.to_string(),
                updated_at: models::now_millis(),
            });
            state.conversations.conversations.clone()
        };
        self.emit(ChatEvent::ConversationsChanged);
        self.persist_conversations(&snapshot).await
    }

    /// Remove a conversation and its messages, cancelling any reply still
    /// pending for it.
    pub async fn delete_conversation(&self, id: &str) -> Result<(), ChatError> {
        let _write = self.inner.writes.lock().await;
        let (snapshot, active_id, typing_changed) = {
            let mut state = self.state();
            let was_typing = state.is_typing();
            if let Some(pending) = state.pending.remove(id) {
                tracing::debug!(
                    "Cancelling {} pending replies for {}",
                    pending.count,
                    id
                );
                pending.token.cancel();
            }
            state.apply_conversations(ConversationAction::Delete(id.to_string()));
            state.apply_messages(MessageAction::Clear(id.to_string()));
            (
                state.conversations.conversations.clone(),
                state.conversations.active_id.clone(),
                was_typing != state.is_typing(),
            )
        };
        self.emit(ChatEvent::ConversationsChanged);
        self.emit(ChatEvent::ActiveChanged(active_id.clone()));
        if typing_changed {
            self.emit(ChatEvent::TypingChanged(false));
        }

        if let Some(active) = active_id {
            self.ensure_messages_loaded(&active).await;
        }

        self.persist_conversations(&snapshot).await?;
        if let Err(e) = self.inner.persistence.clear_messages(id).await {
            tracing::error!("Failed to clear messages for {}: {}", id, e);
            return Err(e.into());
        }
        Ok(())
    }

    // --- Attachments ---

    pub fn stage_file(&self, file: PendingFile) {
        self.state().staged_files.push(file);
    }

    pub fn unstage_file(&self, name: &str) {
        self.state().staged_files.retain(|f| f.name != name);
    }

    // --- Sending ---

    /// Send a user message with the staged attachments to the active
    /// conversation, creating one if needed, and schedule the simulated
    /// assistant reply.
    pub async fn send_message(&self, content: &str) -> Result<Message, ChatError> {
        let _write = self.inner.writes.lock().await;

        let (conversation_id, files, created) = {
            let mut state = self.state();
            if content.trim().is_empty() && state.staged_files.is_empty() {
                return Err(ChatError::EmptyMessage);
            }
            let files = std::mem::take(&mut state.staged_files);

            match state.conversations.active().map(|c| c.id.clone()) {
                Some(id) => (id, files, false),
                None => {
                    let conversation = Conversation::new(derive_name(content));
                    let id = conversation.id.clone();
                    state.apply_conversations(ConversationAction::Add(conversation));
                    state.apply_messages(MessageAction::Loaded {
                        conversation_id: id.clone(),
                        messages: Vec::new(),
                    });
                    (id, files, true)
                }
            }
        };
        if created {
            tracing::debug!("Created conversation {} for first message", conversation_id);
        } else {
            self.ensure_messages_loaded(&conversation_id).await;
        }

        let descriptors: Vec<FileDescriptor> = files.iter().map(FileDescriptor::from).collect();
        let message = Message::user(content, descriptors);

        let (conversations, messages) = {
            let mut state = self.state();
            let now = models::now_millis();
            if state.messages.len(&conversation_id) == 0 {
                state.apply_conversations(ConversationAction::Rename {
                    id: conversation_id.clone(),
                    name: derive_name(content),
                    updated_at: now,
                });
            }
            state.apply_messages(MessageAction::Append {
                conversation_id: conversation_id.clone(),
                message: message.clone(),
            });
            state.apply_conversations(ConversationAction::Touch {
                id: conversation_id.clone(),
                updated_at: now,
            });
            (
                state.conversations.conversations.clone(),
                state.message_snapshot(&conversation_id),
            )
        };
        self.emit(ChatEvent::ConversationsChanged);
        self.emit(ChatEvent::ActiveChanged(Some(conversation_id.clone())));
        self.emit(ChatEvent::MessageAppended {
            conversation_id: conversation_id.clone(),
            message: message.clone(),
        });

        self.persist_conversations(&conversations).await?;
        self.persist_messages(&conversation_id, &messages).await?;

        self.schedule_reply(conversation_id);
        Ok(message)
    }

    fn schedule_reply(&self, conversation_id: String) {
        let token = {
            let mut state = self.state();
            let shutdown = &self.inner.shutdown;
            let pending = state
                .pending
                .entry(conversation_id.clone())
                .or_insert_with(|| PendingReplies {
                    token: shutdown.child_token(),
                    count: 0,
                });
            pending.count += 1;
            pending.token.clone()
        };
        self.emit(ChatEvent::TypingChanged(true));

        let service = self.clone();
        tokio::spawn(async move {
            service.run_reply(conversation_id, token).await;
        });
    }

    async fn run_reply(&self, conversation_id: String, token: CancellationToken) {
        tokio::select! {
            _ = token.cancelled() => {
                tracing::debug!("Reply for {} cancelled", conversation_id);
                return;
            }
            _ = tokio::time::sleep(self.inner.reply_delay) => {}
        }

        let reply = simulated_reply();
        let _write = self.inner.writes.lock().await;
        let (conversations, messages, typing) = {
            let mut state = self.state();
            // A delete cancels under the write lock, so a reply that gets
            // here uncancelled is written before any later delete.
            if token.is_cancelled() {
                return;
            }
            state.apply_messages(MessageAction::Append {
                conversation_id: conversation_id.clone(),
                message: reply.clone(),
            });
            state.apply_conversations(ConversationAction::Touch {
                id: conversation_id.clone(),
                updated_at: models::now_millis(),
            });
            if let Some(pending) = state.pending.get_mut(&conversation_id) {
                pending.count = pending.count.saturating_sub(1);
                if pending.count == 0 {
                    state.pending.remove(&conversation_id);
                }
            }
            (
                state.conversations.conversations.clone(),
                state.message_snapshot(&conversation_id),
                state.is_typing(),
            )
        };
        // Failures are already logged by the persist helpers
        let _ = self.persist_messages(&conversation_id, &messages).await;
        let _ = self.persist_conversations(&conversations).await;

        self.emit(ChatEvent::MessageAppended {
            conversation_id,
            message: reply,
        });
        self.emit(ChatEvent::ConversationsChanged);
        self.emit(ChatEvent::TypingChanged(typing));
    }

    /// Cancel every pending reply. Used when the session ends.
    pub fn shutdown(&self) {
        let had_pending = {
            let mut state = self.state();
            self.inner.shutdown.cancel();
            let had_pending = state.is_typing();
            state.pending.clear();
            had_pending
        };
        if had_pending {
            self.emit(ChatEvent::TypingChanged(false));
        }
    }

    // --- Persistence ---

    async fn ensure_messages_loaded(&self, conversation_id: &str) {
        if self.state().messages.is_loaded(conversation_id) {
            return;
        }
        let messages = self.inner.persistence.load_messages(conversation_id).await;
        self.state().apply_messages(MessageAction::Loaded {
            conversation_id: conversation_id.to_string(),
            messages,
        });
    }

    async fn persist_conversations(&self, conversations: &[Conversation]) -> Result<(), ChatError> {
        if let Err(e) = self.inner.persistence.save_conversations(conversations).await {
            tracing::error!("Failed to save conversations: {}", e);
            return Err(e.into());
        }
        Ok(())
    }

    async fn persist_messages(
        &self,
        conversation_id: &str,
        messages: &[Message],
    ) -> Result<(), ChatError> {
        if let Err(e) = self
            .inner
            .persistence
            .save_messages(conversation_id, messages)
            .await
        {
            tracing::error!("Failed to save messages for {}: {}", conversation_id, e);
            return Err(e.into());
        }
        Ok(())
    }
}

fn simulated_reply() -> Message {
    Message::ai(
        SIMULATED_REPLY,
        vec![Reference {
            id: SIMULATED_REFERENCE_ID.to_string(),
            name: SIMULATED_REFERENCE_NAME.to_string(),
            kind: SIMULATED_REFERENCE_TYPE.to_string(),
        }],
        SIMULATED_QUICK_REPLIES
            .iter()
            .map(|s| s.to_string())
            .collect(),
    )
}
