use std::collections::HashMap;

use crate::models::Message;

/// Message lists keyed by conversation id. A missing entry means the list
/// has not been loaded yet, or was cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageState {
    lists: HashMap<String, Vec<Message>>,
}

impl MessageState {
    pub fn get(&self, conversation_id: &str) -> Option<&[Message]> {
        self.lists.get(conversation_id).map(Vec::as_slice)
    }

    pub fn is_loaded(&self, conversation_id: &str) -> bool {
        self.lists.contains_key(conversation_id)
    }

    pub fn len(&self, conversation_id: &str) -> usize {
        self.lists.get(conversation_id).map_or(0, Vec::len)
    }
}

#[derive(Debug, Clone)]
pub enum MessageAction {
    /// Install a list read from storage. Ignored if the list is already in
    /// memory, since memory is never older than storage.
    Loaded {
        conversation_id: String,
        messages: Vec<Message>,
    },
    Append {
        conversation_id: String,
        message: Message,
    },
    Clear(String),
}

pub fn reduce(mut state: MessageState, action: MessageAction) -> MessageState {
    match action {
        MessageAction::Loaded {
            conversation_id,
            messages,
        } => {
            state.lists.entry(conversation_id).or_insert(messages);
        }
        MessageAction::Append {
            conversation_id,
            message,
        } => {
            state.lists.entry(conversation_id).or_default().push(message);
        }
        MessageAction::Clear(conversation_id) => {
            state.lists.remove(&conversation_id);
        }
    }
    state
}
