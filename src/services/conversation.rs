use crate::config::{FALLBACK_CONVERSATION_NAME, NAME_WORD_LIMIT};
use crate::models::Conversation;

/// The conversation list and which entry the chat view is showing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    pub conversations: Vec<Conversation>,
    pub active_id: Option<String>,
}

impl ConversationState {
    pub fn active(&self) -> Option<&Conversation> {
        let id = self.active_id.as_deref()?;
        self.get(id)
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }
}

#[derive(Debug, Clone)]
pub enum ConversationAction {
    /// Append and make active. Ids are not checked for duplicates.
    Add(Conversation),
    /// Make `id` active without checking that it exists.
    Select(String),
    Rename {
        id: String,
        name: String,
        updated_at: i64,
    },
    /// Refresh `updated_at` after a message was added.
    Touch { id: String, updated_at: i64 },
    Delete(String),
    ReplaceAll(Vec<Conversation>),
}

pub fn reduce(mut state: ConversationState, action: ConversationAction) -> ConversationState {
    match action {
        ConversationAction::Add(conversation) => {
            state.active_id = Some(conversation.id.clone());
            state.conversations.push(conversation);
        }
        ConversationAction::Select(id) => {
            state.active_id = Some(id);
        }
        ConversationAction::Rename {
            id,
            name,
            updated_at,
        } => {
            if let Some(conv) = state.conversations.iter_mut().find(|c| c.id == id) {
                conv.name = name;
                conv.updated_at = updated_at;
            }
        }
        ConversationAction::Touch { id, updated_at } => {
            if let Some(conv) = state.conversations.iter_mut().find(|c| c.id == id) {
                conv.updated_at = updated_at;
            }
        }
        ConversationAction::Delete(id) => {
            state.conversations.retain(|c| c.id != id);
            if state.active_id.as_deref() == Some(id.as_str()) {
                state.active_id = state.conversations.first().map(|c| c.id.clone());
            }
        }
        ConversationAction::ReplaceAll(conversations) => {
            if conversations.is_empty() {
                state.active_id = None;
            } else if state.active_id.is_none() {
                state.active_id = Some(conversations[0].id.clone());
            }
            state.conversations = conversations;
        }
    }
    state
}

/// Name a conversation after the opening words of its first message.
pub fn derive_name(content: &str) -> String {
    let words: Vec<String> = content
        .split_whitespace()
        .take(NAME_WORD_LIMIT)
        .map(capitalize)
        .collect();

    if words.is_empty() {
        FALLBACK_CONVERSATION_NAME.to_string()
    } else {
        words.join(" ")
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conv(id: &str) -> Conversation {
        Conversation {
            id: id.to_string(),
            name: format!("Conversation {}", id),
            created_at: 0,
            updated_at: 0,
        }
    }

    fn state_with(ids: &[&str], active: Option<&str>) -> ConversationState {
        ConversationState {
            conversations: ids.iter().map(|id| conv(id)).collect(),
            active_id: active.map(str::to_string),
        }
    }

    #[test]
    fn test_add_appends_and_activates() {
        let state = reduce(state_with(&["a"], Some("a")), ConversationAction::Add(conv("b")));
        assert_eq!(state.conversations.len(), 2);
        assert_eq!(state.conversations[1].id, "b");
        assert_eq!(state.active_id.as_deref(), Some("b"));
    }

    #[test]
    fn test_add_does_not_dedupe() {
        let state = reduce(state_with(&["a"], None), ConversationAction::Add(conv("a")));
        assert_eq!(state.conversations.len(), 2);
    }

    #[test]
    fn test_select_is_unconditional() {
        let state = reduce(
            state_with(&["a", "b"], Some("a")),
            ConversationAction::Select("missing".into()),
        );
        assert_eq!(state.active_id.as_deref(), Some("missing"));
        assert!(state.active().is_none());
    }

    #[test]
    fn test_rename_matching_and_missing() {
        let state = reduce(
            state_with(&["a", "b"], Some("a")),
            ConversationAction::Rename {
                id: "b".into(),
                name: "Budget".into(),
                updated_at: 42,
            },
        );
        let b = state.get("b").unwrap();
        assert_eq!(b.name, "Budget");
        assert_eq!(b.updated_at, 42);

        let unchanged = reduce(
            state.clone(),
            ConversationAction::Rename {
                id: "zzz".into(),
                name: "Nope".into(),
                updated_at: 99,
            },
        );
        assert_eq!(unchanged, state);
    }

    #[test]
    fn test_delete_active_promotes_first_remaining() {
        let state = reduce(
            state_with(&["a", "b", "c"], Some("b")),
            ConversationAction::Delete("b".into()),
        );
        assert_eq!(state.conversations.len(), 2);
        assert_eq!(state.active_id.as_deref(), Some("a"));
    }

    #[test]
    fn test_delete_inactive_keeps_active() {
        let state = reduce(
            state_with(&["a", "b", "c"], Some("c")),
            ConversationAction::Delete("a".into()),
        );
        assert_eq!(state.active_id.as_deref(), Some("c"));
        assert!(!state.contains("a"));
    }

    #[test]
    fn test_delete_only_conversation_clears_active() {
        let state = reduce(
            state_with(&["1"], Some("1")),
            ConversationAction::Delete("1".into()),
        );
        assert!(state.conversations.is_empty());
        assert!(state.active_id.is_none());
    }

    #[test]
    fn test_replace_all_sets_first_only_when_unset() {
        let fresh = reduce(
            ConversationState::default(),
            ConversationAction::ReplaceAll(vec![conv("x"), conv("y")]),
        );
        assert_eq!(fresh.active_id.as_deref(), Some("x"));

        let kept = reduce(
            state_with(&[], Some("y")),
            ConversationAction::ReplaceAll(vec![conv("x"), conv("y")]),
        );
        assert_eq!(kept.active_id.as_deref(), Some("y"));
    }

    #[test]
    fn test_replace_all_empty_is_idempotent() {
        let once = reduce(
            state_with(&["a"], Some("a")),
            ConversationAction::ReplaceAll(Vec::new()),
        );
        assert!(once.active_id.is_none());
        let twice = reduce(once, ConversationAction::ReplaceAll(Vec::new()));
        assert!(twice.active_id.is_none());
        assert!(twice.conversations.is_empty());
    }

    #[test]
    fn test_derive_name() {
        assert_eq!(
            derive_name("Can you summarize this contract please"),
            "Can You Summarize This"
        );
        assert_eq!(derive_name("  hello\n  world "), "Hello World");
        assert_eq!(derive_name("   "), "Chat");
        assert_eq!(derive_name(""), "Chat");
        assert_eq!(derive_name("éclair recipes"), "Éclair Recipes");
        assert_eq!(derive_name("keep rEST as is"), "Keep REST As Is");
    }
}
