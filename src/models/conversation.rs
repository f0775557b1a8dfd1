use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_CONVERSATION_ID, DEFAULT_CONVERSATION_NAME};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub name: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds, refreshed whenever the conversation or its messages change.
    pub updated_at: i64,
}

impl Conversation {
    pub fn new(name: impl Into<String>) -> Self {
        let now = super::now_millis();
        Self {
            id: super::new_id(),
            name: name.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The conversation seeded when nothing usable is persisted.
    pub fn default_seed() -> Self {
        let now = super::now_millis();
        Self {
            id: DEFAULT_CONVERSATION_ID.to_string(),
            name: DEFAULT_CONVERSATION_NAME.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}
