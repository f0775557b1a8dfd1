use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{messages_key, CONVERSATIONS_KEY, MESSAGES_KEY_PREFIX};
use crate::models::{Conversation, Message};
use crate::services::storage::Storage;

/// Decode a stored JSON value, falling back to `default` when the key is
/// missing or the value does not parse as `T`.
pub fn parse_or_default<T, F>(key: &str, raw: Option<&str>, default: F) -> T
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    let Some(raw) = raw else {
        return default();
    };
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Discarding malformed value under {}: {}", key, e);
            default()
        }
    }
}

/// Reads and writes conversations and message lists through [`Storage`].
/// Every write replaces the whole value stored under its key.
#[derive(Debug, Clone)]
pub struct Persistence {
    storage: Storage,
}

impl Persistence {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub async fn load_json<T, F>(&self, key: &str, default: F) -> T
    where
        T: DeserializeOwned,
        F: FnOnce() -> T,
    {
        match self.storage.get_item(key).await {
            Ok(raw) => parse_or_default(key, raw.as_deref(), default),
            Err(e) => {
                tracing::error!("Failed to read {}: {}", key, e);
                default()
            }
        }
    }

    pub async fn save_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.storage.set_item(key, &json).await
    }

    pub async fn load_conversations(&self) -> Vec<Conversation> {
        self.load_json(CONVERSATIONS_KEY, || vec![Conversation::default_seed()])
            .await
    }

    pub async fn save_conversations(&self, conversations: &[Conversation]) -> Result<()> {
        self.save_json(CONVERSATIONS_KEY, conversations).await
    }

    pub async fn load_messages(&self, conversation_id: &str) -> Vec<Message> {
        self.load_json(&messages_key(conversation_id), Vec::new).await
    }

    pub async fn save_messages(&self, conversation_id: &str, messages: &[Message]) -> Result<()> {
        self.save_json(&messages_key(conversation_id), messages).await
    }

    pub async fn clear_messages(&self, conversation_id: &str) -> Result<()> {
        self.storage.remove_item(&messages_key(conversation_id)).await
    }

    /// Ids of every conversation that has a persisted message list.
    pub async fn message_list_ids(&self) -> Result<Vec<String>> {
        let keys = self.storage.keys_with_prefix(MESSAGES_KEY_PREFIX).await?;
        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(MESSAGES_KEY_PREFIX).map(str::to_string))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CONVERSATION_ID;
    use crate::models::{FileDescriptor, Reference};

    fn persistence() -> Persistence {
        Persistence::new(Storage::new_in_memory().unwrap())
    }

    #[test]
    fn test_parse_or_default_falls_back() {
        let missing: Vec<u32> = parse_or_default("k", None, || vec![7]);
        assert_eq!(missing, vec![7]);

        let broken: Vec<u32> = parse_or_default("k", Some("{not json"), || vec![7]);
        assert_eq!(broken, vec![7]);

        let wrong_shape: Vec<u32> = parse_or_default("k", Some("{\"a\":1}"), Vec::new);
        assert!(wrong_shape.is_empty());

        let ok: Vec<u32> = parse_or_default("k", Some("[1,2]"), Vec::new);
        assert_eq!(ok, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_conversations_round_trip() {
        let p = persistence();
        let conversations = vec![Conversation::new("First"), Conversation::new("Second")];

        p.save_conversations(&conversations).await.unwrap();
        assert_eq!(p.load_conversations().await, conversations);
    }

    #[tokio::test]
    async fn test_missing_or_corrupt_conversations_yield_seed() {
        let p = persistence();
        let loaded = p.load_conversations().await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, DEFAULT_CONVERSATION_ID);

        p.storage().set_item(CONVERSATIONS_KEY, "][").await.unwrap();
        let loaded = p.load_conversations().await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, DEFAULT_CONVERSATION_ID);
    }

    #[tokio::test]
    async fn test_empty_conversation_list_is_kept() {
        let p = persistence();
        p.save_conversations(&[]).await.unwrap();
        assert!(p.load_conversations().await.is_empty());
    }

    #[tokio::test]
    async fn test_messages_round_trip_and_unknown_id() {
        let p = persistence();
        let reply = Message::ai(
            "Here you go",
            vec![Reference {
                id: "doc-1".into(),
                name: "Lease.pdf".into(),
                kind: "pdf".into(),
            }],
            vec!["More".into()],
        );
        let messages = vec![
            Message::user(
                "Hello",
                vec![FileDescriptor {
                    name: "a.txt".into(),
                    size: "12".into(),
                    mime_type: "text/plain".into(),
                }],
            ),
            reply,
        ];

        p.save_messages("c1", &messages).await.unwrap();
        assert_eq!(p.load_messages("c1").await, messages);
        assert!(p.load_messages("never-saved").await.is_empty());

        p.clear_messages("c1").await.unwrap();
        assert!(p.load_messages("c1").await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_messages_yield_empty() {
        let p = persistence();
        p.storage()
            .set_item(&messages_key("c1"), "not json")
            .await
            .unwrap();
        assert!(p.load_messages("c1").await.is_empty());
    }

    #[tokio::test]
    async fn test_wire_format_uses_camel_case_and_omits_absent_fields() {
        let p = persistence();
        let mut message = Message::user("Hi", Vec::new());
        message.id = "m1".into();
        message.timestamp = 5;
        p.save_messages("c1", &[message]).await.unwrap();

        let raw = p.storage().get_item(&messages_key("c1")).await.unwrap().unwrap();
        assert_eq!(
            raw,
            r#"[{"id":"m1","type":"user","content":"Hi","timestamp":5}]"#
        );

        let conversation = Conversation {
            id: "c1".into(),
            name: "Chat".into(),
            created_at: 1,
            updated_at: 2,
        };
        p.save_conversations(&[conversation]).await.unwrap();
        let raw = p.storage().get_item(CONVERSATIONS_KEY).await.unwrap().unwrap();
        assert_eq!(
            raw,
            r#"[{"id":"c1","name":"Chat","createdAt":1,"updatedAt":2}]"#
        );
    }

    #[tokio::test]
    async fn test_message_list_ids() {
        let p = persistence();
        p.save_messages("a", &[]).await.unwrap();
        p.save_messages("b", &[]).await.unwrap();
        assert_eq!(p.message_list_ids().await.unwrap(), vec!["a", "b"]);
    }
}
