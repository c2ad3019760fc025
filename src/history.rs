//! Per-user chat history.
//!
//! A [`ChatRecord`] is written once after a successful translation and never
//! changed afterwards. Stores hand records back newest first.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Number of characters of the source text kept in a title.
pub const TITLE_MAX_CHARS: usize = 30;

/// One persisted exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChatRecord {
    pub id: Uuid,
    pub owner_id: String,
    pub title: String,
    pub input: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the caller; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRecordInput {
    pub owner_id: String,
    pub title: String,
    pub input: String,
    pub response: String,
}

impl ChatRecordInput {
    /// Build the record for a finished translation, deriving the title from the input.
    pub fn new(owner_id: &str, input: &str, response: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            title: derive_title(input),
            input: input.to_string(),
            response: response.to_string(),
        }
    }

    pub(crate) fn into_record(self, created_at: DateTime<Utc>) -> ChatRecord {
        ChatRecord {
            id: Uuid::new_v4(),
            owner_id: self.owner_id,
            title: self.title,
            input: self.input,
            response: self.response,
            created_at,
        }
    }
}

/// First [`TITLE_MAX_CHARS`] characters of `input`, with "..." appended when cut.
pub fn derive_title(input: &str) -> String {
    match input.char_indices().nth(TITLE_MAX_CHARS) {
        Some((cut, _)) => format!("{}...", &input[..cut]),
        None => input.to_string(),
    }
}

/// Persistence for chat records.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Persist a record, assigning its id and creation time.
    async fn create(&self, input: ChatRecordInput) -> Result<ChatRecord>;

    /// All records of `owner_id`, most recent first.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<ChatRecord>>;

    /// Short name for startup logs.
    fn backend(&self) -> &'static str;
}

/// Process-local store, used when no database is configured and in tests.
#[derive(Default)]
pub struct InMemoryHistoryStore {
    records: RwLock<Vec<ChatRecord>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn create(&self, input: ChatRecordInput) -> Result<ChatRecord> {
        let mut records = self.records.write().await;
        // Timestamps never go backwards within one store, even if the clock does
        let now = Utc::now();
        let created_at = match records.last() {
            Some(last) if last.created_at > now => last.created_at,
            _ => now,
        };
        let record = input.into_record(created_at);
        records.push(record.clone());
        Ok(record)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<ChatRecord>> {
        let records = self.records.read().await;
        // Insertion order is creation order, so reversing gives newest first
        Ok(records
            .iter()
            .rev()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    // ==================== Title derivation ====================

    #[test]
    fn test_short_title_unchanged() {
        assert_eq!(derive_title("Hello"), "Hello");
    }

    #[test]
    fn test_exactly_thirty_chars_not_truncated() {
        let input = "a".repeat(30);
        assert_eq!(derive_title(&input), input);
    }

    #[test]
    fn test_long_title_truncated_with_ellipsis() {
        let input = "a".repeat(50);
        assert_eq!(derive_title(&input), format!("{}...", "a".repeat(30)));
    }

    #[test]
    fn test_title_counts_characters_not_bytes() {
        let input = "é".repeat(31);
        assert_eq!(derive_title(&input), format!("{}...", "é".repeat(30)));
    }

    #[test]
    fn test_chat_record_input_derives_title() {
        let input = ChatRecordInput::new("user-1", "Where is the nearest train station?", "¿Dónde?");
        assert_eq!(input.title, "Where is the nearest train sta...");
        assert_eq!(input.input, "Where is the nearest train station?");
        assert_eq!(input.response, "¿Dónde?");
        assert_eq!(input.owner_id, "user-1");
    }

    proptest! {
        #[test]
        fn prop_title_rule(input in ".*") {
            let title = derive_title(&input);
            if input.chars().count() > TITLE_MAX_CHARS {
                let expected: String = input.chars().take(TITLE_MAX_CHARS).collect();
                prop_assert_eq!(title, format!("{}...", expected));
            } else {
                prop_assert_eq!(title, input);
            }
        }
    }

    // ==================== Serialization ====================

    #[test]
    fn test_chat_record_serializes_camel_case() {
        let record = ChatRecordInput::new("owner", "Hello", "Bonjour").into_record(Utc::now());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["ownerId"], "owner");
        assert_eq!(json["title"], "Hello");
        assert_eq!(json["input"], "Hello");
        assert_eq!(json["response"], "Bonjour");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("id").is_some());
    }

    // ==================== In-memory store ====================

    #[tokio::test]
    async fn test_create_assigns_id_and_timestamp() {
        let store = InMemoryHistoryStore::new();
        let before = Utc::now();

        let record = store
            .create(ChatRecordInput::new("u1", "Hello", "Hola"))
            .await
            .expect("create");

        assert!(!record.id.is_nil());
        assert!(record.created_at >= before);
        assert_eq!(record.owner_id, "u1");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_identical_inputs_create_distinct_records() {
        let store = InMemoryHistoryStore::new();

        let a = store.create(ChatRecordInput::new("u1", "Hi", "Salut")).await.unwrap();
        let b = store.create(ChatRecordInput::new("u1", "Hi", "Salut")).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(store.list_by_owner("u1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_by_owner_newest_first() {
        let store = InMemoryHistoryStore::new();

        for text in ["first", "second", "third"] {
            store.create(ChatRecordInput::new("u1", text, text)).await.unwrap();
        }

        let records = store.list_by_owner("u1").await.unwrap();
        let inputs: Vec<_> = records.iter().map(|r| r.input.as_str()).collect();
        assert_eq!(inputs, vec!["third", "second", "first"]);
        assert!(records
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));
    }

    #[tokio::test]
    async fn test_list_by_owner_isolates_users() {
        let store = InMemoryHistoryStore::new();

        store.create(ChatRecordInput::new("alice", "a", "a")).await.unwrap();
        store.create(ChatRecordInput::new("bob", "b", "b")).await.unwrap();

        let alice = store.list_by_owner("alice").await.unwrap();
        assert_eq!(alice.len(), 1);
        assert_eq!(alice[0].owner_id, "alice");
        assert!(store.list_by_owner("carol").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_creates_for_same_owner() {
        let store = Arc::new(InMemoryHistoryStore::new());

        let tasks = (0..50).map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .create(ChatRecordInput::new("u1", &format!("text {}", i), "x"))
                    .await
            })
        });

        for result in futures::future::join_all(tasks).await {
            result.expect("task").expect("create");
        }

        let records = store.list_by_owner("u1").await.unwrap();
        assert_eq!(records.len(), 50);
        assert!(records
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));
    }
}
