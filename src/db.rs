use crate::history::{ChatRecord, ChatRecordInput, HistoryStore};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

/// PostgreSQL-backed chat history.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect and make sure the schema exists
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Idempotent schema setup, safe to run on every start
    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS chats (
                id UUID PRIMARY KEY,
                owner_id TEXT NOT NULL,
                title TEXT NOT NULL,
                input TEXT NOT NULL,
                response TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create chats table")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_chats_owner_created
             ON chats (owner_id, created_at DESC)",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create chats index")?;

        info!("✓ Database schema ready");
        Ok(())
    }

    #[cfg(test)]
    async fn chat_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chats")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count chats")?;
        Ok(count)
    }
}

#[async_trait]
impl HistoryStore for Database {
    async fn create(&self, input: ChatRecordInput) -> Result<ChatRecord> {
        // TIMESTAMPTZ keeps microseconds; match it so the returned record equals the stored one
        let record = input.into_record(Utc::now().trunc_subsecs(6));

        sqlx::query(
            "INSERT INTO chats (id, owner_id, title, input, response, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.id)
        .bind(&record.owner_id)
        .bind(&record.title)
        .bind(&record.input)
        .bind(&record.response)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to save chat")?;

        Ok(record)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<ChatRecord>> {
        let records = sqlx::query_as::<_, ChatRecord>(
            "SELECT id, owner_id, title, input, response, created_at
             FROM chats
             WHERE owner_id = $1
             ORDER BY created_at DESC, id DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list chats")?;

        Ok(records)
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    //! These tests need a live PostgreSQL instance. Point TEST_DATABASE_URL at
    //! a throwaway database to run them; without it they pass trivially.

    use super::*;
    use uuid::Uuid;

    async fn test_db() -> Option<Database> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        Some(Database::new(&url).await.expect("Failed to connect to test database"))
    }

    /// Owner ids are random so tests don't see each other's rows
    fn unique_owner() -> String {
        format!("test-owner-{}", Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_malformed_database_url() {
        let result = Database::new("not a url").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let Some(db) = test_db().await else { return };
        db.run_migrations().await.expect("second migration run");
        db.chat_count().await.expect("count");
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let Some(db) = test_db().await else { return };
        let owner = unique_owner();

        let created = db
            .create(ChatRecordInput::new(&owner, "Hello", "Bonjour"))
            .await
            .expect("create");

        let listed = db.list_by_owner(&owner).await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
        assert_eq!(listed[0].title, "Hello");
        assert_eq!(listed[0].response, "Bonjour");
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let Some(db) = test_db().await else { return };
        let owner = unique_owner();

        for text in ["one", "two", "three"] {
            db.create(ChatRecordInput::new(&owner, text, text))
                .await
                .expect("create");
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let listed = db.list_by_owner(&owner).await.expect("list");
        let inputs: Vec<_> = listed.iter().map(|r| r.input.as_str()).collect();
        assert_eq!(inputs, vec!["three", "two", "one"]);
    }

    #[tokio::test]
    async fn test_list_unknown_owner_is_empty() {
        let Some(db) = test_db().await else { return };
        let listed = db.list_by_owner(&unique_owner()).await.expect("list");
        assert!(listed.is_empty());
    }
}
