use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::Entry;

pub struct EntryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> EntryRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One row per `(prompt, player)`; a second call returns the existing row untouched.
    pub async fn upsert(&self, prompt_id: Uuid, player_id: Uuid) -> Result<Entry> {
        let result = sqlx::query_as::<_, Entry>(
            r#"
            INSERT INTO entries (prompt_id, player_id)
            VALUES ($1, $2)
            ON CONFLICT (prompt_id, player_id)
            DO UPDATE SET updated_at = entries.updated_at
            RETURNING entry_id, prompt_id, player_id, url, score, created_at, updated_at
            "#,
        )
        .bind(prompt_id)
        .bind(player_id)
        .fetch_one(self.pool)
        .await
        .map_err(StorageError::from);

        match result {
            Err(e) if e.is_foreign_key_violation() => Err(StorageError::NotFound("prompt")),
            other => other,
        }
    }

    pub async fn find_by_id(&self, entry_id: Uuid) -> Result<Entry> {
        sqlx::query_as::<_, Entry>(
            r#"
            SELECT entry_id, prompt_id, player_id, url, score, created_at, updated_at
            FROM entries
            WHERE entry_id = $1
            "#,
        )
        .bind(entry_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound("entry"))
    }

    pub async fn set_url(&self, entry_id: Uuid, url: &str) -> Result<Entry> {
        sqlx::query_as::<_, Entry>(
            r#"
            UPDATE entries
            SET url = $2, updated_at = NOW()
            WHERE entry_id = $1
            RETURNING entry_id, prompt_id, player_id, url, score, created_at, updated_at
            "#,
        )
        .bind(entry_id)
        .bind(url)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound("entry"))
    }

    pub async fn set_score(&self, entry_id: Uuid, score: Option<Decimal>) -> Result<Entry> {
        sqlx::query_as::<_, Entry>(
            r#"
            UPDATE entries
            SET score = $2, updated_at = NOW()
            WHERE entry_id = $1
            RETURNING entry_id, prompt_id, player_id, url, score, created_at, updated_at
            "#,
        )
        .bind(entry_id)
        .bind(score)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound("entry"))
    }

    pub async fn for_challenge(&self, challenge_id: Uuid) -> Result<Vec<Entry>> {
        let entries = sqlx::query_as::<_, Entry>(
            r#"
            SELECT e.entry_id, e.prompt_id, e.player_id, e.url, e.score, e.created_at, e.updated_at
            FROM entries e
            JOIN prompts p ON p.prompt_id = e.prompt_id
            WHERE p.challenge_id = $1
            ORDER BY e.created_at, e.entry_id
            "#,
        )
        .bind(challenge_id)
        .fetch_all(self.pool)
        .await?;

        Ok(entries)
    }
}
