use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{ConflictKind, Result, StorageError};
use crate::models::{Challenge, NewChallenge, Prompt};

const CHALLENGE_COLUMNS: &str = "challenge_id, group_id, name, description, start_time, end_time, \
     author_id, winner_id, created_at";

pub struct ChallengeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ChallengeRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, challenge: NewChallenge) -> Result<Challenge> {
        let query = format!(
            r#"
            INSERT INTO challenges (group_id, name, description, start_time, end_time, author_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CHALLENGE_COLUMNS}
            "#
        );

        let result = sqlx::query_as::<_, Challenge>(&query)
            .bind(challenge.group_id)
            .bind(&challenge.name)
            .bind(&challenge.description)
            .bind(challenge.window.start())
            .bind(challenge.window.end())
            .bind(challenge.author_id)
            .fetch_one(self.pool)
            .await
            .map_err(StorageError::from);

        match result {
            Err(e) if e.is_foreign_key_violation() => Err(StorageError::NotFound("group")),
            other => other,
        }
    }

    pub async fn find_by_id(&self, challenge_id: Uuid) -> Result<Challenge> {
        let query = format!("SELECT {CHALLENGE_COLUMNS} FROM challenges WHERE challenge_id = $1");

        sqlx::query_as::<_, Challenge>(&query)
            .bind(challenge_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(StorageError::NotFound("challenge"))
    }

    pub async fn list_by_group(&self, group_id: Uuid) -> Result<Vec<Challenge>> {
        let query = format!(
            "SELECT {CHALLENGE_COLUMNS} FROM challenges WHERE group_id = $1 ORDER BY challenge_seq DESC"
        );

        let challenges = sqlx::query_as::<_, Challenge>(&query)
            .bind(group_id)
            .fetch_all(self.pool)
            .await?;

        Ok(challenges)
    }

    pub async fn previous(&self, challenge: &Challenge) -> Result<Option<Challenge>> {
        let query = format!(
            r#"
            SELECT {CHALLENGE_COLUMNS}
            FROM challenges
            WHERE group_id = $1
              AND challenge_seq < (SELECT challenge_seq FROM challenges WHERE challenge_id = $2)
            ORDER BY challenge_seq DESC
            LIMIT 1
            "#
        );

        let previous = sqlx::query_as::<_, Challenge>(&query)
            .bind(challenge.group_id)
            .bind(challenge.challenge_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(previous)
    }

    pub async fn recent_completed(&self, group_id: Uuid, limit: i64) -> Result<Vec<Challenge>> {
        let query = format!(
            r#"
            SELECT {CHALLENGE_COLUMNS}
            FROM challenges
            WHERE group_id = $1 AND winner_id IS NOT NULL
            ORDER BY challenge_seq DESC
            LIMIT $2
            "#
        );

        let challenges = sqlx::query_as::<_, Challenge>(&query)
            .bind(group_id)
            .bind(limit.max(0))
            .fetch_all(self.pool)
            .await?;

        Ok(challenges)
    }

    /// Sets the winner only while none is recorded.
    pub async fn record_winner(&self, challenge_id: Uuid, winner_id: Uuid) -> Result<Challenge> {
        let query = format!(
            r#"
            UPDATE challenges
            SET winner_id = $2
            WHERE challenge_id = $1 AND winner_id IS NULL
            RETURNING {CHALLENGE_COLUMNS}
            "#
        );

        let updated = sqlx::query_as::<_, Challenge>(&query)
            .bind(challenge_id)
            .bind(winner_id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| StorageError::from(e).classify())?;

        match updated {
            Some(challenge) => Ok(challenge),
            None => {
                // Either gone or closed by someone else.
                self.find_by_id(challenge_id).await?;
                Err(StorageError::Conflict(ConflictKind::AlreadyClosed))
            }
        }
    }

    pub async fn create_prompt(&self, challenge_id: Uuid, prompt: &str) -> Result<Prompt> {
        let result = sqlx::query_as::<_, Prompt>(
            r#"
            INSERT INTO prompts (challenge_id, prompt)
            VALUES ($1, $2)
            RETURNING prompt_id, challenge_id, prompt, created_at
            "#,
        )
        .bind(challenge_id)
        .bind(prompt)
        .fetch_one(self.pool)
        .await
        .map_err(StorageError::from);

        match result {
            Err(e) if e.is_foreign_key_violation() => Err(StorageError::NotFound("challenge")),
            other => other,
        }
    }

    pub async fn find_prompt(&self, prompt_id: Uuid) -> Result<Prompt> {
        sqlx::query_as::<_, Prompt>(
            "SELECT prompt_id, challenge_id, prompt, created_at FROM prompts WHERE prompt_id = $1",
        )
        .bind(prompt_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound("prompt"))
    }

    pub async fn prompts(&self, challenge_id: Uuid) -> Result<Vec<Prompt>> {
        let prompts = sqlx::query_as::<_, Prompt>(
            r#"
            SELECT prompt_id, challenge_id, prompt, created_at
            FROM prompts
            WHERE challenge_id = $1
            ORDER BY created_at, prompt_id
            "#,
        )
        .bind(challenge_id)
        .fetch_all(self.pool)
        .await?;

        Ok(prompts)
    }
}
