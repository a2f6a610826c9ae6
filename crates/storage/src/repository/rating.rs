use std::collections::HashMap;

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{ConflictKind, Result, StorageError};
use crate::models::{NewRatingSnapshot, RatingSnapshot};

const SNAPSHOT_COLUMNS: &str =
    "snapshot_id, snapshot_seq, group_id, challenge_id, player_id, mu, sigma, created_at";

pub struct RatingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RatingRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn latest_for_players(
        &self,
        group_id: Uuid,
        player_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, RatingSnapshot>> {
        let query = format!(
            r#"
            SELECT DISTINCT ON (player_id) {SNAPSHOT_COLUMNS}
            FROM rating_snapshots
            WHERE group_id = $1 AND player_id = ANY($2)
            ORDER BY player_id, snapshot_seq DESC
            "#
        );

        let snapshots = sqlx::query_as::<_, RatingSnapshot>(&query)
            .bind(group_id)
            .bind(player_ids)
            .fetch_all(self.pool)
            .await?;

        Ok(snapshots.into_iter().map(|s| (s.player_id, s)).collect())
    }

    pub async fn for_challenges(&self, challenge_ids: &[Uuid]) -> Result<Vec<RatingSnapshot>> {
        let query = format!(
            r#"
            SELECT {SNAPSHOT_COLUMNS}
            FROM rating_snapshots
            WHERE challenge_id = ANY($1)
            ORDER BY snapshot_seq
            "#
        );

        let snapshots = sqlx::query_as::<_, RatingSnapshot>(&query)
            .bind(challenge_ids)
            .fetch_all(self.pool)
            .await?;

        Ok(snapshots)
    }

    pub async fn history(&self, group_id: Uuid, player_id: Uuid) -> Result<Vec<RatingSnapshot>> {
        let query = format!(
            r#"
            SELECT {SNAPSHOT_COLUMNS}
            FROM rating_snapshots
            WHERE group_id = $1 AND player_id = $2
            ORDER BY snapshot_seq
            "#
        );

        let snapshots = sqlx::query_as::<_, RatingSnapshot>(&query)
            .bind(group_id)
            .bind(player_id)
            .fetch_all(self.pool)
            .await?;

        Ok(snapshots)
    }

    /// Appends a batch of snapshots in one transaction.
    ///
    /// Writers for the same group are serialized by a transaction-scoped
    /// advisory lock, so the `based_on` check and the inserts see the same
    /// latest snapshots.
    pub async fn append(
        &self,
        group_id: Uuid,
        challenge_id: Option<Uuid>,
        snapshots: &[NewRatingSnapshot],
        lock_timeout_ms: u64,
    ) -> Result<Vec<RatingSnapshot>> {
        self.append_inner(group_id, challenge_id, snapshots, lock_timeout_ms)
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    StorageError::Conflict(ConflictKind::RatingsAlreadyApplied)
                } else {
                    e.classify()
                }
            })
    }

    async fn append_inner(
        &self,
        group_id: Uuid,
        challenge_id: Option<Uuid>,
        snapshots: &[NewRatingSnapshot],
        lock_timeout_ms: u64,
    ) -> Result<Vec<RatingSnapshot>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!("SET LOCAL lock_timeout = '{lock_timeout_ms}ms'"))
            .execute(&mut *tx)
            .await?;
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1::text))")
            .bind(group_id)
            .execute(&mut *tx)
            .await?;

        if let Some(challenge_id) = challenge_id {
            let applied = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM rating_snapshots WHERE challenge_id = $1)",
            )
            .bind(challenge_id)
            .fetch_one(&mut *tx)
            .await?;

            if applied {
                return Err(StorageError::Conflict(ConflictKind::RatingsAlreadyApplied));
            }
        }

        for snapshot in snapshots {
            Self::check_based_on(&mut tx, group_id, snapshot).await?;
        }

        let query = format!(
            r#"
            INSERT INTO rating_snapshots (group_id, challenge_id, player_id, mu, sigma)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SNAPSHOT_COLUMNS}
            "#
        );

        let mut appended = Vec::with_capacity(snapshots.len());
        for snapshot in snapshots {
            let row = sqlx::query_as::<_, RatingSnapshot>(&query)
                .bind(group_id)
                .bind(challenge_id)
                .bind(snapshot.player_id)
                .bind(snapshot.mu)
                .bind(snapshot.sigma)
                .fetch_one(&mut *tx)
                .await?;
            appended.push(row);
        }

        tx.commit().await?;
        Ok(appended)
    }

    async fn check_based_on(
        tx: &mut Transaction<'_, Postgres>,
        group_id: Uuid,
        snapshot: &NewRatingSnapshot,
    ) -> Result<()> {
        let latest = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT snapshot_id
            FROM rating_snapshots
            WHERE group_id = $1 AND player_id = $2
            ORDER BY snapshot_seq DESC
            LIMIT 1
            "#,
        )
        .bind(group_id)
        .bind(snapshot.player_id)
        .fetch_optional(&mut **tx)
        .await?;

        if latest != snapshot.based_on {
            return Err(StorageError::Concurrency(format!(
                "rating for player {} changed while updating",
                snapshot.player_id
            )));
        }
        Ok(())
    }
}
