use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{Group, NewGroup, NewPlayer, Player};

pub struct GroupRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> GroupRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, group: NewGroup) -> Result<Group> {
        let result = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO groups (name, description)
            VALUES ($1, $2)
            RETURNING group_id, name, description, created_at
            "#,
        )
        .bind(&group.name)
        .bind(&group.description)
        .fetch_one(self.pool)
        .await
        .map_err(StorageError::from);

        match result {
            Err(e) if e.is_unique_violation() => Err(StorageError::ConstraintViolation(
                "Group name already exists".to_string(),
            )),
            other => other,
        }
    }

    pub async fn find_by_id(&self, group_id: Uuid) -> Result<Group> {
        sqlx::query_as::<_, Group>(
            r#"
            SELECT group_id, name, description, created_at
            FROM groups
            WHERE group_id = $1
            "#,
        )
        .bind(group_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound("group"))
    }

    /// Inserts the membership row; `false` when the player was already a member.
    pub async fn add_member(&self, group_id: Uuid, player_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO group_members (group_id, player_id)
            VALUES ($1, $2)
            ON CONFLICT (group_id, player_id) DO NOTHING
            "#,
        )
        .bind(group_id)
        .bind(player_id)
        .execute(self.pool)
        .await
        .map_err(StorageError::from);

        match result {
            Ok(done) => Ok(done.rows_affected() == 1),
            Err(e) if e.is_foreign_key_violation() => {
                self.find_by_id(group_id).await?;
                Err(StorageError::NotFound("player"))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn is_member(&self, group_id: Uuid, player_id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM group_members WHERE group_id = $1 AND player_id = $2
            )
            "#,
        )
        .bind(group_id)
        .bind(player_id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Members in join order.
    pub async fn members(&self, group_id: Uuid) -> Result<Vec<Player>> {
        let players = sqlx::query_as::<_, Player>(
            r#"
            SELECT p.player_id, p.display_name, p.email, p.created_at
            FROM group_members gm
            JOIN players p ON p.player_id = gm.player_id
            WHERE gm.group_id = $1
            ORDER BY gm.joined_at, p.player_id
            "#,
        )
        .bind(group_id)
        .fetch_all(self.pool)
        .await?;

        Ok(players)
    }
}

pub struct PlayerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PlayerRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, player: NewPlayer) -> Result<Player> {
        let player = sqlx::query_as::<_, Player>(
            r#"
            INSERT INTO players (display_name, email)
            VALUES ($1, $2)
            RETURNING player_id, display_name, email, created_at
            "#,
        )
        .bind(&player.display_name)
        .bind(&player.email)
        .fetch_one(self.pool)
        .await?;

        Ok(player)
    }

    pub async fn find_by_id(&self, player_id: Uuid) -> Result<Player> {
        sqlx::query_as::<_, Player>(
            r#"
            SELECT player_id, display_name, email, created_at
            FROM players
            WHERE player_id = $1
            "#,
        )
        .bind(player_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound("player"))
    }
}
