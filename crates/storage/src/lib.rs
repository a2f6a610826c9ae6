pub mod dto;
pub mod error;
pub mod memory;
pub mod models;
pub mod repository;
pub mod services;
pub mod store;

use std::collections::HashMap;
use std::time::Duration;

use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

pub use error::{ConflictKind, Result, StorageError};
pub use memory::MemoryStore;
pub use store::LeagueStore;

use models::{
    Challenge, Entry, Group, NewChallenge, NewGroup, NewPlayer, NewRatingSnapshot, Player, Prompt,
    RatingSnapshot,
};
use repository::{
    ChallengeRepository, EntryRepository, GroupRepository, PlayerRepository, RatingRepository,
};

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Postgres-backed [`LeagueStore`].
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    lock_timeout: Duration,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self {
            pool,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        })
    }

    /// How long a rating append waits for the group's advisory lock.
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl LeagueStore for Database {
    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        GroupRepository::new(&self.pool).create(group).await
    }

    async fn find_group(&self, group_id: Uuid) -> Result<Group> {
        GroupRepository::new(&self.pool).find_by_id(group_id).await
    }

    async fn create_player(&self, player: NewPlayer) -> Result<Player> {
        PlayerRepository::new(&self.pool).create(player).await
    }

    async fn find_player(&self, player_id: Uuid) -> Result<Player> {
        PlayerRepository::new(&self.pool).find_by_id(player_id).await
    }

    async fn add_member(&self, group_id: Uuid, player_id: Uuid) -> Result<bool> {
        GroupRepository::new(&self.pool)
            .add_member(group_id, player_id)
            .await
    }

    async fn is_member(&self, group_id: Uuid, player_id: Uuid) -> Result<bool> {
        GroupRepository::new(&self.pool)
            .is_member(group_id, player_id)
            .await
    }

    async fn group_members(&self, group_id: Uuid) -> Result<Vec<Player>> {
        GroupRepository::new(&self.pool).members(group_id).await
    }

    async fn create_challenge(&self, challenge: NewChallenge) -> Result<Challenge> {
        ChallengeRepository::new(&self.pool).create(challenge).await
    }

    async fn find_challenge(&self, challenge_id: Uuid) -> Result<Challenge> {
        ChallengeRepository::new(&self.pool)
            .find_by_id(challenge_id)
            .await
    }

    async fn list_challenges(&self, group_id: Uuid) -> Result<Vec<Challenge>> {
        ChallengeRepository::new(&self.pool)
            .list_by_group(group_id)
            .await
    }

    async fn previous_challenge(&self, challenge: &Challenge) -> Result<Option<Challenge>> {
        ChallengeRepository::new(&self.pool).previous(challenge).await
    }

    async fn recent_completed_challenges(&self, group_id: Uuid, limit: i64) -> Result<Vec<Challenge>> {
        ChallengeRepository::new(&self.pool)
            .recent_completed(group_id, limit)
            .await
    }

    async fn record_winner(&self, challenge_id: Uuid, winner_id: Uuid) -> Result<Challenge> {
        ChallengeRepository::new(&self.pool)
            .record_winner(challenge_id, winner_id)
            .await
    }

    async fn create_prompt(&self, challenge_id: Uuid, prompt: String) -> Result<Prompt> {
        ChallengeRepository::new(&self.pool)
            .create_prompt(challenge_id, &prompt)
            .await
    }

    async fn find_prompt(&self, prompt_id: Uuid) -> Result<Prompt> {
        ChallengeRepository::new(&self.pool)
            .find_prompt(prompt_id)
            .await
    }

    async fn challenge_prompts(&self, challenge_id: Uuid) -> Result<Vec<Prompt>> {
        ChallengeRepository::new(&self.pool)
            .prompts(challenge_id)
            .await
    }

    async fn upsert_entry(&self, prompt_id: Uuid, player_id: Uuid) -> Result<Entry> {
        EntryRepository::new(&self.pool)
            .upsert(prompt_id, player_id)
            .await
    }

    async fn find_entry(&self, entry_id: Uuid) -> Result<Entry> {
        EntryRepository::new(&self.pool).find_by_id(entry_id).await
    }

    async fn set_entry_url(&self, entry_id: Uuid, url: String) -> Result<Entry> {
        EntryRepository::new(&self.pool).set_url(entry_id, &url).await
    }

    async fn set_entry_score(&self, entry_id: Uuid, score: Option<Decimal>) -> Result<Entry> {
        EntryRepository::new(&self.pool)
            .set_score(entry_id, score)
            .await
    }

    async fn challenge_entries(&self, challenge_id: Uuid) -> Result<Vec<Entry>> {
        EntryRepository::new(&self.pool)
            .for_challenge(challenge_id)
            .await
    }

    async fn latest_snapshots(
        &self,
        group_id: Uuid,
        player_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, RatingSnapshot>> {
        RatingRepository::new(&self.pool)
            .latest_for_players(group_id, player_ids)
            .await
    }

    async fn challenge_snapshots(&self, challenge_ids: &[Uuid]) -> Result<Vec<RatingSnapshot>> {
        RatingRepository::new(&self.pool)
            .for_challenges(challenge_ids)
            .await
    }

    async fn player_snapshots(&self, group_id: Uuid, player_id: Uuid) -> Result<Vec<RatingSnapshot>> {
        RatingRepository::new(&self.pool)
            .history(group_id, player_id)
            .await
    }

    async fn append_snapshots(
        &self,
        group_id: Uuid,
        challenge_id: Option<Uuid>,
        snapshots: &[NewRatingSnapshot],
    ) -> Result<Vec<RatingSnapshot>> {
        RatingRepository::new(&self.pool)
            .append(
                group_id,
                challenge_id,
                snapshots,
                self.lock_timeout.as_millis() as u64,
            )
            .await
    }
}
