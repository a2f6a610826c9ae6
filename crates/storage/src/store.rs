use std::collections::HashMap;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Challenge, Entry, Group, NewChallenge, NewGroup, NewPlayer, NewRatingSnapshot, Player, Prompt,
    RatingSnapshot,
};

/// Persisted records the engine reads and writes.
///
/// Implemented for Postgres by [`crate::Database`] and in memory by
/// [`crate::memory::MemoryStore`]. Engine services only see this trait.
#[async_trait::async_trait]
pub trait LeagueStore: Send + Sync {
    async fn create_group(&self, group: NewGroup) -> Result<Group>;
    async fn find_group(&self, group_id: Uuid) -> Result<Group>;

    async fn create_player(&self, player: NewPlayer) -> Result<Player>;
    async fn find_player(&self, player_id: Uuid) -> Result<Player>;

    /// Adds the membership; returns `false` when it already existed.
    async fn add_member(&self, group_id: Uuid, player_id: Uuid) -> Result<bool>;
    async fn is_member(&self, group_id: Uuid, player_id: Uuid) -> Result<bool>;
    async fn group_members(&self, group_id: Uuid) -> Result<Vec<Player>>;

    async fn create_challenge(&self, challenge: NewChallenge) -> Result<Challenge>;
    async fn find_challenge(&self, challenge_id: Uuid) -> Result<Challenge>;
    /// Newest first.
    async fn list_challenges(&self, group_id: Uuid) -> Result<Vec<Challenge>>;
    /// The challenge created just before this one in the same group.
    async fn previous_challenge(&self, challenge: &Challenge) -> Result<Option<Challenge>>;
    /// The `limit` most recent challenges with a winner, newest first.
    async fn recent_completed_challenges(&self, group_id: Uuid, limit: i64) -> Result<Vec<Challenge>>;
    /// Sets the winner only if none is set yet; otherwise `Conflict(AlreadyClosed)`.
    async fn record_winner(&self, challenge_id: Uuid, winner_id: Uuid) -> Result<Challenge>;

    async fn create_prompt(&self, challenge_id: Uuid, prompt: String) -> Result<Prompt>;
    async fn find_prompt(&self, prompt_id: Uuid) -> Result<Prompt>;
    async fn challenge_prompts(&self, challenge_id: Uuid) -> Result<Vec<Prompt>>;

    /// Returns the entry for `(prompt, player)`, creating it if there is none.
    async fn upsert_entry(&self, prompt_id: Uuid, player_id: Uuid) -> Result<Entry>;
    async fn find_entry(&self, entry_id: Uuid) -> Result<Entry>;
    async fn set_entry_url(&self, entry_id: Uuid, url: String) -> Result<Entry>;
    async fn set_entry_score(&self, entry_id: Uuid, score: Option<Decimal>) -> Result<Entry>;
    /// Every entry for every prompt of the challenge.
    async fn challenge_entries(&self, challenge_id: Uuid) -> Result<Vec<Entry>>;

    /// Latest snapshot per requested player; players without one are absent.
    async fn latest_snapshots(
        &self,
        group_id: Uuid,
        player_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, RatingSnapshot>>;
    async fn challenge_snapshots(&self, challenge_ids: &[Uuid]) -> Result<Vec<RatingSnapshot>>;
    /// Oldest first.
    async fn player_snapshots(&self, group_id: Uuid, player_id: Uuid) -> Result<Vec<RatingSnapshot>>;
    /// Appends all snapshots or none.
    ///
    /// Fails with `Conflict(RatingsAlreadyApplied)` when the challenge already
    /// has snapshots, and with `Concurrency` when a player's latest snapshot is
    /// no longer the one named in `based_on`.
    async fn append_snapshots(
        &self,
        group_id: Uuid,
        challenge_id: Option<Uuid>,
        snapshots: &[NewRatingSnapshot],
    ) -> Result<Vec<RatingSnapshot>>;
}
