//! Entry submission and judging.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use super::locks::GroupLocks;
use crate::error::{ConflictKind, Result, StorageError};
use crate::models::Entry;
use crate::store::LeagueStore;

pub struct EntryService {
    store: Arc<dyn LeagueStore>,
    locks: GroupLocks,
}

impl EntryService {
    pub fn new(store: Arc<dyn LeagueStore>, locks: GroupLocks) -> Self {
        Self { store, locks }
    }

    /// Creates or updates the player's entry for a prompt.
    ///
    /// Only accepted while the challenge is active, and only from members of
    /// the challenge's group.
    pub async fn submit_entry(
        &self,
        prompt_id: Uuid,
        player_id: Uuid,
        url: String,
        now: DateTime<Utc>,
    ) -> Result<Entry> {
        let prompt = self.store.find_prompt(prompt_id).await?;
        let challenge = self.store.find_challenge(prompt.challenge_id).await?;

        if !challenge.phase(now).accepts_entries() {
            return Err(StorageError::Conflict(ConflictKind::EntriesClosed));
        }

        self.store.find_player(player_id).await?;
        if !self.store.is_member(challenge.group_id, player_id).await? {
            return Err(StorageError::Validation(
                "player is not a member of the challenge's group".to_string(),
            ));
        }

        let entry = self.store.upsert_entry(prompt_id, player_id).await?;
        let entry = self.store.set_entry_url(entry.entry_id, url).await?;
        debug!(entry_id = %entry.entry_id, %prompt_id, %player_id, "entry submitted");
        Ok(entry)
    }

    /// Sets or clears a score. Held under the group lock so a close never
    /// tallies a half-scored challenge.
    pub async fn score_entry(&self, entry_id: Uuid, score: Option<Decimal>) -> Result<Entry> {
        if score.is_some_and(|s| s < Decimal::ZERO) {
            return Err(StorageError::Validation(
                "score must not be negative".to_string(),
            ));
        }

        let entry = self.store.find_entry(entry_id).await?;
        let prompt = self.store.find_prompt(entry.prompt_id).await?;
        let challenge = self.store.find_challenge(prompt.challenge_id).await?;

        let _guard = self.locks.acquire(challenge.group_id).await?;
        let challenge = self.store.find_challenge(challenge.challenge_id).await?;
        if challenge.is_complete() {
            return Err(StorageError::Conflict(ConflictKind::AlreadyClosed));
        }

        let entry = self.store.set_entry_score(entry_id, score).await?;
        debug!(%entry_id, score = ?entry.score, "entry scored");
        Ok(entry)
    }
}
