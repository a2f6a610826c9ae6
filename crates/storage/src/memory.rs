//! In-process [`LeagueStore`] for tests and database-less runs.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{ConflictKind, Result, StorageError};
use crate::models::{
    Challenge, Entry, Group, NewChallenge, NewGroup, NewPlayer, NewRatingSnapshot, Player, Prompt,
    RatingSnapshot,
};
use crate::store::LeagueStore;

#[derive(Default)]
struct State {
    groups: Vec<Group>,
    players: Vec<Player>,
    members: Vec<(Uuid, Uuid)>,
    challenges: Vec<Challenge>,
    prompts: Vec<Prompt>,
    entries: Vec<Entry>,
    snapshots: Vec<RatingSnapshot>,
    next_seq: i64,
}

impl State {
    fn challenge(&self, challenge_id: Uuid) -> Result<&Challenge> {
        self.challenges
            .iter()
            .find(|c| c.challenge_id == challenge_id)
            .ok_or(StorageError::NotFound("challenge"))
    }

    fn entry_mut(&mut self, entry_id: Uuid) -> Result<&mut Entry> {
        self.entries
            .iter_mut()
            .find(|e| e.entry_id == entry_id)
            .ok_or(StorageError::NotFound("entry"))
    }

    fn latest_snapshot(&self, group_id: Uuid, player_id: Uuid) -> Option<&RatingSnapshot> {
        self.snapshots
            .iter()
            .filter(|s| s.group_id == group_id && s.player_id == player_id)
            .max_by_key(|s| s.snapshot_seq)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl LeagueStore for MemoryStore {
    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        let mut state = self.state.write().await;
        if state.groups.iter().any(|g| g.name == group.name) {
            return Err(StorageError::ConstraintViolation(
                "Group name already exists".to_string(),
            ));
        }
        let group = Group {
            group_id: Uuid::new_v4(),
            name: group.name,
            description: group.description,
            created_at: Utc::now(),
        };
        state.groups.push(group.clone());
        Ok(group)
    }

    async fn find_group(&self, group_id: Uuid) -> Result<Group> {
        let state = self.state.read().await;
        state
            .groups
            .iter()
            .find(|g| g.group_id == group_id)
            .cloned()
            .ok_or(StorageError::NotFound("group"))
    }

    async fn create_player(&self, player: NewPlayer) -> Result<Player> {
        let mut state = self.state.write().await;
        let player = Player {
            player_id: Uuid::new_v4(),
            display_name: player.display_name,
            email: player.email,
            created_at: Utc::now(),
        };
        state.players.push(player.clone());
        Ok(player)
    }

    async fn find_player(&self, player_id: Uuid) -> Result<Player> {
        let state = self.state.read().await;
        state
            .players
            .iter()
            .find(|p| p.player_id == player_id)
            .cloned()
            .ok_or(StorageError::NotFound("player"))
    }

    async fn add_member(&self, group_id: Uuid, player_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        if !state.groups.iter().any(|g| g.group_id == group_id) {
            return Err(StorageError::NotFound("group"));
        }
        if !state.players.iter().any(|p| p.player_id == player_id) {
            return Err(StorageError::NotFound("player"));
        }
        if state.members.contains(&(group_id, player_id)) {
            return Ok(false);
        }
        state.members.push((group_id, player_id));
        Ok(true)
    }

    async fn is_member(&self, group_id: Uuid, player_id: Uuid) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state.members.contains(&(group_id, player_id)))
    }

    async fn group_members(&self, group_id: Uuid) -> Result<Vec<Player>> {
        let state = self.state.read().await;
        Ok(state
            .members
            .iter()
            .filter(|(g, _)| *g == group_id)
            .filter_map(|(_, p)| state.players.iter().find(|player| player.player_id == *p))
            .cloned()
            .collect())
    }

    async fn create_challenge(&self, challenge: NewChallenge) -> Result<Challenge> {
        let mut state = self.state.write().await;
        if !state.groups.iter().any(|g| g.group_id == challenge.group_id) {
            return Err(StorageError::NotFound("group"));
        }
        let challenge = Challenge {
            challenge_id: Uuid::new_v4(),
            group_id: challenge.group_id,
            name: challenge.name,
            description: challenge.description,
            start_time: challenge.window.start(),
            end_time: challenge.window.end(),
            author_id: challenge.author_id,
            winner_id: None,
            created_at: Utc::now(),
        };
        state.challenges.push(challenge.clone());
        Ok(challenge)
    }

    async fn find_challenge(&self, challenge_id: Uuid) -> Result<Challenge> {
        let state = self.state.read().await;
        state.challenge(challenge_id).cloned()
    }

    async fn list_challenges(&self, group_id: Uuid) -> Result<Vec<Challenge>> {
        let state = self.state.read().await;
        Ok(state
            .challenges
            .iter()
            .rev()
            .filter(|c| c.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn previous_challenge(&self, challenge: &Challenge) -> Result<Option<Challenge>> {
        let state = self.state.read().await;
        Ok(state
            .challenges
            .iter()
            .take_while(|c| c.challenge_id != challenge.challenge_id)
            .filter(|c| c.group_id == challenge.group_id)
            .last()
            .cloned())
    }

    async fn recent_completed_challenges(&self, group_id: Uuid, limit: i64) -> Result<Vec<Challenge>> {
        let state = self.state.read().await;
        Ok(state
            .challenges
            .iter()
            .rev()
            .filter(|c| c.group_id == group_id && c.is_complete())
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn record_winner(&self, challenge_id: Uuid, winner_id: Uuid) -> Result<Challenge> {
        let mut state = self.state.write().await;
        let challenge = state
            .challenges
            .iter_mut()
            .find(|c| c.challenge_id == challenge_id)
            .ok_or(StorageError::NotFound("challenge"))?;
        if challenge.winner_id.is_some() {
            return Err(StorageError::Conflict(ConflictKind::AlreadyClosed));
        }
        challenge.winner_id = Some(winner_id);
        Ok(challenge.clone())
    }

    async fn create_prompt(&self, challenge_id: Uuid, prompt: String) -> Result<Prompt> {
        let mut state = self.state.write().await;
        state.challenge(challenge_id)?;
        let prompt = Prompt {
            prompt_id: Uuid::new_v4(),
            challenge_id,
            prompt,
            created_at: Utc::now(),
        };
        state.prompts.push(prompt.clone());
        Ok(prompt)
    }

    async fn find_prompt(&self, prompt_id: Uuid) -> Result<Prompt> {
        let state = self.state.read().await;
        state
            .prompts
            .iter()
            .find(|p| p.prompt_id == prompt_id)
            .cloned()
            .ok_or(StorageError::NotFound("prompt"))
    }

    async fn challenge_prompts(&self, challenge_id: Uuid) -> Result<Vec<Prompt>> {
        let state = self.state.read().await;
        Ok(state
            .prompts
            .iter()
            .filter(|p| p.challenge_id == challenge_id)
            .cloned()
            .collect())
    }

    async fn upsert_entry(&self, prompt_id: Uuid, player_id: Uuid) -> Result<Entry> {
        let mut state = self.state.write().await;
        if let Some(existing) = state
            .entries
            .iter()
            .find(|e| e.prompt_id == prompt_id && e.player_id == player_id)
        {
            return Ok(existing.clone());
        }
        if !state.prompts.iter().any(|p| p.prompt_id == prompt_id) {
            return Err(StorageError::NotFound("prompt"));
        }
        let now = Utc::now();
        let entry = Entry {
            entry_id: Uuid::new_v4(),
            prompt_id,
            player_id,
            url: None,
            score: None,
            created_at: now,
            updated_at: now,
        };
        state.entries.push(entry.clone());
        Ok(entry)
    }

    async fn find_entry(&self, entry_id: Uuid) -> Result<Entry> {
        let state = self.state.read().await;
        state
            .entries
            .iter()
            .find(|e| e.entry_id == entry_id)
            .cloned()
            .ok_or(StorageError::NotFound("entry"))
    }

    async fn set_entry_url(&self, entry_id: Uuid, url: String) -> Result<Entry> {
        let mut state = self.state.write().await;
        let entry = state.entry_mut(entry_id)?;
        entry.url = Some(url);
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    async fn set_entry_score(&self, entry_id: Uuid, score: Option<Decimal>) -> Result<Entry> {
        let mut state = self.state.write().await;
        let entry = state.entry_mut(entry_id)?;
        entry.score = score;
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    async fn challenge_entries(&self, challenge_id: Uuid) -> Result<Vec<Entry>> {
        let state = self.state.read().await;
        let prompts: Vec<Uuid> = state
            .prompts
            .iter()
            .filter(|p| p.challenge_id == challenge_id)
            .map(|p| p.prompt_id)
            .collect();
        Ok(state
            .entries
            .iter()
            .filter(|e| prompts.contains(&e.prompt_id))
            .cloned()
            .collect())
    }

    async fn latest_snapshots(
        &self,
        group_id: Uuid,
        player_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, RatingSnapshot>> {
        let state = self.state.read().await;
        Ok(player_ids
            .iter()
            .filter_map(|&p| state.latest_snapshot(group_id, p).map(|s| (p, s.clone())))
            .collect())
    }

    async fn challenge_snapshots(&self, challenge_ids: &[Uuid]) -> Result<Vec<RatingSnapshot>> {
        let state = self.state.read().await;
        Ok(state
            .snapshots
            .iter()
            .filter(|s| s.challenge_id.is_some_and(|c| challenge_ids.contains(&c)))
            .cloned()
            .collect())
    }

    async fn player_snapshots(&self, group_id: Uuid, player_id: Uuid) -> Result<Vec<RatingSnapshot>> {
        let state = self.state.read().await;
        Ok(state
            .snapshots
            .iter()
            .filter(|s| s.group_id == group_id && s.player_id == player_id)
            .cloned()
            .collect())
    }

    async fn append_snapshots(
        &self,
        group_id: Uuid,
        challenge_id: Option<Uuid>,
        snapshots: &[NewRatingSnapshot],
    ) -> Result<Vec<RatingSnapshot>> {
        let mut state = self.state.write().await;

        if let Some(challenge_id) = challenge_id {
            if state
                .snapshots
                .iter()
                .any(|s| s.challenge_id == Some(challenge_id))
            {
                return Err(StorageError::Conflict(ConflictKind::RatingsAlreadyApplied));
            }
        }

        for new in snapshots {
            let latest = state
                .latest_snapshot(group_id, new.player_id)
                .map(|s| s.snapshot_id);
            if latest != new.based_on {
                return Err(StorageError::Concurrency(format!(
                    "rating for player {} changed while updating",
                    new.player_id
                )));
            }
        }

        let now = Utc::now();
        let mut appended = Vec::with_capacity(snapshots.len());
        for new in snapshots {
            state.next_seq += 1;
            let snapshot = RatingSnapshot {
                snapshot_id: Uuid::new_v4(),
                snapshot_seq: state.next_seq,
                group_id,
                challenge_id,
                player_id: new.player_id,
                mu: new.mu,
                sigma: new.sigma,
                created_at: now,
            };
            state.snapshots.push(snapshot.clone());
            appended.push(snapshot);
        }

        Ok(appended)
    }
}
