#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use gifoff_storage::LeagueStore;
use gifoff_storage::memory::MemoryStore;
use gifoff_storage::models::{Challenge, Entry, Group, NewGroup, NewPlayer, Player, Prompt, TimeWindow};
use gifoff_storage::services::{
    ChallengeLifecycle, EntryService, GroupLocks, GroupService, Leaderboard, RatingConfig,
    RatingEngine,
};
use rust_decimal::Decimal;
use uuid::Uuid;

pub struct League {
    pub store: Arc<MemoryStore>,
    pub ratings: Arc<RatingEngine>,
    pub lifecycle: ChallengeLifecycle,
    pub entries: EntryService,
    pub groups: GroupService,
    pub leaderboard: Leaderboard,
    pub group: Group,
    pub players: Vec<Player>,
}

impl League {
    pub async fn new(names: &[&str]) -> Self {
        let store = Arc::new(MemoryStore::new());
        let dyn_store: Arc<dyn LeagueStore> = store.clone();
        let locks = GroupLocks::new(Duration::from_secs(2));
        let config = RatingConfig::default();

        let ratings = Arc::new(RatingEngine::new(dyn_store.clone(), config, locks.clone()));
        let lifecycle = ChallengeLifecycle::new(dyn_store.clone(), ratings.clone());
        let entries = EntryService::new(dyn_store.clone(), locks);
        let groups = GroupService::new(dyn_store.clone(), ratings.clone());
        let leaderboard = Leaderboard::new(dyn_store, config);

        let group = groups
            .create_group(NewGroup {
                name: format!("group-{}", Uuid::new_v4()),
                description: None,
            })
            .await
            .unwrap();

        let mut players = Vec::new();
        for name in names {
            let player = groups
                .create_player(NewPlayer {
                    display_name: name.to_string(),
                    email: None,
                })
                .await
                .unwrap();
            groups.join_group(group.group_id, player.player_id).await.unwrap();
            players.push(player);
        }

        Self {
            store,
            ratings,
            lifecycle,
            entries,
            groups,
            leaderboard,
            group,
            players,
        }
    }

    pub fn player(&self, name: &str) -> &Player {
        self.players
            .iter()
            .find(|p| p.display_name == name)
            .unwrap()
    }

    /// A challenge that is active right now, with one prompt.
    pub async fn active_challenge(&self, name: &str) -> (Challenge, Prompt) {
        let now = Utc::now();
        let window = TimeWindow::new(now - ChronoDuration::hours(1), now + ChronoDuration::hours(3)).unwrap();
        let challenge = self
            .lifecycle
            .create_challenge(
                self.group.group_id,
                name.to_string(),
                None,
                window,
                self.players[0].player_id,
            )
            .await
            .unwrap();
        let prompt = self
            .lifecycle
            .add_prompt(challenge.challenge_id, "when the build is green".to_string())
            .await
            .unwrap();
        (challenge, prompt)
    }

    pub async fn enter(&self, prompt: &Prompt, name: &str, score: Option<i64>) -> Entry {
        let player_id = self.player(name).player_id;
        let entry = self
            .entries
            .submit_entry(
                prompt.prompt_id,
                player_id,
                format!("https://media.giphy.com/media/{name}/giphy.gif"),
                Utc::now(),
            )
            .await
            .unwrap();
        match score {
            Some(score) => self
                .entries
                .score_entry(entry.entry_id, Some(Decimal::from(score)))
                .await
                .unwrap(),
            None => entry,
        }
    }

    /// Creates, fills and scores a challenge in one go.
    pub async fn scored_challenge(&self, name: &str, scores: &[(&str, i64)]) -> Challenge {
        let (challenge, prompt) = self.active_challenge(name).await;
        for (player, score) in scores {
            self.enter(&prompt, player, Some(*score)).await;
        }
        challenge
    }
}
