//! Applies a challenge outcome to the group's rating snapshots.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::locks::{GroupGuard, GroupLocks};
use super::scoring::RankedPlayer;
use super::trueskill::{self, Rating, RatingConfig};
use crate::error::Result;
use crate::models::{NewRatingSnapshot, RatingSnapshot};
use crate::store::LeagueStore;

#[derive(Debug, Clone)]
pub enum RatingUpdate {
    Applied(Vec<RatingSnapshot>),
    /// Fewer than two participants; nothing was written.
    Skipped,
}

pub struct RatingEngine {
    store: Arc<dyn LeagueStore>,
    config: RatingConfig,
    locks: GroupLocks,
}

impl RatingEngine {
    pub fn new(store: Arc<dyn LeagueStore>, config: RatingConfig, locks: GroupLocks) -> Self {
        Self {
            store,
            config,
            locks,
        }
    }

    pub fn config(&self) -> &RatingConfig {
        &self.config
    }

    pub fn locks(&self) -> &GroupLocks {
        &self.locks
    }

    /// Takes the group lock, then rates the challenge.
    pub async fn apply(
        &self,
        group_id: Uuid,
        challenge_id: Uuid,
        ranking: &[RankedPlayer],
    ) -> Result<RatingUpdate> {
        let guard = self.locks.acquire(group_id).await?;
        self.apply_held(&guard, challenge_id, ranking).await
    }

    /// Rates the challenge for the group whose lock `guard` holds.
    ///
    /// Reads each participant's latest snapshot, or the baseline when there
    /// is none, and appends one new snapshot per participant.
    pub async fn apply_held(
        &self,
        guard: &GroupGuard,
        challenge_id: Uuid,
        ranking: &[RankedPlayer],
    ) -> Result<RatingUpdate> {
        let group_id = guard.group_id();

        if ranking.len() < 2 {
            debug!(%challenge_id, participants = ranking.len(), "rating update skipped");
            return Ok(RatingUpdate::Skipped);
        }

        let player_ids: Vec<Uuid> = ranking.iter().map(|r| r.player_id).collect();
        let latest = self.store.latest_snapshots(group_id, &player_ids).await?;

        let prior: Vec<(Rating, u32)> = ranking
            .iter()
            .map(|r| {
                let rating = latest
                    .get(&r.player_id)
                    .map(|s| Rating {
                        mu: s.mu,
                        sigma: s.sigma,
                    })
                    .unwrap_or_else(|| self.config.baseline());
                (rating, r.rank)
            })
            .collect();

        let posterior = trueskill::rate(&self.config, &prior);

        let snapshots: Vec<NewRatingSnapshot> = ranking
            .iter()
            .zip(posterior)
            .map(|(r, rating)| NewRatingSnapshot {
                player_id: r.player_id,
                mu: rating.mu,
                sigma: rating.sigma,
                based_on: latest.get(&r.player_id).map(|s| s.snapshot_id),
            })
            .collect();

        let appended = self
            .store
            .append_snapshots(group_id, Some(challenge_id), &snapshots)
            .await?;

        info!(
            %group_id,
            %challenge_id,
            snapshots = appended.len(),
            "ratings updated"
        );

        Ok(RatingUpdate::Applied(appended))
    }

    /// Appends the configured baseline for a player who has no snapshot in
    /// the group yet. Returns `None` when one already exists.
    pub async fn seed_baseline(&self, group_id: Uuid, player_id: Uuid) -> Result<Option<RatingSnapshot>> {
        let _guard = self.locks.acquire(group_id).await?;

        let latest = self.store.latest_snapshots(group_id, &[player_id]).await?;
        if latest.contains_key(&player_id) {
            return Ok(None);
        }

        let baseline = self.config.baseline();
        let appended = self
            .store
            .append_snapshots(
                group_id,
                None,
                &[NewRatingSnapshot {
                    player_id,
                    mu: baseline.mu,
                    sigma: baseline.sigma,
                    based_on: None,
                }],
            )
            .await?;

        Ok(appended.into_iter().next())
    }
}
