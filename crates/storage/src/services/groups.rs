//! Groups, players and membership.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::rating::RatingEngine;
use crate::dto::group::MembershipResponse;
use crate::error::Result;
use crate::models::{Group, NewGroup, NewPlayer, Player};
use crate::store::LeagueStore;

pub struct GroupService {
    store: Arc<dyn LeagueStore>,
    ratings: Arc<RatingEngine>,
}

impl GroupService {
    pub fn new(store: Arc<dyn LeagueStore>, ratings: Arc<RatingEngine>) -> Self {
        Self { store, ratings }
    }

    pub async fn create_group(&self, group: NewGroup) -> Result<Group> {
        let group = self.store.create_group(group).await?;
        info!(group_id = %group.group_id, "Created group '{}'", group.name);
        Ok(group)
    }

    pub async fn create_player(&self, player: NewPlayer) -> Result<Player> {
        self.store.create_player(player).await
    }

    /// Adds the player to the group. Idempotent; a first-time member also
    /// gets a baseline rating snapshot.
    pub async fn join_group(&self, group_id: Uuid, player_id: Uuid) -> Result<MembershipResponse> {
        let joined = self.store.add_member(group_id, player_id).await?;
        let baseline = self.ratings.seed_baseline(group_id, player_id).await?;

        if joined {
            info!(%group_id, %player_id, "player joined group");
        }

        Ok(MembershipResponse {
            group_id,
            player_id,
            joined,
            baseline,
        })
    }
}
