use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Immutable skill belief for one player in one group.
///
/// Snapshots are only ever inserted. The current rating of a player is the
/// snapshot with the highest `snapshot_seq` for that `(group_id, player_id)`.
/// A snapshot without a challenge is the baseline written when the player
/// joined the group.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RatingSnapshot {
    pub snapshot_id: Uuid,
    pub snapshot_seq: i64,
    pub group_id: Uuid,
    pub challenge_id: Option<Uuid>,
    pub player_id: Uuid,
    pub mu: f64,
    pub sigma: f64,
    pub created_at: DateTime<Utc>,
}

/// A snapshot waiting to be appended.
///
/// `based_on` is the snapshot the new belief was computed from; the append is
/// refused when a newer snapshot for the player has appeared in the meantime.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRatingSnapshot {
    pub player_id: Uuid,
    pub mu: f64,
    pub sigma: f64,
    pub based_on: Option<Uuid>,
}
