use gifoff_storage::{
    dto::leaderboard::{HistoryTable, Standing},
    error::Result,
    models::RatingSnapshot,
    services::Leaderboard,
};
use uuid::Uuid;

pub async fn get_standings(
    leaderboard: &Leaderboard,
    group_id: Uuid,
    top_k: Option<usize>,
) -> Result<Vec<Standing>> {
    leaderboard.standings(group_id, top_k).await
}

pub async fn get_history(
    leaderboard: &Leaderboard,
    group_id: Uuid,
    limit: Option<i64>,
) -> Result<HistoryTable> {
    leaderboard.history(group_id, limit).await
}

pub async fn get_player_ratings(
    leaderboard: &Leaderboard,
    group_id: Uuid,
    player_id: Uuid,
) -> Result<Vec<RatingSnapshot>> {
    leaderboard.player_history(group_id, player_id).await
}
