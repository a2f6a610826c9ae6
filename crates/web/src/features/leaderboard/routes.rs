use axum::{Router, routing::get};

use super::handlers::{get_history, get_player_ratings, get_standings};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/groups/:group_id/standings", get(get_standings))
        .route("/api/groups/:group_id/history", get(get_history))
        .route(
            "/api/groups/:group_id/players/:player_id/ratings",
            get(get_player_ratings),
        )
}
