use axum::{Router, routing::get};

use super::handlers::get_bracket;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/brackets/:player_count", get(get_bracket))
}
