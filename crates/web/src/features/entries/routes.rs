use axum::{Router, middleware, routing::put};

use super::handlers::{score_entry, submit_entry};
use crate::middleware::auth::{ApiKeys, require_auth};
use crate::state::AppState;

pub fn routes(api_keys: ApiKeys) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/entries/:entry_id/score", put(score_entry))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route(
            "/api/prompts/:prompt_id/entries/:player_id",
            put(submit_entry),
        )
        .merge(protected)
}
