use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::handlers::{
    add_prompt, close_challenge, create_challenge, get_challenge, list_challenges, retry_ratings,
};
use crate::middleware::auth::{ApiKeys, require_auth};
use crate::state::AppState;

pub fn routes(api_keys: ApiKeys) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/groups/:group_id/challenges", post(create_challenge))
        .route("/api/challenges/:challenge_id/prompts", post(add_prompt))
        .route("/api/challenges/:challenge_id/close", post(close_challenge))
        .route("/api/challenges/:challenge_id/ratings", post(retry_ratings))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/api/groups/:group_id/challenges", get(list_challenges))
        .route("/api/challenges/:challenge_id", get(get_challenge))
        .merge(protected)
}
