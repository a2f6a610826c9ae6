use axum::{Router, middleware, routing::post};

use super::handlers::{add_member, create_group, create_player};
use crate::middleware::auth::{ApiKeys, require_auth};
use crate::state::AppState;

pub fn routes(api_keys: ApiKeys) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/groups", post(create_group))
        .route("/api/groups/:group_id/members", post(add_member))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/api/players", post(create_player))
        .merge(protected)
}
