use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use gifoff_storage::{
    dto::leaderboard::{HistoryQuery, HistoryTable, Standing, StandingsQuery},
    models::RatingSnapshot,
};
use uuid::Uuid;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/standings",
    params(
        ("group_id" = Uuid, Path, description = "Group id"),
        StandingsQuery
    ),
    responses(
        (status = 200, description = "Members ordered by skill mean", body = Vec<Standing>),
        (status = 404, description = "Group not found")
    ),
    tag = "leaderboard"
)]
pub async fn get_standings(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Query(query): Query<StandingsQuery>,
) -> Result<Response, WebError> {
    let standings = services::get_standings(&state.leaderboard, group_id, query.top_k).await?;

    Ok(Json(standings).into_response())
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/history",
    params(
        ("group_id" = Uuid, Path, description = "Group id"),
        HistoryQuery
    ),
    responses(
        (status = 200, description = "Skill means over the most recent challenges", body = HistoryTable),
        (status = 400, description = "Invalid query parameters"),
        (status = 404, description = "Group not found")
    ),
    tag = "leaderboard"
)]
pub async fn get_history(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Response, WebError> {
    query.validate().map_err(WebError::BadRequest)?;

    let history = services::get_history(&state.leaderboard, group_id, query.limit).await?;

    Ok(Json(history).into_response())
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/players/{player_id}/ratings",
    params(
        ("group_id" = Uuid, Path, description = "Group id"),
        ("player_id" = Uuid, Path, description = "Player id")
    ),
    responses(
        (status = 200, description = "Every rating snapshot of the player, oldest first", body = Vec<RatingSnapshot>),
        (status = 404, description = "Group or player not found")
    ),
    tag = "leaderboard"
)]
pub async fn get_player_ratings(
    State(state): State<AppState>,
    Path((group_id, player_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, WebError> {
    let snapshots = services::get_player_ratings(&state.leaderboard, group_id, player_id).await?;

    Ok(Json(snapshots).into_response())
}
