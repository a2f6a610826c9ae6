use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use gifoff_storage::{
    dto::entry::{ScoreEntryRequest, SubmitEntryRequest},
    models::Entry,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    put,
    path = "/api/prompts/{prompt_id}/entries/{player_id}",
    params(
        ("prompt_id" = Uuid, Path, description = "Prompt id"),
        ("player_id" = Uuid, Path, description = "Player id")
    ),
    request_body = SubmitEntryRequest,
    responses(
        (status = 200, description = "Entry stored", body = Entry),
        (status = 400, description = "Invalid URL or player not in the group"),
        (status = 404, description = "Prompt or player not found"),
        (status = 409, description = "Challenge is not accepting entries")
    ),
    tag = "entries"
)]
pub async fn submit_entry(
    State(state): State<AppState>,
    Path((prompt_id, player_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<SubmitEntryRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let entry = services::submit_entry(&state.entries, prompt_id, player_id, req).await?;

    Ok(Json(entry).into_response())
}

#[utoipa::path(
    put,
    path = "/api/entries/{entry_id}/score",
    params(
        ("entry_id" = Uuid, Path, description = "Entry id")
    ),
    request_body = ScoreEntryRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Score updated", body = Entry),
        (status = 400, description = "Negative score"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Entry not found"),
        (status = 409, description = "Challenge already closed")
    ),
    tag = "entries"
)]
pub async fn score_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    Json(req): Json<ScoreEntryRequest>,
) -> Result<Response, WebError> {
    req.validate_score()
        .map_err(|e| WebError::BadRequest(e.to_string()))?;

    let entry = services::score_entry(&state.entries, entry_id, &req).await?;

    Ok(Json(entry).into_response())
}
