use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gifoff_storage::{
    dto::challenge::{
        ChallengeDetail, ChallengeSummary, CloseOutcome, CreateChallengeRequest,
        CreatePromptRequest, RatingOutcome,
    },
    models::Prompt,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/challenges",
    params(
        ("group_id" = Uuid, Path, description = "Group id")
    ),
    responses(
        (status = 200, description = "Challenges of the group, newest first", body = Vec<ChallengeSummary>),
        (status = 404, description = "Group not found")
    ),
    tag = "challenges"
)]
pub async fn list_challenges(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
) -> Result<Json<Vec<ChallengeSummary>>, WebError> {
    let challenges = services::list_challenges(&state.lifecycle, group_id).await?;

    Ok(Json(challenges))
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/challenges",
    params(
        ("group_id" = Uuid, Path, description = "Group id")
    ),
    request_body = CreateChallengeRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Challenge created successfully", body = ChallengeSummary),
        (status = 400, description = "Validation error or malformed time window"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Group or author not found")
    ),
    tag = "challenges"
)]
pub async fn create_challenge(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Json(req): Json<CreateChallengeRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let challenge = services::create_challenge(&state.lifecycle, group_id, req).await?;

    Ok((StatusCode::CREATED, Json(challenge)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/challenges/{challenge_id}",
    params(
        ("challenge_id" = Uuid, Path, description = "Challenge id")
    ),
    responses(
        (status = 200, description = "Challenge with phase, judge, prompts and totals", body = ChallengeDetail),
        (status = 404, description = "Challenge not found")
    ),
    tag = "challenges"
)]
pub async fn get_challenge(
    State(state): State<AppState>,
    Path(challenge_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let detail = services::get_challenge(&state.lifecycle, challenge_id).await?;

    Ok(Json(detail).into_response())
}

#[utoipa::path(
    post,
    path = "/api/challenges/{challenge_id}/prompts",
    params(
        ("challenge_id" = Uuid, Path, description = "Challenge id")
    ),
    request_body = CreatePromptRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Prompt added", body = Prompt),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Challenge not found"),
        (status = 409, description = "Challenge already closed")
    ),
    tag = "challenges"
)]
pub async fn add_prompt(
    State(state): State<AppState>,
    Path(challenge_id): Path<Uuid>,
    Json(req): Json<CreatePromptRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let prompt = services::add_prompt(&state.lifecycle, challenge_id, req.prompt).await?;

    Ok((StatusCode::CREATED, Json(prompt)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/challenges/{challenge_id}/close",
    params(
        ("challenge_id" = Uuid, Path, description = "Challenge id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Challenge closed; ratings applied, skipped or deferred", body = CloseOutcome),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Challenge not found"),
        (status = 409, description = "Already closed, or no winner could be resolved"),
        (status = 503, description = "Group busy, retry")
    ),
    tag = "challenges"
)]
pub async fn close_challenge(
    State(state): State<AppState>,
    Path(challenge_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let outcome = services::close_challenge(&state.lifecycle, challenge_id).await?;

    Ok(Json(outcome).into_response())
}

#[utoipa::path(
    post,
    path = "/api/challenges/{challenge_id}/ratings",
    params(
        ("challenge_id" = Uuid, Path, description = "Challenge id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Ratings applied", body = RatingOutcome),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Challenge not found"),
        (status = 409, description = "Not closed yet, or ratings already applied"),
        (status = 503, description = "Group busy, retry")
    ),
    tag = "challenges"
)]
pub async fn retry_ratings(
    State(state): State<AppState>,
    Path(challenge_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let outcome = services::retry_ratings(&state.lifecycle, challenge_id).await?;

    Ok(Json(outcome).into_response())
}
