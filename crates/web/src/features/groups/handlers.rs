use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gifoff_storage::{
    dto::group::{AddMemberRequest, CreateGroupRequest, CreatePlayerRequest, MembershipResponse},
    models::{Group, Player},
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    post,
    path = "/api/groups",
    request_body = CreateGroupRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Group created successfully", body = Group),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Group name already exists")
    ),
    tag = "groups"
)]
pub async fn create_group(
    State(state): State<AppState>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let group = services::create_group(&state.groups, req).await?;

    Ok((StatusCode::CREATED, Json(group)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/players",
    request_body = CreatePlayerRequest,
    responses(
        (status = 201, description = "Player registered", body = Player),
        (status = 400, description = "Validation error")
    ),
    tag = "groups"
)]
pub async fn create_player(
    State(state): State<AppState>,
    Json(req): Json<CreatePlayerRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let player = services::create_player(&state.groups, req).await?;

    Ok((StatusCode::CREATED, Json(player)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/members",
    params(
        ("group_id" = Uuid, Path, description = "Group id")
    ),
    request_body = AddMemberRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Player joined the group", body = MembershipResponse),
        (status = 200, description = "Player was already a member", body = MembershipResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Group or player not found")
    ),
    tag = "groups"
)]
pub async fn add_member(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> Result<Response, WebError> {
    let membership = services::add_member(&state.groups, group_id, req.player_id).await?;

    let status = if membership.joined {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(membership)).into_response())
}
