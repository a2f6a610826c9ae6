use axum::{
    Json,
    extract::Path,
    response::{IntoResponse, Response},
};
use gifoff_storage::dto::bracket::BracketResponse;

use crate::error::WebError;

use super::services;

#[utoipa::path(
    get,
    path = "/api/brackets/{player_count}",
    params(
        ("player_count" = u32, Path, description = "Number of players, 2 to 64")
    ),
    responses(
        (status = 200, description = "Seeded bracket", body = BracketResponse),
        (status = 400, description = "Player count out of range")
    ),
    tag = "brackets"
)]
pub async fn get_bracket(Path(player_count): Path<u32>) -> Result<Response, WebError> {
    let bracket = services::build_bracket(player_count)?;

    Ok(Json(bracket).into_response())
}
