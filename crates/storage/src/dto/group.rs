use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{NewGroup, NewPlayer, RatingSnapshot};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateGroupRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name must be between 1 and 100 characters"
    ))]
    pub name: String,

    #[validate(length(max = 500))]
    pub description: Option<String>,
}

impl From<CreateGroupRequest> for NewGroup {
    fn from(req: CreateGroupRequest) -> Self {
        Self {
            name: req.name.trim().to_string(),
            description: req.description,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePlayerRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Display name must be between 1 and 100 characters"
    ))]
    pub display_name: String,

    #[validate(email)]
    pub email: Option<String>,
}

impl From<CreatePlayerRequest> for NewPlayer {
    fn from(req: CreatePlayerRequest) -> Self {
        Self {
            display_name: req.display_name.trim().to_string(),
            email: req.email,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddMemberRequest {
    pub player_id: Uuid,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MembershipResponse {
    pub group_id: Uuid,
    pub player_id: Uuid,
    /// False when the player was already a member.
    pub joined: bool,
    /// The baseline rating written for a first-time member.
    pub baseline: Option<RatingSnapshot>,
}
