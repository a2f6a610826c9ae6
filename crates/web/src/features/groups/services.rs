use gifoff_storage::{
    dto::group::{CreateGroupRequest, CreatePlayerRequest, MembershipResponse},
    error::Result,
    models::{Group, Player},
    services::GroupService,
};
use uuid::Uuid;

/// Create a new group
pub async fn create_group(groups: &GroupService, request: CreateGroupRequest) -> Result<Group> {
    groups.create_group(request.into()).await
}

/// Register a player
pub async fn create_player(groups: &GroupService, request: CreatePlayerRequest) -> Result<Player> {
    groups.create_player(request.into()).await
}

/// Add a player to a group
pub async fn add_member(
    groups: &GroupService,
    group_id: Uuid,
    player_id: Uuid,
) -> Result<MembershipResponse> {
    groups.join_group(group_id, player_id).await
}
