use gifoff_storage::{dto::bracket::BracketResponse, error::Result, services::bracket};

/// Seeded single-elimination bracket for `player_count` players
pub fn build_bracket(player_count: u32) -> Result<BracketResponse> {
    bracket::build(player_count).map(BracketResponse::from)
}
