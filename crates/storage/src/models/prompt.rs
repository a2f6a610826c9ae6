use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Prompt {
    pub prompt_id: Uuid,
    pub challenge_id: Uuid,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
}
