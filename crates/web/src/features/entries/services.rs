use chrono::Utc;
use gifoff_storage::{
    dto::entry::{ScoreEntryRequest, SubmitEntryRequest},
    error::Result,
    models::Entry,
    services::EntryService,
};
use uuid::Uuid;

/// Create or replace a player's entry for a prompt
pub async fn submit_entry(
    entries: &EntryService,
    prompt_id: Uuid,
    player_id: Uuid,
    request: SubmitEntryRequest,
) -> Result<Entry> {
    entries
        .submit_entry(prompt_id, player_id, request.url.trim().to_string(), Utc::now())
        .await
}

/// Set or clear an entry's score
pub async fn score_entry(
    entries: &EntryService,
    entry_id: Uuid,
    request: &ScoreEntryRequest,
) -> Result<Entry> {
    entries.score_entry(entry_id, request.score).await
}
