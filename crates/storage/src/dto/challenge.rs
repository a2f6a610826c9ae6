use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::Result;
use crate::models::{Challenge, Entry, Phase, Prompt, RatingSnapshot, TimeWindow, format_time_left};
use crate::services::scoring::{PlayerTotal, RankedPlayer};

/// Request payload for creating a challenge. A missing window defaults to
/// four hours from its start.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateChallengeRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    pub name: String,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    pub author_id: Uuid,

    pub start_time: Option<DateTime<Utc>>,

    pub end_time: Option<DateTime<Utc>>,
}

impl CreateChallengeRequest {
    pub fn window(&self, now: DateTime<Utc>) -> Result<TimeWindow> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => TimeWindow::new(start, end),
            (Some(start), None) => Ok(TimeWindow::starting_at(start)),
            (None, Some(end)) => TimeWindow::new(now, end),
            (None, None) => Ok(TimeWindow::starting_at(now)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePromptRequest {
    #[validate(length(
        min = 1,
        max = 500,
        message = "Prompt must be between 1 and 500 characters"
    ))]
    pub prompt: String,
}

/// A challenge with the fields derived from the clock.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChallengeSummary {
    #[serde(flatten)]
    pub challenge: Challenge,
    pub phase: Phase,
    /// `H:MM:SS` until the window ends.
    pub time_left: String,
}

impl ChallengeSummary {
    pub fn at(challenge: Challenge, now: DateTime<Utc>) -> Self {
        Self {
            phase: challenge.phase(now),
            time_left: format_time_left(challenge.time_left(now)),
            challenge,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PromptDetail {
    #[serde(flatten)]
    pub prompt: Prompt,
    pub high_score: Option<Decimal>,
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChallengeDetail {
    #[serde(flatten)]
    pub summary: ChallengeSummary,
    pub judge_id: Uuid,
    pub prompts: Vec<PromptDetail>,
    pub totals: Vec<PlayerTotal>,
    /// Highest participant total so far; absent without participants.
    pub high_score: Option<Decimal>,
}

/// What happened to the ratings when a challenge closed.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RatingOutcome {
    Applied { snapshots: Vec<RatingSnapshot> },
    Skipped,
    /// The winner stands; ratings can be re-applied later.
    Deferred { reason: String },
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CloseOutcome {
    pub challenge: Challenge,
    pub high_score: Decimal,
    pub ranking: Vec<RankedPlayer>,
    pub ratings: RatingOutcome,
    /// Non-fatal problems, such as an undelivered notification.
    pub advisories: Vec<String>,
}
