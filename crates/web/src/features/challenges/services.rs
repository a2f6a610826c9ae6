use chrono::Utc;
use gifoff_storage::{
    dto::challenge::{
        ChallengeDetail, ChallengeSummary, CloseOutcome, CreateChallengeRequest, RatingOutcome,
    },
    error::Result,
    models::Prompt,
    services::{ChallengeLifecycle, RatingUpdate},
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use uuid::Uuid;

/// List a group's challenges, newest first
pub async fn list_challenges(
    lifecycle: &ChallengeLifecycle,
    group_id: Uuid,
) -> Result<Vec<ChallengeSummary>> {
    lifecycle.list(group_id, Utc::now()).await
}

/// Create a challenge; the window defaults to four hours from now
pub async fn create_challenge(
    lifecycle: &ChallengeLifecycle,
    group_id: Uuid,
    request: CreateChallengeRequest,
) -> Result<ChallengeSummary> {
    let now = Utc::now();
    let window = request.window(now)?;

    let challenge = lifecycle
        .create_challenge(
            group_id,
            request.name.trim().to_string(),
            request.description,
            window,
            request.author_id,
        )
        .await?;

    Ok(ChallengeSummary::at(challenge, now))
}

/// Get a challenge with its prompts, entries and totals
pub async fn get_challenge(
    lifecycle: &ChallengeLifecycle,
    challenge_id: Uuid,
) -> Result<ChallengeDetail> {
    lifecycle.detail(challenge_id, Utc::now()).await
}

pub async fn add_prompt(
    lifecycle: &ChallengeLifecycle,
    challenge_id: Uuid,
    prompt: String,
) -> Result<Prompt> {
    lifecycle.add_prompt(challenge_id, prompt.trim().to_string()).await
}

/// Close a challenge, breaking ties with a freshly seeded generator
pub async fn close_challenge(
    lifecycle: &ChallengeLifecycle,
    challenge_id: Uuid,
) -> Result<CloseOutcome> {
    let mut rng = StdRng::from_entropy();
    lifecycle.close(challenge_id, &mut rng).await
}

/// Re-apply ratings for a closed challenge
pub async fn retry_ratings(
    lifecycle: &ChallengeLifecycle,
    challenge_id: Uuid,
) -> Result<RatingOutcome> {
    let outcome = match lifecycle.retry_ratings(challenge_id).await? {
        RatingUpdate::Applied(snapshots) => RatingOutcome::Applied { snapshots },
        RatingUpdate::Skipped => RatingOutcome::Skipped,
    };
    Ok(outcome)
}
