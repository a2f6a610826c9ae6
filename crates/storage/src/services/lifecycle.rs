//! Challenge creation, derived views and the close transition.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{info, warn};
use uuid::Uuid;

use super::notify::{ChallengeClosed, NotificationDispatcher};
use super::rating::{RatingEngine, RatingUpdate};
use super::scoring;
use crate::dto::challenge::{
    ChallengeDetail, ChallengeSummary, CloseOutcome, PromptDetail, RatingOutcome,
};
use crate::error::{ConflictKind, Result, StorageError};
use crate::models::{Challenge, NewChallenge, Prompt, TimeWindow};
use crate::store::LeagueStore;

pub struct ChallengeLifecycle {
    store: Arc<dyn LeagueStore>,
    ratings: Arc<RatingEngine>,
    notifier: Option<Arc<NotificationDispatcher>>,
}

impl ChallengeLifecycle {
    pub fn new(store: Arc<dyn LeagueStore>, ratings: Arc<RatingEngine>) -> Self {
        Self {
            store,
            ratings,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<NotificationDispatcher>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// The author must already belong to the group.
    pub async fn create_challenge(
        &self,
        group_id: Uuid,
        name: String,
        description: Option<String>,
        window: TimeWindow,
        author_id: Uuid,
    ) -> Result<Challenge> {
        self.store.find_group(group_id).await?;
        self.store.find_player(author_id).await?;
        if !self.store.is_member(group_id, author_id).await? {
            return Err(StorageError::Validation(
                "challenge author must be a member of the group".to_string(),
            ));
        }

        let challenge = self
            .store
            .create_challenge(NewChallenge {
                group_id,
                name,
                description,
                window,
                author_id,
            })
            .await?;

        info!(
            group_id = %challenge.group_id,
            challenge_id = %challenge.challenge_id,
            start = %challenge.start_time,
            end = %challenge.end_time,
            "Created challenge '{}'",
            challenge.name
        );
        Ok(challenge)
    }

    pub async fn add_prompt(&self, challenge_id: Uuid, prompt: String) -> Result<Prompt> {
        let challenge = self.store.find_challenge(challenge_id).await?;
        if challenge.is_complete() {
            return Err(StorageError::Conflict(ConflictKind::AlreadyClosed));
        }
        self.store.create_prompt(challenge_id, prompt).await
    }

    /// Newest first.
    pub async fn list(&self, group_id: Uuid, now: DateTime<Utc>) -> Result<Vec<ChallengeSummary>> {
        self.store.find_group(group_id).await?;
        let challenges = self.store.list_challenges(group_id).await?;
        Ok(challenges
            .into_iter()
            .map(|c| ChallengeSummary::at(c, now))
            .collect())
    }

    /// The previous challenge's winner, or the author for the first one.
    pub async fn judge(&self, challenge: &Challenge) -> Result<Uuid> {
        let previous = self.store.previous_challenge(challenge).await?;
        Ok(challenge.judge_id(previous.as_ref()))
    }

    pub async fn detail(&self, challenge_id: Uuid, now: DateTime<Utc>) -> Result<ChallengeDetail> {
        let challenge = self.store.find_challenge(challenge_id).await?;
        let judge_id = self.judge(&challenge).await?;
        let prompts = self.store.challenge_prompts(challenge_id).await?;
        let entries = self.store.challenge_entries(challenge_id).await?;

        let totals = scoring::tally(&entries);
        let high_score = totals.iter().map(|t| t.total).max();

        let prompts = prompts
            .into_iter()
            .map(|prompt| PromptDetail {
                high_score: scoring::prompt_high_score(&entries, prompt.prompt_id),
                entries: entries
                    .iter()
                    .filter(|e| e.prompt_id == prompt.prompt_id)
                    .cloned()
                    .collect(),
                prompt,
            })
            .collect();

        Ok(ChallengeDetail {
            summary: ChallengeSummary::at(challenge, now),
            judge_id,
            prompts,
            totals,
            high_score,
        })
    }

    /// Resolves the winner, records it and rates the participants.
    ///
    /// The winner is committed before the ratings are written. A rating
    /// failure after that point does not undo the close; it is reported as
    /// `RatingOutcome::Deferred` and can be retried with
    /// [`ChallengeLifecycle::retry_ratings`].
    pub async fn close<R: Rng + Send>(&self, challenge_id: Uuid, rng: &mut R) -> Result<CloseOutcome> {
        let challenge = self.store.find_challenge(challenge_id).await?;
        if challenge.is_complete() {
            return Err(StorageError::Conflict(ConflictKind::AlreadyClosed));
        }

        let guard = self.ratings.locks().acquire(challenge.group_id).await?;

        // Another close may have finished while we waited.
        let challenge = self.store.find_challenge(challenge_id).await?;
        if challenge.is_complete() {
            return Err(StorageError::Conflict(ConflictKind::AlreadyClosed));
        }

        let entries = self.store.challenge_entries(challenge_id).await?;
        let totals = scoring::tally(&entries);
        let resolution = scoring::resolve(&totals, rng);

        let Some(winner_id) = resolution.winner else {
            info!(%challenge_id, participants = totals.len(), "close refused, no winner");
            return Err(StorageError::Conflict(ConflictKind::NoWinner));
        };

        let challenge = self.store.record_winner(challenge_id, winner_id).await?;
        info!(
            group_id = %challenge.group_id,
            %challenge_id,
            %winner_id,
            high_score = %resolution.high_score,
            "Closed challenge '{}'",
            challenge.name
        );

        let ranking = scoring::rank_participants(&totals, winner_id);
        let ratings = match self
            .ratings
            .apply_held(&guard, challenge_id, &ranking)
            .await
        {
            Ok(RatingUpdate::Applied(snapshots)) => RatingOutcome::Applied { snapshots },
            Ok(RatingUpdate::Skipped) => RatingOutcome::Skipped,
            Err(e) => {
                warn!(%challenge_id, error = %e, "rating update deferred");
                RatingOutcome::Deferred {
                    reason: e.to_string(),
                }
            }
        };
        drop(guard);

        let mut advisories = Vec::new();
        if let Some(notifier) = &self.notifier {
            advisories.extend(notifier.dispatch(ChallengeClosed {
                group_id: challenge.group_id,
                challenge_id,
                challenge_name: challenge.name.clone(),
                winner_id,
                high_score: resolution.high_score,
            }));
        }

        Ok(CloseOutcome {
            challenge,
            high_score: resolution.high_score,
            ranking,
            ratings,
            advisories,
        })
    }

    /// Re-applies the rating update of a closed challenge.
    ///
    /// The ranking is rebuilt from the stored winner and the entry totals.
    /// Applying twice fails with `Conflict(RatingsAlreadyApplied)`.
    pub async fn retry_ratings(&self, challenge_id: Uuid) -> Result<RatingUpdate> {
        let challenge = self.store.find_challenge(challenge_id).await?;
        let Some(winner_id) = challenge.winner_id else {
            return Err(StorageError::Conflict(ConflictKind::NoWinner));
        };

        let guard = self.ratings.locks().acquire(challenge.group_id).await?;
        let entries = self.store.challenge_entries(challenge_id).await?;
        let ranking = scoring::rank_participants(&scoring::tally(&entries), winner_id);

        self.ratings.apply_held(&guard, challenge_id, &ranking).await
    }
}
