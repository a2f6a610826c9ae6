use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{Result, StorageError};

/// Length of a challenge created without an explicit window.
pub const DEFAULT_CHALLENGE_HOURS: i64 = 4;

/// Lifecycle state of a challenge, derived on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Upcoming,
    Active,
    Pending,
    Complete,
}

impl Phase {
    /// Pure function of the clock, the planned window and the winner.
    ///
    /// A recorded winner always wins over the clock. Both window edges count
    /// as `Active`; only strictly before `start` or strictly after `end`
    /// leaves it.
    pub fn at(
        now: DateTime<Utc>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        winner: Option<Uuid>,
    ) -> Self {
        if winner.is_some() {
            Phase::Complete
        } else if now < start {
            Phase::Upcoming
        } else if now > end {
            Phase::Pending
        } else {
            Phase::Active
        }
    }

    pub fn accepts_entries(self) -> bool {
        self == Phase::Active
    }
}

/// A validated `[start, end)` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end <= start {
            return Err(StorageError::Validation(
                "challenge must end after it starts".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// The window used when a challenge is created without one.
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: start + Duration::hours(DEFAULT_CHALLENGE_HOURS),
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Challenge {
    pub challenge_id: Uuid,
    pub group_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub author_id: Uuid,
    pub winner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Challenge {
    pub fn phase(&self, now: DateTime<Utc>) -> Phase {
        Phase::at(now, self.start_time, self.end_time, self.winner_id)
    }

    pub fn is_complete(&self) -> bool {
        self.winner_id.is_some()
    }

    /// The winner of the previous challenge in the group judges this one;
    /// without one the author judges.
    pub fn judge_id(&self, previous: Option<&Challenge>) -> Uuid {
        previous
            .and_then(|c| c.winner_id)
            .unwrap_or(self.author_id)
    }

    /// Time remaining until the window ends, never negative.
    pub fn time_left(&self, now: DateTime<Utc>) -> Duration {
        let left = self.end_time - now;
        if left < Duration::zero() {
            Duration::zero()
        } else {
            left
        }
    }
}

/// Renders a duration as `H:MM:SS`, dropping fractional seconds.
pub fn format_time_left(left: Duration) -> String {
    let total = left.num_seconds().max(0);
    format!(
        "{}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

#[derive(Debug, Clone)]
pub struct NewChallenge {
    pub group_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub window: TimeWindow,
    pub author_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_phase_follows_clock() {
        assert_eq!(Phase::at(t(1), t(2), t(4), None), Phase::Upcoming);
        assert_eq!(Phase::at(t(3), t(2), t(4), None), Phase::Active);
        assert_eq!(Phase::at(t(5), t(2), t(4), None), Phase::Pending);
    }

    #[test]
    fn test_phase_window_edges_are_active() {
        assert_eq!(Phase::at(t(2), t(2), t(4), None), Phase::Active);
        assert_eq!(Phase::at(t(4), t(2), t(4), None), Phase::Active);
    }

    #[test]
    fn test_winner_means_complete_at_any_time() {
        let winner = Some(Uuid::new_v4());
        for hour in [1, 3, 5] {
            assert_eq!(Phase::at(t(hour), t(2), t(4), winner), Phase::Complete);
        }
    }

    #[test]
    fn test_phase_is_idempotent() {
        let winner = None;
        let first = Phase::at(t(3), t(2), t(4), winner);
        for _ in 0..10 {
            assert_eq!(Phase::at(t(3), t(2), t(4), winner), first);
        }
    }

    #[test]
    fn test_window_rejects_inverted_or_empty() {
        assert!(TimeWindow::new(t(4), t(2)).is_err());
        assert!(TimeWindow::new(t(2), t(2)).is_err());
        assert!(TimeWindow::new(t(2), t(4)).is_ok());
    }

    #[test]
    fn test_default_window_is_four_hours() {
        let window = TimeWindow::starting_at(t(2));
        assert_eq!(window.end(), t(6));
    }

    fn challenge(author: Uuid, winner: Option<Uuid>) -> Challenge {
        Challenge {
            challenge_id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            name: "gifs".to_string(),
            description: None,
            start_time: t(2),
            end_time: t(4),
            author_id: author,
            winner_id: winner,
            created_at: t(1),
        }
    }

    #[test]
    fn test_judge_is_previous_winner_or_author() {
        let author = Uuid::new_v4();
        let previous_winner = Uuid::new_v4();
        let current = challenge(author, None);

        assert_eq!(current.judge_id(None), author);
        assert_eq!(current.judge_id(Some(&challenge(author, None))), author);
        assert_eq!(
            current.judge_id(Some(&challenge(author, Some(previous_winner)))),
            previous_winner
        );
    }

    #[test]
    fn test_time_left_clamps_and_formats() {
        let c = challenge(Uuid::new_v4(), None);
        assert_eq!(c.time_left(t(5)), Duration::zero());
        assert_eq!(format_time_left(c.time_left(t(3))), "1:00:00");
        assert_eq!(format_time_left(Duration::seconds(3725)), "1:02:05");
    }
}
