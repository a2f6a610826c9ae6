//! Standings and rating history built from the snapshot log.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use super::trueskill::RatingConfig;
use crate::dto::leaderboard::{HistoryColumn, HistoryRow, HistoryTable, Standing};
use crate::error::Result;
use crate::models::{Challenge, Player, RatingSnapshot};
use crate::store::LeagueStore;

pub const DEFAULT_HISTORY_LIMIT: i64 = 5;

const BASELINE_LABEL: &str = "Baseline";
const CURRENT_LABEL: &str = "Current Standings";

/// Current members ordered by descending mean.
///
/// Members without a snapshot stand at the baseline. Equal means fall back
/// to display name so the order is stable.
pub fn build_standings(
    members: &[Player],
    latest: &HashMap<Uuid, RatingSnapshot>,
    config: &RatingConfig,
    top_k: Option<usize>,
) -> Vec<Standing> {
    let mut rows: Vec<(&Player, f64, f64)> = members
        .iter()
        .map(|p| match latest.get(&p.player_id) {
            Some(s) => (p, s.mu, s.sigma),
            None => (p, config.mu, config.sigma),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.1.total_cmp(&a.1)
            .then_with(|| a.0.display_name.to_lowercase().cmp(&b.0.display_name.to_lowercase()))
            .then(a.0.player_id.cmp(&b.0.player_id))
    });

    rows.into_iter()
        .take(top_k.unwrap_or(usize::MAX))
        .enumerate()
        .map(|(i, (player, mu, sigma))| Standing {
            rank: i as u32 + 1,
            player_id: player.player_id,
            display_name: player.display_name.clone(),
            mu,
            sigma,
        })
        .collect()
}

/// Chart-ready table of means over the most recent challenges.
///
/// Columns are current members sorted case-insensitively by name. Rows are a
/// baseline, then one row per challenge in chronological order, then the
/// current standings when at least one challenge is shown. Players who did
/// not take part in a challenge get `None` in its row.
pub fn build_history(
    members: &[Player],
    challenges: &[Challenge],
    snapshots: &[RatingSnapshot],
    latest: &HashMap<Uuid, RatingSnapshot>,
    baseline_mu: f64,
) -> HistoryTable {
    let mut columns: Vec<HistoryColumn> = members
        .iter()
        .map(|p| HistoryColumn {
            player_id: p.player_id,
            display_name: p.display_name.clone(),
        })
        .collect();
    columns.sort_by(|a, b| {
        a.display_name
            .to_lowercase()
            .cmp(&b.display_name.to_lowercase())
            .then(a.player_id.cmp(&b.player_id))
    });

    let by_challenge: HashMap<(Uuid, Uuid), f64> = snapshots
        .iter()
        .filter_map(|s| s.challenge_id.map(|c| ((c, s.player_id), s.mu)))
        .collect();

    let mut rows = Vec::with_capacity(challenges.len() + 2);
    rows.push(HistoryRow {
        label: BASELINE_LABEL.to_string(),
        challenge_id: None,
        values: columns.iter().map(|_| Some(baseline_mu)).collect(),
    });

    for challenge in challenges {
        rows.push(HistoryRow {
            label: challenge.name.clone(),
            challenge_id: Some(challenge.challenge_id),
            values: columns
                .iter()
                .map(|c| by_challenge.get(&(challenge.challenge_id, c.player_id)).copied())
                .collect(),
        });
    }

    if !challenges.is_empty() {
        rows.push(HistoryRow {
            label: CURRENT_LABEL.to_string(),
            challenge_id: None,
            values: columns
                .iter()
                .map(|c| Some(latest.get(&c.player_id).map_or(baseline_mu, |s| s.mu)))
                .collect(),
        });
    }

    HistoryTable { columns, rows }
}

pub struct Leaderboard {
    store: Arc<dyn LeagueStore>,
    config: RatingConfig,
}

impl Leaderboard {
    pub fn new(store: Arc<dyn LeagueStore>, config: RatingConfig) -> Self {
        Self { store, config }
    }

    pub async fn standings(&self, group_id: Uuid, top_k: Option<usize>) -> Result<Vec<Standing>> {
        self.store.find_group(group_id).await?;
        let members = self.store.group_members(group_id).await?;
        let ids: Vec<Uuid> = members.iter().map(|p| p.player_id).collect();
        let latest = self.store.latest_snapshots(group_id, &ids).await?;

        Ok(build_standings(&members, &latest, &self.config, top_k))
    }

    pub async fn history(&self, group_id: Uuid, limit: Option<i64>) -> Result<HistoryTable> {
        self.store.find_group(group_id).await?;
        let members = self.store.group_members(group_id).await?;
        let ids: Vec<Uuid> = members.iter().map(|p| p.player_id).collect();

        let mut challenges = self
            .store
            .recent_completed_challenges(group_id, limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
            .await?;
        challenges.reverse();

        let challenge_ids: Vec<Uuid> = challenges.iter().map(|c| c.challenge_id).collect();
        let snapshots = self.store.challenge_snapshots(&challenge_ids).await?;
        let latest = self.store.latest_snapshots(group_id, &ids).await?;

        Ok(build_history(
            &members,
            &challenges,
            &snapshots,
            &latest,
            self.config.mu,
        ))
    }

    /// Every snapshot of one player in the group, oldest first.
    pub async fn player_history(&self, group_id: Uuid, player_id: Uuid) -> Result<Vec<RatingSnapshot>> {
        self.store.find_group(group_id).await?;
        self.store.find_player(player_id).await?;
        self.store.player_snapshots(group_id, player_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn player(name: &str) -> Player {
        Player {
            player_id: Uuid::new_v4(),
            display_name: name.to_string(),
            email: None,
            created_at: Utc::now(),
        }
    }

    fn snapshot(player: &Player, challenge_id: Option<Uuid>, seq: i64, mu: f64) -> RatingSnapshot {
        RatingSnapshot {
            snapshot_id: Uuid::new_v4(),
            snapshot_seq: seq,
            group_id: Uuid::nil(),
            challenge_id,
            player_id: player.player_id,
            mu,
            sigma: 6.0,
            created_at: Utc::now(),
        }
    }

    fn challenge(name: &str) -> Challenge {
        let now = Utc::now();
        Challenge {
            challenge_id: Uuid::new_v4(),
            group_id: Uuid::nil(),
            name: name.to_string(),
            description: None,
            start_time: now,
            end_time: now + chrono::Duration::hours(4),
            author_id: Uuid::new_v4(),
            winner_id: Some(Uuid::new_v4()),
            created_at: now,
        }
    }

    #[test]
    fn test_standings_ordered_by_mu() {
        let (ann, bob, cal) = (player("ann"), player("Bob"), player("cal"));
        let latest = HashMap::from([
            (ann.player_id, snapshot(&ann, None, 1, 22.0)),
            (bob.player_id, snapshot(&bob, None, 2, 31.5)),
        ]);

        let standings = build_standings(
            &[ann.clone(), bob.clone(), cal.clone()],
            &latest,
            &RatingConfig::default(),
            None,
        );

        let order: Vec<&str> = standings.iter().map(|s| s.display_name.as_str()).collect();
        assert_eq!(order, vec!["Bob", "cal", "ann"]);
        assert_eq!(standings[1].mu, 25.0);
        assert_eq!(standings.iter().map(|s| s.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_standings_top_k() {
        let members = vec![player("a"), player("b"), player("c")];
        let standings = build_standings(&members, &HashMap::new(), &RatingConfig::default(), Some(2));
        assert_eq!(standings.len(), 2);
    }

    #[test]
    fn test_history_without_challenges_is_baseline_only() {
        let members = vec![player("zed"), player("Amy")];
        let table = build_history(&members, &[], &[], &HashMap::new(), 25.0);

        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].label, "Baseline");
        assert_eq!(table.rows[0].values, vec![Some(25.0), Some(25.0)]);

        let names: Vec<&str> = table.columns.iter().map(|c| c.display_name.as_str()).collect();
        assert_eq!(names, vec!["Amy", "zed"]);
    }

    #[test]
    fn test_history_marks_absent_players() {
        let (amy, ben) = (player("amy"), player("ben"));
        let first = challenge("First");
        let second = challenge("Second");

        let snapshots = vec![
            snapshot(&amy, Some(first.challenge_id), 1, 27.0),
            snapshot(&ben, Some(first.challenge_id), 2, 23.0),
            snapshot(&amy, Some(second.challenge_id), 3, 28.5),
        ];
        let latest = HashMap::from([
            (amy.player_id, snapshots[2].clone()),
            (ben.player_id, snapshots[1].clone()),
        ]);

        let table = build_history(
            &[amy.clone(), ben.clone()],
            &[first.clone(), second.clone()],
            &snapshots,
            &latest,
            25.0,
        );

        let labels: Vec<&str> = table.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Baseline", "First", "Second", "Current Standings"]);
        assert_eq!(table.rows[1].values, vec![Some(27.0), Some(23.0)]);
        assert_eq!(table.rows[2].values, vec![Some(28.5), None]);
        assert_eq!(table.rows[3].values, vec![Some(28.5), Some(23.0)]);
        assert!(table.rows.iter().all(|r| r.values.len() == table.columns.len()));
    }

    #[test]
    fn test_history_ignores_former_members() {
        let amy = player("amy");
        let gone = player("gone");
        let first = challenge("First");
        let snapshots = vec![
            snapshot(&amy, Some(first.challenge_id), 1, 26.0),
            snapshot(&gone, Some(first.challenge_id), 2, 24.0),
        ];

        let table = build_history(&[amy.clone()], &[first], &snapshots, &HashMap::new(), 25.0);
        assert_eq!(table.columns.len(), 1);
        assert_eq!(table.rows[1].values, vec![Some(26.0)]);
        assert_eq!(table.rows[2].values, vec![Some(25.0)]);
    }
}
