//! Score aggregation and winner resolution for a single challenge.

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::SliceRandom;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Entry;

/// Sum of one participant's scored entries.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PlayerTotal {
    pub player_id: Uuid,
    pub total: Decimal,
    pub entries: usize,
}

/// Outcome of resolving a challenge.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Resolution {
    /// Highest total, rounded to a whole number. Zero when there is no winner.
    pub high_score: Decimal,
    pub winner: Option<Uuid>,
}

impl Resolution {
    fn none() -> Self {
        Self {
            high_score: Decimal::ZERO,
            winner: None,
        }
    }
}

/// A participant's place in the final order. Tied players share a rank.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RankedPlayer {
    pub player_id: Uuid,
    pub total: Decimal,
    pub rank: u32,
}

/// Totals per participant, ordered by player id.
///
/// Every player holding an entry participates. An unscored entry adds nothing
/// to the total but still counts as participation.
pub fn tally(entries: &[Entry]) -> Vec<PlayerTotal> {
    let mut totals: BTreeMap<Uuid, PlayerTotal> = BTreeMap::new();

    for entry in entries {
        let total = totals.entry(entry.player_id).or_insert_with(|| PlayerTotal {
            player_id: entry.player_id,
            total: Decimal::ZERO,
            entries: 0,
        });
        total.total += entry.score.unwrap_or(Decimal::ZERO);
        total.entries += 1;
    }

    totals.into_values().collect()
}

/// Picks the winner uniformly among the participants tied at the top total.
///
/// No participants, or a top total of zero or less, yields no winner.
pub fn resolve<R: Rng + ?Sized>(totals: &[PlayerTotal], rng: &mut R) -> Resolution {
    let Some(max) = totals.iter().map(|t| t.total).max() else {
        return Resolution::none();
    };

    if max <= Decimal::ZERO {
        return Resolution::none();
    }

    let leaders: Vec<Uuid> = totals
        .iter()
        .filter(|t| t.total == max)
        .map(|t| t.player_id)
        .collect();

    match leaders.choose(rng) {
        Some(&winner) => Resolution {
            high_score: max.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
            winner: Some(winner),
        },
        None => Resolution::none(),
    }
}

/// Orders participants for the rating update.
///
/// The winner takes rank 1 alone. Everyone else follows by descending total,
/// tied totals sharing a rank, so a player tied with the winner on points
/// still ranks second.
pub fn rank_participants(totals: &[PlayerTotal], winner: Uuid) -> Vec<RankedPlayer> {
    let mut ranked = Vec::with_capacity(totals.len());

    if let Some(w) = totals.iter().find(|t| t.player_id == winner) {
        ranked.push(RankedPlayer {
            player_id: w.player_id,
            total: w.total,
            rank: 1,
        });
    }

    let mut rest: Vec<&PlayerTotal> = totals.iter().filter(|t| t.player_id != winner).collect();
    rest.sort_by(|a, b| b.total.cmp(&a.total).then(a.player_id.cmp(&b.player_id)));

    let mut previous: Option<(Decimal, u32)> = None;
    for (i, t) in rest.into_iter().enumerate() {
        let position = i as u32 + 2;
        let rank = match previous {
            Some((total, rank)) if total == t.total => rank,
            _ => position,
        };
        previous = Some((t.total, rank));
        ranked.push(RankedPlayer {
            player_id: t.player_id,
            total: t.total,
            rank,
        });
    }

    ranked
}

/// Highest score among a prompt's scored entries.
pub fn prompt_high_score(entries: &[Entry], prompt_id: Uuid) -> Option<Decimal> {
    entries
        .iter()
        .filter(|e| e.prompt_id == prompt_id)
        .filter_map(|e| e.score)
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn dec(n: i64) -> Decimal {
        Decimal::from(n)
    }

    fn entry(player: Uuid, prompt: Uuid, score: Option<i64>) -> Entry {
        Entry {
            entry_id: Uuid::new_v4(),
            prompt_id: prompt,
            player_id: player,
            url: None,
            score: score.map(Decimal::from),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn total(player: Uuid, points: i64) -> PlayerTotal {
        PlayerTotal {
            player_id: player,
            total: dec(points),
            entries: 1,
        }
    }

    #[test]
    fn test_tally_sums_across_prompts_and_counts_unscored() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let (p1, p2) = (Uuid::new_v4(), Uuid::new_v4());
        let entries = vec![
            entry(a, p1, Some(3)),
            entry(a, p2, Some(4)),
            entry(b, p1, None),
        ];

        let totals = tally(&entries);
        assert_eq!(totals.len(), 2);

        let a_total = totals.iter().find(|t| t.player_id == a).unwrap();
        assert_eq!(a_total.total, dec(7));
        assert_eq!(a_total.entries, 2);

        let b_total = totals.iter().find(|t| t.player_id == b).unwrap();
        assert_eq!(b_total.total, Decimal::ZERO);
    }

    #[test]
    fn test_no_participants_means_no_winner() {
        let mut rng = StdRng::seed_from_u64(1);
        let resolution = resolve(&[], &mut rng);
        assert_eq!(resolution.winner, None);
        assert_eq!(resolution.high_score, Decimal::ZERO);
    }

    #[test]
    fn test_zero_scores_mean_no_winner() {
        let mut rng = StdRng::seed_from_u64(1);
        let totals = vec![total(Uuid::new_v4(), 0), total(Uuid::new_v4(), 0)];
        assert_eq!(resolve(&totals, &mut rng).winner, None);
    }

    #[test]
    fn test_clear_leader_wins() {
        let mut rng = StdRng::seed_from_u64(7);
        let leader = Uuid::new_v4();
        let totals = vec![total(Uuid::new_v4(), 3), total(leader, 9)];

        let resolution = resolve(&totals, &mut rng);
        assert_eq!(resolution.winner, Some(leader));
        assert_eq!(resolution.high_score, dec(9));
    }

    #[test]
    fn test_high_score_is_rounded() {
        let mut rng = StdRng::seed_from_u64(7);
        let leader = Uuid::new_v4();
        let totals = vec![PlayerTotal {
            player_id: leader,
            total: Decimal::new(75, 1),
            entries: 2,
        }];
        assert_eq!(resolve(&totals, &mut rng).high_score, dec(8));
    }

    #[test]
    fn test_tie_break_is_uniform_among_leaders() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let totals = vec![total(a, 10), total(b, 10), total(c, 5)];

        let mut a_wins = 0;
        let mut b_wins = 0;
        for seed in 0..2000 {
            let mut rng = StdRng::seed_from_u64(seed);
            match resolve(&totals, &mut rng).winner {
                Some(w) if w == a => a_wins += 1,
                Some(w) if w == b => b_wins += 1,
                other => panic!("unexpected winner {other:?}"),
            }
        }

        assert!((850..=1150).contains(&a_wins), "a won {a_wins} times");
        assert!((850..=1150).contains(&b_wins), "b won {b_wins} times");
    }

    #[test]
    fn test_same_seed_same_winner() {
        let totals: Vec<_> = (0..5).map(|_| total(Uuid::new_v4(), 4)).collect();
        let first = resolve(&totals, &mut StdRng::seed_from_u64(42));
        let second = resolve(&totals, &mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }

    #[test]
    fn test_ranking_puts_winner_first_and_shares_ties() {
        let (w, x, y, z) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let totals = vec![total(w, 10), total(x, 10), total(y, 4), total(z, 4)];

        let ranking = rank_participants(&totals, w);
        let ranks: Vec<(Uuid, u32)> = ranking.iter().map(|r| (r.player_id, r.rank)).collect();

        assert_eq!(ranks[0], (w, 1));
        assert_eq!(ranks[1], (x, 2));
        assert_eq!(ranks[2].1, 3);
        assert_eq!(ranks[3].1, 3);
    }

    #[test]
    fn test_prompt_high_score_ignores_unscored() {
        let prompt = Uuid::new_v4();
        let entries = vec![
            entry(Uuid::new_v4(), prompt, None),
            entry(Uuid::new_v4(), prompt, Some(6)),
            entry(Uuid::new_v4(), Uuid::new_v4(), Some(9)),
        ];
        assert_eq!(prompt_high_score(&entries, prompt), Some(dec(6)));
        assert_eq!(prompt_high_score(&entries, Uuid::new_v4()), None);
    }
}
