//! Single-elimination bracket seeding.

use std::collections::VecDeque;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{Result, StorageError};

pub const MIN_PLAYERS: u32 = 2;
pub const MAX_PLAYERS: u32 = 64;

/// One leaf of the bracket. Seeds above the player count are byes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "seed", rename_all = "lowercase")]
pub enum BracketSlot {
    Seed(u32),
    Bye(u32),
}

impl BracketSlot {
    pub fn seed(&self) -> u32 {
        match self {
            Self::Seed(n) | Self::Bye(n) => *n,
        }
    }

    pub fn is_bye(&self) -> bool {
        matches!(self, Self::Bye(_))
    }
}

/// A pairing of two slots or of two earlier pairings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BracketNode {
    Slot(BracketSlot),
    Pairing(Box<BracketNode>, Box<BracketNode>),
}

impl BracketNode {
    fn pair(first: BracketNode, second: BracketNode) -> Self {
        Self::Pairing(Box::new(first), Box::new(second))
    }

    pub fn depth(&self) -> u32 {
        match self {
            Self::Slot(_) => 0,
            Self::Pairing(a, b) => 1 + a.depth().max(b.depth()),
        }
    }

    pub fn leaves(&self) -> Vec<BracketSlot> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(&self, out: &mut Vec<BracketSlot>) {
        match self {
            Self::Slot(slot) => out.push(*slot),
            Self::Pairing(a, b) => {
                a.collect_leaves(out);
                b.collect_leaves(out);
            }
        }
    }

    /// For a first-round pairing against a bye, the seed that advances uncontested.
    pub fn walkover(&self) -> Option<u32> {
        match self {
            Self::Pairing(a, b) => match (a.as_ref(), b.as_ref()) {
                (Self::Slot(BracketSlot::Seed(s)), Self::Slot(BracketSlot::Bye(_)))
                | (Self::Slot(BracketSlot::Bye(_)), Self::Slot(BracketSlot::Seed(s))) => Some(*s),
                _ => None,
            },
            Self::Slot(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bracket {
    pub player_count: u32,
    pub slot_count: u32,
    pub depth: u32,
    pub root: BracketNode,
}

impl Bracket {
    pub fn leaves(&self) -> Vec<BracketSlot> {
        self.root.leaves()
    }

    /// First-round pairings in bracket order.
    pub fn first_round(&self) -> Vec<(BracketSlot, BracketSlot)> {
        self.leaves().chunks(2).map(|c| (c[0], c[1])).collect()
    }

    /// Seeds that advance past the first round without playing.
    pub fn walkovers(&self) -> Vec<u32> {
        self.first_round()
            .into_iter()
            .filter_map(|(a, b)| match (a, b) {
                (BracketSlot::Seed(s), BracketSlot::Bye(_))
                | (BracketSlot::Bye(_), BracketSlot::Seed(s)) => Some(s),
                _ => None,
            })
            .collect()
    }
}

/// Score a slot contributes to its pairing: a bye always loses with zero.
pub fn effective_score(slot: BracketSlot, score: Decimal) -> Decimal {
    if slot.is_bye() { Decimal::ZERO } else { score }
}

/// Builds a standard seeded bracket for `player_count` players.
///
/// The count is padded to the next power of two; the padding seeds are byes,
/// so the top seeds draw them. Round one pairs seed `i` with `slots + 1 - i`.
/// Every later round pairs the first remaining pairing with the last,
/// flipping every other pairing so the second seed lands at the bottom.
pub fn build(player_count: u32) -> Result<Bracket> {
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&player_count) {
        return Err(StorageError::Validation(format!(
            "bracket size must be between {MIN_PLAYERS} and {MAX_PLAYERS}, got {player_count}"
        )));
    }

    let slot_count = player_count.next_power_of_two();
    let slot = |seed: u32| {
        BracketNode::Slot(if seed > player_count {
            BracketSlot::Bye(seed)
        } else {
            BracketSlot::Seed(seed)
        })
    };

    let mut round: Vec<BracketNode> = (1..=slot_count / 2)
        .map(|i| BracketNode::pair(slot(i), slot(slot_count + 1 - i)))
        .collect();

    while round.len() > 1 {
        let mut remaining: VecDeque<BracketNode> = round.into();
        round = Vec::with_capacity(remaining.len() / 2);
        while let (Some(first), Some(last)) = (remaining.pop_front(), remaining.pop_back()) {
            let node = if round.len() % 2 == 0 {
                BracketNode::pair(first, last)
            } else {
                BracketNode::pair(last, first)
            };
            round.push(node);
        }
    }

    let root = round
        .pop()
        .ok_or_else(|| StorageError::Validation("bracket has no pairings".to_string()))?;

    Ok(Bracket {
        player_count,
        slot_count,
        depth: root.depth(),
        root,
    })
}
