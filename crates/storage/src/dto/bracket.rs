use serde::Serialize;
use utoipa::ToSchema;

use crate::services::bracket::{Bracket, BracketNode, BracketSlot};

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct BracketLeaf {
    pub seed: u32,
    pub bye: bool,
}

impl From<BracketSlot> for BracketLeaf {
    fn from(slot: BracketSlot) -> Self {
        Self {
            seed: slot.seed(),
            bye: slot.is_bye(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FirstRoundPairing {
    pub top: BracketLeaf,
    pub bottom: BracketLeaf,
    /// Seed that advances without playing, if the opponent is a bye.
    pub walkover: Option<u32>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BracketResponse {
    pub player_count: u32,
    pub slot_count: u32,
    pub depth: u32,
    pub leaves: Vec<BracketLeaf>,
    pub first_round: Vec<FirstRoundPairing>,
    /// Nested pairings, each a two-element array of slots or pairings.
    #[schema(value_type = Object)]
    pub tree: BracketNode,
}

impl From<Bracket> for BracketResponse {
    fn from(bracket: Bracket) -> Self {
        let first_round = bracket
            .first_round()
            .into_iter()
            .map(|(top, bottom)| FirstRoundPairing {
                top: top.into(),
                bottom: bottom.into(),
                walkover: match (top, bottom) {
                    (BracketSlot::Seed(s), BracketSlot::Bye(_))
                    | (BracketSlot::Bye(_), BracketSlot::Seed(s)) => Some(s),
                    _ => None,
                },
            })
            .collect();

        Self {
            player_count: bracket.player_count,
            slot_count: bracket.slot_count,
            depth: bracket.depth,
            leaves: bracket.leaves().into_iter().map(Into::into).collect(),
            first_round,
            tree: bracket.root,
        }
    }
}
