pub mod challenge;
pub mod entry;
pub mod group;
pub mod player;
pub mod prompt;
pub mod rating_snapshot;

pub use challenge::{Challenge, NewChallenge, Phase, TimeWindow, format_time_left};
pub use entry::Entry;
pub use group::{Group, NewGroup};
pub use player::{NewPlayer, Player};
pub use prompt::Prompt;
pub use rating_snapshot::{NewRatingSnapshot, RatingSnapshot};
