pub mod bracket;
pub mod challenge;
pub mod entry;
pub mod group;
pub mod leaderboard;
