pub mod brackets;
pub mod challenges;
pub mod entries;
pub mod groups;
pub mod leaderboard;
