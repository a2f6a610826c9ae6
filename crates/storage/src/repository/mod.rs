pub mod challenge;
pub mod entry;
pub mod group;
pub mod rating;

pub use challenge::ChallengeRepository;
pub use entry::EntryRepository;
pub use group::{GroupRepository, PlayerRepository};
pub use rating::RatingRepository;
