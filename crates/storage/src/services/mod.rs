pub mod bracket;
pub mod entries;
pub mod gaussian;
pub mod groups;
pub mod leaderboard;
pub mod lifecycle;
pub mod locks;
pub mod notify;
pub mod rating;
pub mod scoring;
pub mod trueskill;

pub use entries::EntryService;
pub use groups::GroupService;
pub use leaderboard::Leaderboard;
pub use lifecycle::ChallengeLifecycle;
pub use locks::{GroupGuard, GroupLocks};
pub use notify::{ChallengeClosed, NotificationDispatcher, Notifier, TracingNotifier};
pub use rating::{RatingEngine, RatingUpdate};
pub use trueskill::{Rating, RatingConfig};
