use std::sync::Arc;

use gifoff_storage::LeagueStore;
use gifoff_storage::services::{
    ChallengeLifecycle, EntryService, GroupLocks, GroupService, Leaderboard,
    NotificationDispatcher, RatingEngine, TracingNotifier,
};

use crate::config::Config;

/// Engine services shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub groups: Arc<GroupService>,
    pub lifecycle: Arc<ChallengeLifecycle>,
    pub entries: Arc<EntryService>,
    pub leaderboard: Arc<Leaderboard>,
}

impl AppState {
    /// Wires the engine over `store`. Spawns the notification worker, so it
    /// must run inside the tokio runtime.
    pub fn build(store: Arc<dyn LeagueStore>, config: &Config) -> Self {
        let locks = GroupLocks::new(config.group_lock_timeout);
        let ratings = Arc::new(RatingEngine::new(store.clone(), config.rating, locks.clone()));
        let notifier = Arc::new(NotificationDispatcher::spawn(
            Arc::new(TracingNotifier),
            config.notification_queue,
        ));

        Self {
            groups: Arc::new(GroupService::new(store.clone(), ratings.clone())),
            lifecycle: Arc::new(ChallengeLifecycle::new(store.clone(), ratings).with_notifier(notifier)),
            entries: Arc::new(EntryService::new(store.clone(), locks)),
            leaderboard: Arc::new(Leaderboard::new(store, config.rating)),
        }
    }
}
