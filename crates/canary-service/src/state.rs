//! Application state shared across handlers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use canary_core::{Bridge, CanaryAccessory, PollStats, SessionManager};
use time::OffsetDateTime;

use crate::config::Config;

/// Shared application state.
pub struct AppState {
    /// The bridged device.
    pub accessory: Arc<CanaryAccessory>,
    /// Session used by the poller.
    pub session: Arc<SessionManager>,
    /// Poller statistics.
    pub stats: Arc<PollStats>,
    /// Configuration the service was started with.
    pub config: Config,
    /// When the service started.
    pub started_at: OffsetDateTime,
    polling: AtomicBool,
}

impl AppState {
    /// Create state from a bridge that has not been started yet.
    pub fn new(bridge: &Bridge, config: Config) -> Arc<Self> {
        Arc::new(Self {
            accessory: bridge.accessory(),
            session: bridge.session(),
            stats: bridge.stats(),
            config,
            started_at: OffsetDateTime::now_utc(),
            polling: AtomicBool::new(false),
        })
    }

    /// Whether the background poller is running.
    pub fn is_polling(&self) -> bool {
        self.polling.load(Ordering::SeqCst)
    }

    pub fn set_polling(&self, polling: bool) {
        self.polling.store(polling, Ordering::SeqCst);
    }
}
