//! Background polling of sensor readings.
//!
//! The [`Poller`] runs one update cycle per tick: resolve the configured
//! serial to a device id, fetch that device's readings, and write them into
//! the [`SensorCache`].
//!
//! # Retry-by-repetition
//!
//! There is no retry or backoff. A failed cycle (network error, unexpected
//! payload, unknown serial, API error) is logged with its cause, recorded in
//! [`PollStats`], and dropped; the cache keeps its previous values and the next tick simply
//! tries again. Errors never stop the loop. Only [`PollerHandle::stop`] (or
//! dropping the handle) does.
//!
//! Cycles never overlap: each one is awaited before the next tick is taken,
//! and ticks missed while a slow cycle was running are delayed rather than
//! bunched up.
//!
//! When no session is held the cycle is a no-op. The startup login is not
//! retried here (see [`crate::session`]).

use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::Serialize;
use time::OffsetDateTime;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cache::SensorCache;
use crate::error::{Error, Result};
use crate::resolver::resolve_device_id;
use crate::session::SessionManager;
use crate::traits::CanaryApi;

/// The failure streak length reported once at `error` instead of `warn`.
const PERSISTENT_FAILURES: u32 = 4;

/// Options for the poller.
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Time between update cycles. Default: 60 seconds.
    pub interval: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
        }
    }
}

impl PollOptions {
    /// Create options with a specific interval.
    pub fn with_interval(interval: Duration) -> Self {
        Self { interval }
    }

    /// Create options from an interval in seconds, as found in configuration.
    pub fn from_secs(secs: u64) -> Self {
        Self::with_interval(Duration::from_secs(secs))
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(Error::InvalidConfig(
                "polling interval must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of a single update cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Readings were fetched and written to the cache.
    Updated { readings: usize },
    /// No session is held, nothing was done.
    Skipped,
}

/// Point-in-time copy of the poller statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PollStatsSnapshot {
    /// Cycles that wrote readings.
    pub success_count: u64,
    /// Cycles that failed.
    pub failure_count: u64,
    /// Cycles skipped for lack of a session.
    pub skipped_count: u64,
    /// Failures since the last success.
    pub consecutive_failures: u32,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_poll_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_error_at: Option<OffsetDateTime>,
    pub last_error: Option<String>,
}

/// Shared, thread-safe poller statistics.
#[derive(Debug, Default)]
pub struct PollStats {
    inner: RwLock<PollStatsSnapshot>,
}

impl PollStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> PollStatsSnapshot {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn update<R>(&self, f: impl FnOnce(&mut PollStatsSnapshot) -> R) -> R {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    fn record_success(&self) {
        self.update(|s| {
            s.success_count += 1;
            s.consecutive_failures = 0;
            s.last_poll_at = Some(OffsetDateTime::now_utc());
        });
    }

    fn record_skip(&self) {
        self.update(|s| s.skipped_count += 1);
    }

    /// Record a failure and return the number of consecutive failures.
    fn record_failure(&self, error: &Error) -> u32 {
        self.update(|s| {
            s.failure_count += 1;
            s.consecutive_failures += 1;
            s.last_error_at = Some(OffsetDateTime::now_utc());
            s.last_error = Some(error.to_string());
            s.consecutive_failures
        })
    }
}

/// Drives update cycles for one device.
pub struct Poller {
    api: Arc<dyn CanaryApi>,
    session: Arc<SessionManager>,
    cache: Arc<SensorCache>,
    serial: String,
    options: PollOptions,
    stats: Arc<PollStats>,
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("serial", &self.serial)
            .field("options", &self.options)
            .finish()
    }
}

impl Poller {
    /// Create a poller. Fails if the options are invalid.
    pub fn new(
        api: Arc<dyn CanaryApi>,
        session: Arc<SessionManager>,
        cache: Arc<SensorCache>,
        serial: impl Into<String>,
        options: PollOptions,
    ) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            api,
            session,
            cache,
            serial: serial.into(),
            options,
            stats: Arc::new(PollStats::new()),
        })
    }

    pub fn stats(&self) -> Arc<PollStats> {
        Arc::clone(&self.stats)
    }

    /// Run one update cycle and return its outcome or error.
    ///
    /// On error the cache is left untouched.
    pub async fn update(&self) -> Result<UpdateOutcome> {
        let Some(session) = self.session.current() else {
            return Ok(UpdateOutcome::Skipped);
        };

        debug!("Updating sensor values for {}", self.serial);
        let device_id = resolve_device_id(self.api.as_ref(), &session, &self.serial).await?;
        let readings = self.api.readings(&session, &device_id).await?;
        let written = self.cache.apply(&readings);

        Ok(UpdateOutcome::Updated { readings: written })
    }

    /// Run one update cycle, logging and recording the outcome.
    ///
    /// Never fails: errors are swallowed after being recorded.
    pub async fn run_cycle(&self) -> Option<UpdateOutcome> {
        match self.update().await {
            Ok(UpdateOutcome::Skipped) => {
                info!("No session, skipping update");
                self.stats.record_skip();
                Some(UpdateOutcome::Skipped)
            }
            Ok(outcome @ UpdateOutcome::Updated { readings }) => {
                debug!("Cached {} reading(s) for {}", readings, self.serial);
                self.stats.record_success();
                Some(outcome)
            }
            Err(e) => {
                let failures = self.stats.record_failure(&e);
                if failures == PERSISTENT_FAILURES {
                    error!(
                        "Update failed {} times in a row: {} (will keep polling)",
                        failures, e
                    );
                } else {
                    warn!("Error on update: {} (attempt {})", e, failures);
                }
                None
            }
        }
    }

    /// Start the polling loop in a background task.
    ///
    /// The first cycle runs immediately, then one per interval.
    pub fn spawn(self) -> PollerHandle {
        let cancel_token = CancellationToken::new();
        let task_token = cancel_token.clone();
        let stats = self.stats();

        info!(
            "Starting poller for {} (interval: {}s)",
            self.serial,
            self.options.interval.as_secs()
        );

        let handle = tokio::spawn(async move {
            let mut ticker = interval(self.options.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = task_token.cancelled() => {
                        debug!("Poller cancelled, stopping gracefully");
                        break;
                    }
                    _ = ticker.tick() => {
                        tokio::select! {
                            _ = task_token.cancelled() => {
                                debug!("Poller cancelled during update, stopping");
                                break;
                            }
                            _ = self.run_cycle() => {}
                        }
                    }
                }
            }
        });

        PollerHandle {
            handle,
            cancel_token,
            stats,
        }
    }
}

/// Handle to a running poller.
///
/// Dropping the handle stops the poller.
pub struct PollerHandle {
    handle: tokio::task::JoinHandle<()>,
    cancel_token: CancellationToken,
    stats: Arc<PollStats>,
}

impl PollerHandle {
    /// Signal the poller to stop. An in-flight cycle is abandoned.
    pub fn stop(&self) {
        self.cancel_token.cancel();
    }

    /// Stop the poller and wait for its task to finish.
    pub async fn shutdown(mut self) {
        self.cancel_token.cancel();
        if let Err(e) = (&mut self.handle).await {
            warn!("Poller task ended abnormally: {}", e);
        }
    }

    /// Check if the background task is still running.
    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    pub fn stats(&self) -> Arc<PollStats> {
        Arc::clone(&self.stats)
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
