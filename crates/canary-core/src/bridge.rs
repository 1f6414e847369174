//! Wiring of session, cache, poller and accessory for one device.

use std::sync::Arc;

use tracing::info;

use crate::accessory::CanaryAccessory;
use crate::cache::SensorCache;
use crate::error::Result;
use crate::poller::{PollOptions, PollStats, Poller, PollerHandle};
use crate::session::{Credentials, Session, SessionManager};
use crate::traits::CanaryApi;

/// Settings for a single bridged device.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    /// Display name of the accessory.
    pub name: String,
    /// Serial number of the Canary device.
    pub serial: String,
    /// Pre-obtained bearer token; skips login when present.
    pub session: Option<Session>,
    /// Credentials for the login flow.
    pub credentials: Option<Credentials>,
    pub poll: PollOptions,
}

/// One Canary device bridged to the accessory platform.
#[derive(Debug)]
pub struct Bridge {
    accessory: Arc<CanaryAccessory>,
    session: Arc<SessionManager>,
    poller: Poller,
}

impl Bridge {
    /// Build the bridge. Nothing touches the network until [`Bridge::start`].
    pub fn new(api: Arc<dyn CanaryApi>, settings: BridgeSettings) -> Result<Self> {
        let cache = Arc::new(SensorCache::new());
        let session = Arc::new(SessionManager::new(
            Arc::clone(&api),
            settings.session,
            settings.credentials,
        ));
        let poller = Poller::new(
            api,
            Arc::clone(&session),
            Arc::clone(&cache),
            settings.serial.clone(),
            settings.poll,
        )?;
        let accessory = Arc::new(CanaryAccessory::new(settings.name, settings.serial, cache));

        Ok(Self {
            accessory,
            session,
            poller,
        })
    }

    pub fn accessory(&self) -> Arc<CanaryAccessory> {
        Arc::clone(&self.accessory)
    }

    pub fn session(&self) -> Arc<SessionManager> {
        Arc::clone(&self.session)
    }

    pub fn stats(&self) -> Arc<PollStats> {
        self.poller.stats()
    }

    /// Log in once if needed, then start polling.
    ///
    /// The poller starts even when login fails; its cycles are then skipped.
    pub async fn start(self) -> PollerHandle {
        if !self.session.establish().await {
            info!("Starting without a session");
        }
        self.poller.spawn()
    }
}
