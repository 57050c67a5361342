pub mod board;
pub mod clock;
pub mod inventory;
pub mod runtime;
pub mod session;
pub mod state_machine;

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::play_store::{PlayStore, memory::MemoryPlayStore},
    error::ServiceError,
    payments::{PaymentGateway, ledger::MemoryLedger},
};

use self::{
    clock::{Clock, SystemClock},
    runtime::SessionRuntime,
};

/// Shared handle to [`AppState`] passed to every handler.
pub type SharedState = Arc<AppState>;

/// Central application state: configuration, bridges and live sessions.
pub struct AppState {
    config: AppConfig,
    play_store: Arc<dyn PlayStore>,
    payments: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock>,
    sessions: DashMap<Uuid, Arc<SessionRuntime>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(
        config: AppConfig,
        play_store: Arc<dyn PlayStore>,
        payments: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
    ) -> SharedState {
        Arc::new(Self {
            config,
            play_store,
            payments,
            clock,
            sessions: DashMap::new(),
        })
    }

    /// State backed by the in-memory store and ledger and the system clock.
    pub fn in_memory(config: AppConfig) -> SharedState {
        Self::new(
            config,
            Arc::new(MemoryPlayStore::new()),
            Arc::new(MemoryLedger::new()),
            Arc::new(SystemClock),
        )
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Session bridge.
    pub fn play_store(&self) -> Arc<dyn PlayStore> {
        Arc::clone(&self.play_store)
    }

    /// Payment bridge.
    pub fn payments(&self) -> Arc<dyn PaymentGateway> {
        Arc::clone(&self.payments)
    }

    /// Clock used for new sessions.
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Registry of live sessions keyed by play id.
    pub fn sessions(&self) -> &DashMap<Uuid, Arc<SessionRuntime>> {
        &self.sessions
    }

    /// Look up a live session or fail with `NotFound`.
    pub fn require_session(&self, play_id: Uuid) -> Result<Arc<SessionRuntime>, ServiceError> {
        self.sessions
            .get(&play_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ServiceError::NotFound(format!("play `{play_id}` has no live session")))
    }
}
