//! FlightSurety ledger engine.
//!
//! [`Surety`] owns the whole state behind a single writer lock. Every
//! mutating operation validates against the current state before it writes
//! anything, so a failed call leaves nothing behind. Events are published on
//! a broadcast channel once the operation succeeds.

pub mod core;
mod operations;

use std::sync::Arc;

use surety_common::{error::Result, SuretyConfig, SuretyEvent};
use tokio::sync::{broadcast, RwLock};

use crate::core::{
    oracles::{HashIndexSource, IndexSource},
    state::{SuretyState, Transaction},
};

pub use crate::core::airlines::{Airline, Ballot, FundingReceipt, RegistrationStatus};
pub use crate::core::escrow::{CreditReport, InsurancePolicy, Vault};
pub use crate::core::oracles::{
    FlightRecord, FlightStatusRequest, ResponseOutcome, RngIndexSource, SequenceIndexSource,
};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

struct Store {
    state: SuretyState,
    indexes: Box<dyn IndexSource>,
}

pub struct Surety {
    store: Arc<RwLock<Store>>,
    events: broadcast::Sender<SuretyEvent>,
    config: SuretyConfig,
}

impl Surety {
    /// Builds the engine with hash-based index assignment, seeded from
    /// `index_entropy` when configured and from the OS otherwise.
    pub fn new(config: SuretyConfig) -> Result<Self> {
        let source = match config.entropy()? {
            Some(seed) => HashIndexSource::with_entropy(seed),
            None => HashIndexSource::new(),
        };
        Self::with_index_source(config, Box::new(source))
    }

    pub fn with_index_source(config: SuretyConfig, indexes: Box<dyn IndexSource>) -> Result<Self> {
        config.validate()?;
        let state = SuretyState::new(&config);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        tracing::info!(
            "✈️ Surety engine ready (admin={}, first airline={})",
            config.admin, config.first_airline
        );

        Ok(Self {
            store: Arc::new(RwLock::new(Store { state, indexes })),
            events,
            config,
        })
    }

    pub fn config(&self) -> &SuretyConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SuretyEvent> {
        self.events.subscribe()
    }

    /// Runs `op` under the write lock. `op` must not write before its last
    /// fallible step. Events go out before the lock is released so that
    /// subscribers see them in commit order.
    async fn transact<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T>,
    {
        let mut guard = self.store.write().await;
        let Store { state, indexes } = &mut *guard;

        let mut tx = Transaction::new(state, indexes.as_mut());
        let value = op(&mut tx)?;

        for event in tx.into_events() {
            // No subscribers is fine.
            let _ = self.events.send(event);
        }
        Ok(value)
    }

    /// Like `transact`, but fails with `OperationsSuspended` while the gate is
    /// closed. The check runs under the same lock as the mutation.
    async fn mutate<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T>,
    {
        self.transact(|tx| {
            tx.state.gate.require_operational()?;
            op(tx)
        })
        .await
    }

    async fn read<T>(&self, view: impl FnOnce(&SuretyState) -> T) -> T {
        let guard = self.store.read().await;
        view(&guard.state)
    }
}
