//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use score_ledger_core::ScoreLedger;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The shared application state, created once at startup and passed to all handlers.
///
/// Each process owns exactly one ledger; handlers lock it for the duration of a
/// single operation.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Mutex<ScoreLedger>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(ledger: ScoreLedger, config: Arc<Config>) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            config,
        }
    }
}
