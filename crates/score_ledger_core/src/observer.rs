//! crates/score_ledger_core/src/observer.rs
//!
//! Change notifications emitted by the ledger after every successful mutation.
//! Persistence subscribes here instead of being called from inside operations.

use crate::ledger::ScoreLedger;
use crate::ports::StorageKey;

/// What part of the ledger a mutation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerChange {
    Roster,
    Rounds,
    GameEnded,
    NewGame,
    /// The history collection gained, replaced or lost an entry.
    History,
    /// A saved session became the active game, possibly after saving the previous one.
    GameLoaded,
    Preferences,
    /// Everything was cleared.
    Reset,
}

impl LedgerChange {
    /// The persisted records that must be rewritten to reflect this change.
    pub fn affected_keys(&self) -> &'static [StorageKey] {
        match self {
            LedgerChange::Roster
            | LedgerChange::Rounds
            | LedgerChange::GameEnded
            | LedgerChange::NewGame
            | LedgerChange::Preferences => &[StorageKey::CurrentGame],
            LedgerChange::History => &[StorageKey::History],
            LedgerChange::GameLoaded | LedgerChange::Reset => &StorageKey::ALL,
        }
    }
}

/// Receives change notifications. Called synchronously, so implementations
/// should hand real work off rather than block.
pub trait LedgerObserver: Send + Sync {
    fn on_change(&self, change: LedgerChange, ledger: &ScoreLedger);
}
