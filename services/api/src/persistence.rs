//! services/api/src/persistence.rs
//!
//! Wires the ledger to a `KeyValueStore`: loading at startup, and saving in the
//! background whenever the ledger reports a change.
//!
//! Saves are fire-and-forget. The observer encodes the affected records while the
//! ledger is still locked and queues them; a single worker task writes them in
//! order, so the last queued blob for a key is the one that ends up on disk.

use score_ledger_core::{
    decode_current_game, decode_history, KeyValueStore, LedgerChange, LedgerObserver,
    ScoreLedger, ScoringMode, StorageKey,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// A unit of work for the persistence worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistCommand {
    Save { key: StorageKey, blob: String },
    Remove { key: StorageKey },
}

//=========================================================================================
// Observer
//=========================================================================================

/// Queues the records a ledger change affects.
pub struct PersistenceObserver {
    tx: mpsc::UnboundedSender<PersistCommand>,
}

impl PersistenceObserver {
    pub fn new(tx: mpsc::UnboundedSender<PersistCommand>) -> Self {
        Self { tx }
    }
}

impl LedgerObserver for PersistenceObserver {
    fn on_change(&self, change: LedgerChange, ledger: &ScoreLedger) {
        for &key in change.affected_keys() {
            let command = if change == LedgerChange::Reset {
                PersistCommand::Remove { key }
            } else {
                match ledger.encode(key) {
                    Ok(blob) => PersistCommand::Save { key, blob },
                    Err(e) => {
                        error!("Failed to encode {} after {:?}: {}", key, change, e);
                        continue;
                    }
                }
            };
            if self.tx.send(command).is_err() {
                warn!("Persistence worker has stopped; {} will not be saved", key);
            }
        }
    }
}

//=========================================================================================
// Worker
//=========================================================================================

/// Drains the queue until every sender is dropped. Failures are logged and skipped.
pub async fn run_persistence_worker(
    store: Arc<dyn KeyValueStore>,
    mut rx: mpsc::UnboundedReceiver<PersistCommand>,
) {
    while let Some(command) = rx.recv().await {
        let result = match &command {
            PersistCommand::Save { key, blob } => store.save(*key, blob).await,
            PersistCommand::Remove { key } => store.remove(*key).await,
        };
        match result {
            Ok(()) => debug!("Persisted {:?}", command_key(&command)),
            Err(e) => error!("Failed to persist {}: {}", command_key(&command), e),
        }
    }
    info!("Persistence worker stopped.");
}

fn command_key(command: &PersistCommand) -> StorageKey {
    match command {
        PersistCommand::Save { key, .. } | PersistCommand::Remove { key } => *key,
    }
}

/// Registers a persistence observer on `ledger` and spawns its worker.
pub fn attach_persistence(ledger: &mut ScoreLedger, store: Arc<dyn KeyValueStore>) -> JoinHandle<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    ledger.subscribe(Arc::new(PersistenceObserver::new(tx)));
    tokio::spawn(run_persistence_worker(store, rx))
}

//=========================================================================================
// Startup Loading
//=========================================================================================

/// Loads both records and rebuilds the ledger. Anything that cannot be loaded or
/// decoded falls back to its empty state. A ledger with no saved game gets
/// `initial_seats` blank seats.
pub async fn load_ledger(
    store: &dyn KeyValueStore,
    mode: ScoringMode,
    initial_seats: usize,
) -> ScoreLedger {
    let current = match store.load(StorageKey::CurrentGame).await {
        Ok(Some(blob)) => decode_current_game(&blob)
            .map_err(|e| warn!("Discarding unreadable current game: {}", e))
            .ok(),
        Ok(None) => None,
        Err(e) => {
            warn!("Failed to load current game: {}", e);
            None
        }
    };
    let history = match store.load(StorageKey::History).await {
        Ok(Some(blob)) => decode_history(&blob)
            .map_err(|e| warn!("Discarding unreadable history: {}", e))
            .ok(),
        Ok(None) => None,
        Err(e) => {
            warn!("Failed to load history: {}", e);
            None
        }
    };

    let fresh = current.is_none();
    let mut ledger = ScoreLedger::restore(mode, current, history);
    if fresh {
        ledger.resize_player_roster(initial_seats);
    }
    info!(
        players = ledger.players().len(),
        rounds = ledger.rounds().len(),
        history = ledger.history().len(),
        "Ledger loaded."
    );
    ledger
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use async_trait::async_trait;
    use score_ledger_core::ports::{PortError, PortResult};

    struct FailingStore;

    #[async_trait]
    impl KeyValueStore for FailingStore {
        async fn load(&self, _key: StorageKey) -> PortResult<Option<String>> {
            Err(PortError::Unexpected("disk on fire".to_string()))
        }
        async fn save(&self, _key: StorageKey, _blob: &str) -> PortResult<()> {
            Err(PortError::Unexpected("disk on fire".to_string()))
        }
        async fn remove(&self, _key: StorageKey) -> PortResult<()> {
            Err(PortError::Unexpected("disk on fire".to_string()))
        }
    }

    #[test]
    fn observer_queues_affected_records() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ledger = ScoreLedger::new(ScoringMode::ZeroSum);
        ledger.subscribe(Arc::new(PersistenceObserver::new(tx)));

        ledger.add_player("A").unwrap();
        match rx.try_recv().unwrap() {
            PersistCommand::Save { key, blob } => {
                assert_eq!(key, StorageKey::CurrentGame);
                let game = decode_current_game(&blob).unwrap();
                assert_eq!(game.players[0].name, "A");
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(rx.try_recv().is_err());

        ledger.reset_all();
        assert_eq!(
            rx.try_recv().unwrap(),
            PersistCommand::Remove { key: StorageKey::CurrentGame }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            PersistCommand::Remove { key: StorageKey::History }
        );
    }

    #[tokio::test]
    async fn worker_writes_changes_through_to_the_store() {
        let store = Arc::new(MemoryStore::new());
        let mut ledger = ScoreLedger::new(ScoringMode::ZeroSum);
        let worker = attach_persistence(&mut ledger, store.clone());

        ledger.add_player("A").unwrap();
        ledger.add_player("B").unwrap();
        ledger.add_round(vec![2, -2]).unwrap();
        ledger.save_current_game();
        drop(ledger);
        worker.await.unwrap();

        let reloaded = load_ledger(store.as_ref(), ScoringMode::ZeroSum, 4).await;
        assert_eq!(reloaded.players().len(), 2);
        assert_eq!(reloaded.compute_totals(), vec![2, -2]);
        assert_eq!(reloaded.history().len(), 1);
    }

    #[tokio::test]
    async fn save_failures_do_not_stop_the_worker() {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_persistence_worker(Arc::new(FailingStore), rx));
        tx.send(PersistCommand::Remove { key: StorageKey::History }).unwrap();
        tx.send(PersistCommand::Save {
            key: StorageKey::History,
            blob: "[]".to_string(),
        })
        .unwrap();
        drop(tx);
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn unreadable_storage_starts_fresh_with_blank_seats() {
        let ledger = load_ledger(&FailingStore, ScoringMode::ZeroSum, 4).await;
        assert_eq!(ledger.players().len(), 4);
        assert!(ledger.history().is_empty());

        let store = MemoryStore::with_records([
            (StorageKey::CurrentGame, "garbage".to_string()),
            (StorageKey::History, "[]".to_string()),
        ]);
        let ledger = load_ledger(&store, ScoringMode::ZeroSum, 3).await;
        assert_eq!(ledger.players().len(), 3);
    }
}
