//! crates/score_ledger_core/src/codec.rs
//!
//! JSON encoding of the two persisted records and reconstruction of a ledger
//! from whatever could be loaded.

use crate::domain::{Player, Preferences, Round, ScoringMode, Session};
use crate::ledger::ScoreLedger;
use crate::ports::{PortResult, StorageKey};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// The "current game" record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentGame {
    pub session_id: Uuid,
    #[serde(default)]
    pub mode: ScoringMode,
    pub players: Vec<Player>,
    #[serde(default)]
    pub rounds: Vec<Round>,
    #[serde(default)]
    pub is_ended: bool,
    #[serde(default)]
    pub preferences: Preferences,
}

impl ScoreLedger {
    pub fn current_game(&self) -> CurrentGame {
        CurrentGame {
            session_id: self.session_id(),
            mode: self.mode(),
            players: self.players().to_vec(),
            rounds: self.rounds().to_vec(),
            is_ended: self.is_ended(),
            preferences: self.preferences().clone(),
        }
    }

    /// Serialises the record stored under `key`.
    pub fn encode(&self, key: StorageKey) -> PortResult<String> {
        let blob = match key {
            StorageKey::CurrentGame => serde_json::to_string(&self.current_game())?,
            StorageKey::History => serde_json::to_string(self.history())?,
        };
        Ok(blob)
    }

    /// Rebuilds a ledger from loaded records. Missing records fall back to an
    /// empty game or empty history. `mode` is authoritative over the stored one.
    pub fn restore(
        mode: ScoringMode,
        current: Option<CurrentGame>,
        history: Option<Vec<Session>>,
    ) -> Self {
        let history = history.unwrap_or_default();
        match current {
            Some(game) => {
                if game.mode != mode {
                    warn!(
                        stored = %game.mode,
                        configured = %mode,
                        "Stored game was recorded under a different scoring mode"
                    );
                }
                ScoreLedger::from_parts(
                    mode,
                    game.session_id,
                    game.players,
                    game.rounds,
                    game.is_ended,
                    game.preferences,
                    history,
                )
            }
            None => ScoreLedger::from_parts(
                mode,
                Uuid::new_v4(),
                Vec::new(),
                Vec::new(),
                false,
                Preferences::default(),
                history,
            ),
        }
    }
}

pub fn decode_current_game(blob: &str) -> PortResult<CurrentGame> {
    Ok(serde_json::from_str(blob)?)
}

pub fn decode_history(blob: &str) -> PortResult<Vec<Session>> {
    Ok(serde_json::from_str(blob)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_survives_a_save_and_restore() {
        let mut ledger = ScoreLedger::new(ScoringMode::ZeroSum);
        ledger.add_player("A").unwrap();
        ledger.add_player("B").unwrap();
        ledger.add_round(vec![5, -5]).unwrap();
        ledger.save_current_game();
        ledger.add_round(vec![-2, 2]).unwrap();
        ledger.end_game();

        let current = decode_current_game(&ledger.encode(StorageKey::CurrentGame).unwrap()).unwrap();
        let history = decode_history(&ledger.encode(StorageKey::History).unwrap()).unwrap();
        let restored = ScoreLedger::restore(ScoringMode::ZeroSum, Some(current), Some(history));

        assert_eq!(restored.session_id(), ledger.session_id());
        assert_eq!(restored.players(), ledger.players());
        assert_eq!(restored.rounds(), ledger.rounds());
        assert!(restored.is_ended());
        assert_eq!(restored.history(), ledger.history());
        assert_eq!(restored.compute_totals(), vec![3, -3]);
    }

    #[test]
    fn missing_records_restore_an_empty_ledger() {
        let ledger = ScoreLedger::restore(ScoringMode::Cumulative, None, None);
        assert!(ledger.players().is_empty());
        assert!(ledger.history().is_empty());
        assert_eq!(ledger.mode(), ScoringMode::Cumulative);
    }

    #[test]
    fn sparse_current_game_record_uses_defaults() {
        let blob = format!(
            r##"{{"session_id":"{}","players":[{{"id":"{}","name":"A","avatar":"#FF6B6B"}}]}}"##,
            Uuid::new_v4(),
            Uuid::new_v4()
        );
        let game = decode_current_game(&blob).unwrap();
        assert!(game.rounds.is_empty());
        assert!(!game.is_ended);
        assert_eq!(game.mode, ScoringMode::ZeroSum);
        assert_eq!(game.preferences, Preferences::default());
    }

    #[test]
    fn malformed_blob_is_a_codec_error() {
        assert!(matches!(
            decode_history("{not json"),
            Err(crate::ports::PortError::Codec(_))
        ));
    }
}
