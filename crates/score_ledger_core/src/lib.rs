pub mod codec;
pub mod domain;
pub mod ledger;
pub mod observer;
pub mod ports;

pub use codec::{decode_current_game, decode_history, CurrentGame};
pub use domain::{
    parse_score_entry, AvatarToken, CareerStanding, HistoryDay, LeaderboardEntry, Player,
    Preferences, Round, ScoringMode, Session, AVATAR_PALETTE, MAX_PLAYERS, MIN_PLAYERS,
};
pub use ledger::{EndGame, LedgerError, ScoreLedger};
pub use observer::{LedgerChange, LedgerObserver};
pub use ports::{KeyValueStore, PortError, PortResult, StorageKey};
