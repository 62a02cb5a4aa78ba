//! crates/score_ledger_core/src/ledger.rs
//!
//! The score ledger: the authoritative in-memory roster, in-progress rounds and
//! saved history, with validated mutations and derived read views.
//!
//! Every operation runs to completion synchronously. A successful mutation is
//! followed by exactly one `LedgerChange` notification per affected area;
//! rejected operations leave state untouched and notify nobody.

use crate::domain::{
    parse_score_entry, rank_players, seat_totals, AvatarToken, CareerStanding, HistoryDay,
    LeaderboardEntry, Player, Preferences, Round, ScoringMode, Session, MAX_PLAYERS, MIN_PLAYERS,
};
use crate::observer::{LedgerChange, LedgerObserver};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Rejections surfaced to the caller. State is unchanged whenever one is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("The game has ended; start a new game to change its rounds")]
    GameEnded,
}

/// Outcome of `end_game`. Having nothing to end is a notice, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndGame {
    Ended,
    NoRounds,
}

pub struct ScoreLedger {
    mode: ScoringMode,
    session_id: Uuid,
    players: Vec<Player>,
    rounds: Vec<Round>,
    is_ended: bool,
    preferences: Preferences,
    history: Vec<Session>,
    observers: Vec<Arc<dyn LedgerObserver>>,
}

impl ScoreLedger {
    /// An empty ledger: no players, no rounds, no history.
    pub fn new(mode: ScoringMode) -> Self {
        Self {
            mode,
            session_id: Uuid::new_v4(),
            players: Vec::new(),
            rounds: Vec::new(),
            is_ended: false,
            preferences: Preferences::default(),
            history: Vec::new(),
            observers: Vec::new(),
        }
    }

    /// Rebuilds a ledger from previously persisted parts. Observers are not carried over.
    pub(crate) fn from_parts(
        mode: ScoringMode,
        session_id: Uuid,
        players: Vec<Player>,
        rounds: Vec<Round>,
        is_ended: bool,
        preferences: Preferences,
        history: Vec<Session>,
    ) -> Self {
        Self {
            mode,
            session_id,
            players,
            rounds,
            is_ended,
            preferences,
            history,
            observers: Vec::new(),
        }
    }

    /// Registers an observer that is told about every later mutation.
    pub fn subscribe(&mut self, observer: Arc<dyn LedgerObserver>) {
        self.observers.push(observer);
    }

    fn notify(&self, change: LedgerChange) {
        debug!(?change, session_id = %self.session_id, "ledger changed");
        for observer in &self.observers {
            observer.on_change(change, self);
        }
    }

    //=====================================================================================
    // Read Access
    //=====================================================================================

    pub fn mode(&self) -> ScoringMode {
        self.mode
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: Uuid) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn is_ended(&self) -> bool {
        self.is_ended
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Saved sessions, most recently created first.
    pub fn history(&self) -> &[Session] {
        &self.history
    }

    pub fn history_entry(&self, id: Uuid) -> Option<&Session> {
        self.history.iter().find(|s| s.id == id)
    }

    pub fn named_player_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_named()).count()
    }

    /// Whether enough seats carry names for play to begin.
    pub fn can_start(&self) -> bool {
        self.named_player_count() >= MIN_PLAYERS
    }

    //=====================================================================================
    // Roster
    //=====================================================================================

    pub fn add_player(&mut self, name: &str) -> Result<Player, LedgerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::Validation(
                "player name must not be empty".to_string(),
            ));
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(LedgerError::Validation(format!(
                "a game holds at most {} players",
                MAX_PLAYERS
            )));
        }

        let player = Player::new(name, AvatarToken::for_seat(self.players.len()));
        self.players.push(player.clone());
        self.notify(LedgerChange::Roster);
        Ok(player)
    }

    /// Renames a player. Returns `false` without changing anything when the new
    /// name is blank or the id is unknown.
    pub fn edit_player(&mut self, id: Uuid, new_name: &str) -> bool {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return false;
        }
        let Some(player) = self.players.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        player.name = new_name.to_string();
        self.notify(LedgerChange::Roster);
        true
    }

    /// Removes a seat and its column from the in-progress rounds. Saved history
    /// keeps its own snapshot and is not touched. The rounds of an ended game are
    /// frozen, so its seats cannot be removed until a new game starts.
    pub fn remove_player(&mut self, id: Uuid) -> bool {
        if self.is_ended && !self.rounds.is_empty() {
            return false;
        }
        let Some(seat) = self.players.iter().position(|p| p.id == id) else {
            return false;
        };
        self.players.remove(seat);
        let mut rounds_touched = false;
        for round in &mut self.rounds {
            if seat < round.scores.len() {
                round.scores.remove(seat);
                rounds_touched = true;
            }
        }
        self.notify(LedgerChange::Roster);
        if rounds_touched {
            self.notify(LedgerChange::Rounds);
        }
        true
    }

    /// Grows or shrinks the roster to `count` seats, reshaping every in-progress
    /// round to match. Out-of-range counts and ended games are ignored.
    pub fn resize_player_roster(&mut self, count: usize) -> bool {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&count) || self.is_ended {
            return false;
        }
        if count == self.players.len() {
            return true;
        }

        if count < self.players.len() {
            self.players.truncate(count);
        } else {
            while self.players.len() < count {
                let avatar = AvatarToken::for_seat(self.players.len());
                self.players.push(Player::blank(avatar));
            }
        }
        for round in &mut self.rounds {
            round.scores.resize(count, 0);
        }

        self.notify(LedgerChange::Roster);
        if !self.rounds.is_empty() {
            self.notify(LedgerChange::Rounds);
        }
        true
    }

    //=====================================================================================
    // Rounds
    //=====================================================================================

    /// Records a round. In zero-sum mode the entries must cover every seat and
    /// sum to exactly zero; in cumulative mode missing entries count as zero.
    pub fn add_round(&mut self, scores: Vec<i64>) -> Result<Round, LedgerError> {
        if self.is_ended {
            return Err(LedgerError::GameEnded);
        }
        let seats = self.players.len();
        if seats == 0 {
            return Err(LedgerError::Validation(
                "add players before recording a round".to_string(),
            ));
        }
        if scores.len() > seats {
            return Err(LedgerError::Validation(format!(
                "expected at most {} scores, got {}",
                seats,
                scores.len()
            )));
        }

        let scores = match self.mode {
            ScoringMode::ZeroSum => {
                if scores.len() != seats {
                    return Err(LedgerError::Validation(format!(
                        "expected {} scores, got {}",
                        seats,
                        scores.len()
                    )));
                }
                let sum = scores
                    .iter()
                    .try_fold(0i64, |acc, score| acc.checked_add(*score));
                if sum != Some(0) {
                    return Err(LedgerError::Validation(
                        "round does not balance".to_string(),
                    ));
                }
                scores
            }
            ScoringMode::Cumulative => {
                let mut scores = scores;
                scores.resize(seats, 0);
                scores
            }
        };

        let sum_fits = scores
            .iter()
            .try_fold(0i64, |acc, score| acc.checked_add(*score))
            .is_some();
        let totals_fit = self
            .compute_totals()
            .iter()
            .zip(&scores)
            .all(|(total, score)| total.checked_add(*score).is_some());
        if !sum_fits || !totals_fit {
            return Err(LedgerError::Validation(
                "scores are too large to add up".to_string(),
            ));
        }

        let round = Round::new(scores);
        self.rounds.push(round.clone());
        self.notify(LedgerChange::Rounds);
        Ok(round)
    }

    /// Like `add_round`, but takes the raw text of each score field.
    pub fn add_round_entries<S: AsRef<str>>(&mut self, entries: &[S]) -> Result<Round, LedgerError> {
        let scores = entries
            .iter()
            .map(|entry| parse_score_entry(entry.as_ref()))
            .collect();
        self.add_round(scores)
    }

    /// Removes a round by id. Returns `Ok(false)` if there was nothing to remove.
    pub fn delete_round(&mut self, id: Uuid) -> Result<bool, LedgerError> {
        if self.is_ended {
            return Err(LedgerError::GameEnded);
        }
        let before = self.rounds.len();
        self.rounds.retain(|r| r.id != id);
        if self.rounds.len() == before {
            return Ok(false);
        }
        self.notify(LedgerChange::Rounds);
        Ok(true)
    }

    //=====================================================================================
    // Derived Views
    //=====================================================================================

    /// Per-seat totals over the in-progress rounds, aligned with `players()`.
    pub fn compute_totals(&self) -> Vec<i64> {
        seat_totals(self.players.len(), &self.rounds)
    }

    /// Named players ranked by total, highest first; ties keep roster order.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        rank_players(&self.players, &self.compute_totals())
    }

    /// Totals per player id across every saved session, highest first.
    pub fn career_standings(&self) -> Vec<CareerStanding> {
        let mut sessions: Vec<&Session> = self.history.iter().collect();
        sessions.sort_by_key(|s| s.date);

        let mut standings: Vec<CareerStanding> = Vec::new();
        let mut index: HashMap<Uuid, usize> = HashMap::new();
        for session in sessions {
            let totals = session.totals();
            for (seat, player) in session.players.iter().enumerate() {
                if !player.is_named() {
                    continue;
                }
                let total = totals.get(seat).copied().unwrap_or(0);
                match index.get(&player.id).copied() {
                    Some(i) => {
                        let standing = &mut standings[i];
                        standing.name = player.name.clone();
                        standing.avatar = player.avatar.clone();
                        standing.total = standing.total.saturating_add(total);
                        standing.sessions_played += 1;
                    }
                    None => {
                        index.insert(player.id, standings.len());
                        standings.push(CareerStanding {
                            player_id: player.id,
                            name: player.name.clone(),
                            avatar: player.avatar.clone(),
                            total,
                            sessions_played: 1,
                        });
                    }
                }
            }
        }

        standings.sort_by(|a, b| b.total.cmp(&a.total));
        standings
    }

    /// Saved sessions grouped by calendar day in `tz`, newest day first.
    pub fn group_history_by_day<Tz: TimeZone>(&self, tz: &Tz) -> Vec<HistoryDay> {
        let mut sessions = self.history.clone();
        sessions.sort_by(|a, b| b.date.cmp(&a.date));

        let mut days: Vec<HistoryDay> = Vec::new();
        for session in sessions {
            let day = session.date.with_timezone(tz).date_naive();
            match days.last_mut() {
                Some(group) if group.day == day => group.sessions.push(session),
                _ => days.push(HistoryDay {
                    day,
                    sessions: vec![session],
                }),
            }
        }
        days
    }

    /// Splits saved sessions into those dated on `now`'s calendar day and the rest.
    pub fn split_history_today<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
    ) -> (Vec<Session>, Vec<Session>) {
        let today = now.date_naive();
        let tz = now.timezone();
        let mut sessions = self.history.clone();
        sessions.sort_by(|a, b| b.date.cmp(&a.date));
        sessions
            .into_iter()
            .partition(|s| s.date.with_timezone(&tz).date_naive() == today)
    }

    /// The in-progress game as a history entry dated now.
    pub fn current_session(&self) -> Session {
        Session {
            id: self.session_id,
            date: Utc::now(),
            players: self.players.clone(),
            rounds: self.rounds.clone(),
            is_ended: self.is_ended,
        }
    }

    //=====================================================================================
    // Session Lifecycle
    //=====================================================================================

    pub fn end_game(&mut self) -> EndGame {
        if self.rounds.is_empty() {
            return EndGame::NoRounds;
        }
        self.is_ended = true;
        self.notify(LedgerChange::GameEnded);
        EndGame::Ended
    }

    /// Clears the rounds and opens a fresh session. Without `preserve_names` the
    /// seats stay but their names are blanked.
    pub fn start_new_game(&mut self, preserve_names: bool) {
        self.rounds.clear();
        self.is_ended = false;
        self.session_id = Uuid::new_v4();
        if !preserve_names {
            for player in &mut self.players {
                player.name.clear();
            }
        }
        self.notify(LedgerChange::NewGame);
    }

    /// Upserts the in-progress game into history. Does nothing without rounds.
    pub fn save_current_game(&mut self) -> bool {
        if self.rounds.is_empty() {
            return false;
        }
        let entry = self.current_session();
        match self.history.iter_mut().find(|s| s.id == entry.id) {
            Some(existing) => *existing = entry,
            None => self.history.insert(0, entry),
        }
        self.notify(LedgerChange::History);
        true
    }

    /// Makes `session` the active game, saving the current one first if it has rounds.
    /// Loading the session that is already active keeps the live rounds, which are
    /// never older than any saved copy of it.
    pub fn load_game(&mut self, session: Session) {
        if !self.rounds.is_empty() {
            self.save_current_game();
        }
        if session.id == self.session_id {
            self.is_ended = false;
            self.notify(LedgerChange::GameLoaded);
            return;
        }
        self.session_id = session.id;
        self.players = session.players;
        self.rounds = session.rounds;
        self.is_ended = false;
        self.notify(LedgerChange::GameLoaded);
    }

    pub fn delete_history_entry(&mut self, id: Uuid) -> bool {
        let before = self.history.len();
        self.history.retain(|s| s.id != id);
        if self.history.len() == before {
            return false;
        }
        self.notify(LedgerChange::History);
        true
    }

    pub fn set_preferences(&mut self, preferences: Preferences) {
        self.preferences = preferences;
        self.notify(LedgerChange::Preferences);
    }

    /// Drops every player, round and saved session. The scoring mode is kept.
    pub fn reset_all(&mut self) {
        self.session_id = Uuid::new_v4();
        self.players.clear();
        self.rounds.clear();
        self.is_ended = false;
        self.preferences = Preferences::default();
        self.history.clear();
        self.notify(LedgerChange::Reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};
    use std::sync::Mutex;

    fn ledger_with(names: &[&str]) -> ScoreLedger {
        let mut ledger = ScoreLedger::new(ScoringMode::ZeroSum);
        for name in names {
            ledger.add_player(name).unwrap();
        }
        ledger
    }

    #[derive(Default)]
    struct Recorder {
        changes: Mutex<Vec<LedgerChange>>,
    }

    impl LedgerObserver for Recorder {
        fn on_change(&self, change: LedgerChange, _ledger: &ScoreLedger) {
            self.changes.lock().unwrap().push(change);
        }
    }

    #[test]
    fn add_then_edit_player_trims_name() {
        let mut ledger = ScoreLedger::new(ScoringMode::ZeroSum);
        let player = ledger.add_player("  Lan ").unwrap();
        assert_eq!(player.name, "Lan");
        assert!(ledger.edit_player(player.id, "  Minh  "));
        let edited = ledger.player(player.id).unwrap();
        assert_eq!(edited.name, "Minh");
        assert_eq!(edited.avatar, player.avatar);
    }

    #[test]
    fn blank_names_are_rejected_or_ignored() {
        let mut ledger = ledger_with(&["A"]);
        assert!(matches!(
            ledger.add_player("   "),
            Err(LedgerError::Validation(_))
        ));
        let id = ledger.players()[0].id;
        assert!(!ledger.edit_player(id, " "));
        assert!(!ledger.edit_player(Uuid::new_v4(), "B"));
        assert_eq!(ledger.players()[0].name, "A");
    }

    #[test]
    fn duplicate_names_get_distinct_ids() {
        let ledger = ledger_with(&["A", "A"]);
        assert_ne!(ledger.players()[0].id, ledger.players()[1].id);
        assert_ne!(ledger.players()[0].avatar, ledger.players()[1].avatar);
    }

    #[test]
    fn roster_cannot_exceed_eight_players() {
        let mut ledger = ledger_with(&["1", "2", "3", "4", "5", "6", "7", "8"]);
        assert!(ledger.add_player("9").is_err());
        assert_eq!(ledger.players().len(), MAX_PLAYERS);
    }

    #[test]
    fn balanced_round_updates_totals() {
        let mut ledger = ledger_with(&["A", "B", "C", "D"]);
        ledger.add_round(vec![3, -1, -1, -1]).unwrap();
        assert_eq!(ledger.compute_totals(), vec![3, -1, -1, -1]);
    }

    #[test]
    fn unbalanced_round_is_rejected_without_side_effects() {
        let mut ledger = ledger_with(&["A", "B", "C", "D"]);
        ledger.add_round(vec![3, -1, -1, -1]).unwrap();
        let err = ledger.add_round(vec![3, -1, -1, 0]).unwrap_err();
        assert_eq!(
            err,
            LedgerError::Validation("round does not balance".to_string())
        );
        assert_eq!(ledger.rounds().len(), 1);
        assert_eq!(ledger.compute_totals(), vec![3, -1, -1, -1]);
    }

    #[test]
    fn zero_sum_round_must_cover_every_seat() {
        let mut ledger = ledger_with(&["A", "B", "C"]);
        assert!(ledger.add_round(vec![1, -1]).is_err());
        assert!(ledger.add_round(vec![1, -1, 0, 0]).is_err());
        assert!(ledger.rounds().is_empty());
    }

    #[test]
    fn overflowing_round_does_not_balance() {
        let mut ledger = ledger_with(&["A", "B", "C"]);
        assert!(ledger.add_round(vec![i64::MAX, i64::MAX, 2]).is_err());
    }

    #[test]
    fn rounds_that_would_overflow_a_total_are_rejected() {
        let mut ledger = ledger_with(&["A", "B"]);
        ledger.add_round(vec![i64::MAX, -i64::MAX]).unwrap();
        let err = ledger.add_round(vec![i64::MAX, -i64::MAX]).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert_eq!(ledger.rounds().len(), 1);
        assert_eq!(ledger.compute_totals(), vec![i64::MAX, -i64::MAX]);

        let mut cumulative = ScoreLedger::new(ScoringMode::Cumulative);
        cumulative.add_player("A").unwrap();
        cumulative.add_player("B").unwrap();
        assert!(cumulative.add_round(vec![i64::MAX, 1]).is_err());
        cumulative.add_round(vec![i64::MAX, 0]).unwrap();
        assert!(cumulative.add_round(vec![1, 0]).is_err());
        assert_eq!(cumulative.compute_totals(), vec![i64::MAX, 0]);
    }

    #[test]
    fn cumulative_round_zero_fills_missing_entries() {
        let mut ledger = ScoreLedger::new(ScoringMode::Cumulative);
        ledger.add_player("A").unwrap();
        ledger.add_player("B").unwrap();
        ledger.add_player("C").unwrap();
        ledger.add_round_entries(&["10", "oops"]).unwrap();
        ledger.add_round(vec![5, 5, 5]).unwrap();
        assert_eq!(ledger.rounds()[0].scores, vec![10, 0, 0]);
        assert_eq!(ledger.compute_totals(), vec![15, 5, 5]);
    }

    #[test]
    fn delete_round_is_idempotent() {
        let mut ledger = ledger_with(&["A", "B"]);
        let first = ledger.add_round(vec![2, -2]).unwrap();
        ledger.add_round(vec![-1, 1]).unwrap();
        assert_eq!(ledger.delete_round(first.id), Ok(true));
        let after_once: Vec<_> = ledger.rounds().to_vec();
        assert_eq!(ledger.delete_round(first.id), Ok(false));
        assert_eq!(ledger.rounds(), after_once.as_slice());
        assert_eq!(ledger.compute_totals(), vec![-1, 1]);
    }

    #[test]
    fn leaderboard_is_stable_on_ties() {
        let mut ledger = ScoreLedger::new(ScoringMode::Cumulative);
        for name in ["A", "B", "C"] {
            ledger.add_player(name).unwrap();
        }
        ledger.add_round(vec![10, 10, 5]).unwrap();
        let board = ledger.leaderboard();
        let rows: Vec<_> = board
            .iter()
            .map(|e| (e.player.name.as_str(), e.total))
            .collect();
        assert_eq!(rows, vec![("A", 10), ("B", 10), ("C", 5)]);
        assert!(board.windows(2).all(|w| w[0].total >= w[1].total));
    }

    #[test]
    fn leaderboard_hides_blank_seats_but_totals_keep_them() {
        let mut ledger = ledger_with(&["A", "B"]);
        assert!(ledger.resize_player_roster(3));
        ledger.add_round(vec![1, 1, -2]).unwrap();
        assert_eq!(ledger.compute_totals(), vec![1, 1, -2]);
        assert_eq!(ledger.leaderboard().len(), 2);
        assert_eq!(ledger.named_player_count(), 2);
        assert!(ledger.can_start());
    }

    #[test]
    fn resize_respects_bounds_and_reshapes_rounds() {
        let mut ledger = ledger_with(&["A", "B", "C", "D"]);
        ledger.add_round(vec![3, -1, -1, -1]).unwrap();

        assert!(!ledger.resize_player_roster(1));
        assert!(!ledger.resize_player_roster(9));
        assert_eq!(ledger.players().len(), 4);

        assert!(ledger.resize_player_roster(6));
        assert_eq!(ledger.players().len(), 6);
        assert!(!ledger.players()[5].is_named());
        assert_eq!(ledger.rounds()[0].scores, vec![3, -1, -1, -1, 0, 0]);

        assert!(ledger.resize_player_roster(2));
        assert_eq!(ledger.players().len(), 2);
        assert_eq!(ledger.rounds()[0].scores, vec![3, -1]);
        assert_eq!(ledger.players()[1].name, "B");
    }

    #[test]
    fn removing_a_player_drops_their_column() {
        let mut ledger = ledger_with(&["A", "B", "C"]);
        ledger.add_round(vec![2, -1, -1]).unwrap();
        let b = ledger.players()[1].id;
        assert!(ledger.remove_player(b));
        assert!(!ledger.remove_player(b));
        assert_eq!(ledger.rounds()[0].scores, vec![2, -1]);
        let names: Vec<_> = ledger.players().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn remove_player_leaves_history_snapshot_alone() {
        let mut ledger = ledger_with(&["A", "B"]);
        ledger.add_round(vec![1, -1]).unwrap();
        ledger.save_current_game();
        let a = ledger.players()[0].id;
        ledger.remove_player(a);
        assert_eq!(ledger.history()[0].players.len(), 2);
        assert_eq!(ledger.history()[0].rounds[0].scores, vec![1, -1]);
    }

    #[test]
    fn end_game_requires_rounds_and_freezes_them() {
        let mut ledger = ledger_with(&["A", "B"]);
        assert_eq!(ledger.end_game(), EndGame::NoRounds);
        assert!(!ledger.is_ended());

        let round = ledger.add_round(vec![1, -1]).unwrap();
        assert_eq!(ledger.end_game(), EndGame::Ended);
        assert!(ledger.is_ended());
        assert_eq!(ledger.add_round(vec![1, -1]), Err(LedgerError::GameEnded));
        assert_eq!(ledger.delete_round(round.id), Err(LedgerError::GameEnded));
        assert!(!ledger.resize_player_roster(3));
        assert_eq!(ledger.rounds().len(), 1);
    }

    #[test]
    fn ended_game_keeps_its_seats() {
        let mut ledger = ledger_with(&["A", "B", "C"]);
        ledger.add_round(vec![2, -1, -1]).unwrap();
        ledger.end_game();
        let b = ledger.players()[1].id;

        assert!(!ledger.remove_player(b));
        assert_eq!(ledger.players().len(), 3);
        assert_eq!(ledger.rounds()[0].scores, vec![2, -1, -1]);

        ledger.start_new_game(true);
        assert!(ledger.remove_player(b));
    }

    #[test]
    fn start_new_game_resets_session() {
        let mut ledger = ledger_with(&["A", "B"]);
        ledger.add_round(vec![1, -1]).unwrap();
        ledger.end_game();
        let old_session = ledger.session_id();
        let avatars: Vec<_> = ledger.players().iter().map(|p| p.avatar.clone()).collect();

        ledger.start_new_game(true);
        assert!(ledger.rounds().is_empty());
        assert!(!ledger.is_ended());
        assert_ne!(ledger.session_id(), old_session);
        assert_eq!(ledger.players()[0].name, "A");

        ledger.start_new_game(false);
        assert!(ledger.players().iter().all(|p| p.name.is_empty()));
        let after: Vec<_> = ledger.players().iter().map(|p| p.avatar.clone()).collect();
        assert_eq!(after, avatars);
    }

    #[test]
    fn save_without_rounds_creates_no_history() {
        let mut ledger = ledger_with(&["A", "B"]);
        assert!(!ledger.save_current_game());
        assert!(ledger.history().is_empty());
    }

    #[test]
    fn save_upserts_by_session_id() {
        let mut ledger = ledger_with(&["A", "B"]);
        ledger.add_round(vec![1, -1]).unwrap();
        assert!(ledger.save_current_game());
        ledger.add_round(vec![2, -2]).unwrap();
        assert!(ledger.save_current_game());
        assert_eq!(ledger.history().len(), 1);
        assert_eq!(ledger.history()[0].rounds.len(), 2);

        ledger.start_new_game(true);
        ledger.add_round(vec![5, -5]).unwrap();
        ledger.save_current_game();
        assert_eq!(ledger.history().len(), 2);
        assert_eq!(ledger.history()[0].id, ledger.session_id());
    }

    #[test]
    fn load_game_saves_unsaved_progress_first() {
        let mut ledger = ledger_with(&["A", "B"]);
        ledger.add_round(vec![4, -4]).unwrap();
        ledger.save_current_game();
        let saved = ledger.history()[0].clone();

        ledger.start_new_game(true);
        ledger.add_round(vec![1, -1]).unwrap();
        ledger.add_round(vec![2, -2]).unwrap();
        let unsaved_id = ledger.session_id();

        ledger.load_game(saved.clone());
        let stored = ledger.history_entry(unsaved_id).unwrap();
        assert_eq!(stored.rounds.len(), 2);
        assert_eq!(ledger.session_id(), saved.id);
        assert_eq!(ledger.rounds(), saved.rounds.as_slice());
        assert!(!ledger.is_ended());
    }

    #[test]
    fn loading_the_active_session_keeps_its_latest_rounds() {
        let mut ledger = ledger_with(&["A", "B"]);
        ledger.add_round(vec![5, -5]).unwrap();
        ledger.save_current_game();
        let stale = ledger.history()[0].clone();
        ledger.add_round(vec![1, -1]).unwrap();

        ledger.load_game(stale);
        assert_eq!(ledger.rounds().len(), 2);
        assert_eq!(ledger.history().len(), 1);
        assert_eq!(ledger.history()[0].rounds.len(), 2);

        ledger.save_current_game();
        assert_eq!(ledger.history()[0].rounds.len(), 2);
        assert_eq!(ledger.compute_totals(), vec![6, -6]);
    }

    #[test]
    fn loaded_ended_game_can_be_resumed() {
        let mut ledger = ledger_with(&["A", "B"]);
        ledger.add_round(vec![4, -4]).unwrap();
        ledger.end_game();
        ledger.save_current_game();
        let saved = ledger.history()[0].clone();
        assert!(saved.is_ended);

        ledger.start_new_game(true);
        ledger.load_game(saved);
        assert!(ledger.add_round(vec![1, -1]).is_ok());
    }

    #[test]
    fn history_entries_can_be_deleted() {
        let mut ledger = ledger_with(&["A", "B"]);
        ledger.add_round(vec![1, -1]).unwrap();
        ledger.save_current_game();
        let id = ledger.history()[0].id;
        assert!(ledger.delete_history_entry(id));
        assert!(!ledger.delete_history_entry(id));
        assert!(ledger.history().is_empty());
    }

    #[test]
    fn history_groups_by_local_day() {
        let mut ledger = ledger_with(&["A", "B"]);
        let base = Utc.with_ymd_and_hms(2024, 3, 10, 22, 30, 0).unwrap();
        let mut history = Vec::new();
        for (offset_hours, score) in [(0, 1), (3, 2), (30, 3)] {
            ledger.start_new_game(true);
            ledger.add_round(vec![score, -score]).unwrap();
            let mut session = ledger.current_session();
            session.date = base + Duration::hours(offset_hours);
            history.push(session);
        }
        ledger.history = history;

        let utc_days = ledger.group_history_by_day(&Utc);
        let sizes: Vec<_> = utc_days.iter().map(|d| d.sessions.len()).collect();
        assert_eq!(sizes, vec![1, 1, 1]);

        let minus_three = FixedOffset::west_opt(3 * 3600).unwrap();
        let local_days = ledger.group_history_by_day(&minus_three);
        let sizes: Vec<_> = local_days.iter().map(|d| d.sessions.len()).collect();
        assert_eq!(sizes, vec![1, 2]);
        assert!(local_days[1].sessions[0].date > local_days[1].sessions[1].date);

        let now = base + Duration::hours(31);
        let (today, older) = ledger.split_history_today(&now);
        assert_eq!(today.len(), 1);
        assert_eq!(older.len(), 2);
    }

    #[test]
    fn career_standings_follow_player_ids_across_sessions() {
        let mut ledger = ledger_with(&["A", "B"]);
        ledger.add_round(vec![3, -3]).unwrap();
        ledger.save_current_game();
        ledger.start_new_game(true);
        let a = ledger.players()[0].id;
        ledger.edit_player(a, "Anh");
        ledger.add_round(vec![-1, 1]).unwrap();
        ledger.save_current_game();

        let standings = ledger.career_standings();
        assert_eq!(standings.len(), 2);
        assert_eq!(standings[0].player_id, a);
        assert_eq!(standings[0].total, 2);
        assert_eq!(standings[0].sessions_played, 2);
        assert_eq!(standings[1].total, -2);
    }

    #[test]
    fn reset_all_clears_everything_but_mode() {
        let mut ledger = ScoreLedger::new(ScoringMode::Cumulative);
        ledger.add_player("A").unwrap();
        ledger.add_round(vec![7]).unwrap();
        ledger.save_current_game();
        ledger.set_preferences(Preferences {
            theme: "dark".to_string(),
            sound_enabled: false,
        });

        ledger.reset_all();
        assert!(ledger.players().is_empty());
        assert!(ledger.rounds().is_empty());
        assert!(ledger.history().is_empty());
        assert_eq!(ledger.preferences(), &Preferences::default());
        assert_eq!(ledger.mode(), ScoringMode::Cumulative);
    }

    #[test]
    fn observers_hear_successful_mutations_only() {
        let recorder = Arc::new(Recorder::default());
        let mut ledger = ScoreLedger::new(ScoringMode::ZeroSum);
        ledger.subscribe(recorder.clone());

        ledger.add_player("A").unwrap();
        ledger.add_player("B").unwrap();
        let _ = ledger.add_round(vec![1, 0]);
        ledger.add_round(vec![1, -1]).unwrap();
        ledger.save_current_game();
        ledger.end_game();

        let changes = recorder.changes.lock().unwrap().clone();
        assert_eq!(
            changes,
            vec![
                LedgerChange::Roster,
                LedgerChange::Roster,
                LedgerChange::Rounds,
                LedgerChange::History,
                LedgerChange::GameEnded,
            ]
        );
    }
}
