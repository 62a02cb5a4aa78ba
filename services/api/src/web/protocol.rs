//! services/api/src/web/protocol.rs
//!
//! Request and response bodies of the REST API, and their conversions from the
//! core's domain types.

use chrono::{DateTime, NaiveDate, Utc};
use score_ledger_core::{
    parse_score_entry, CareerStanding, HistoryDay, LeaderboardEntry, Player, Preferences, Round,
    ScoreLedger, Session,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Requests Sent FROM the Client TO the Server
//=========================================================================================

#[derive(Deserialize, Debug, ToSchema)]
pub struct PlayerNameRequest {
    pub name: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct ResizeRosterRequest {
    pub count: usize,
}

/// A single score field. Numbers are taken as-is; text is read the way a numeric
/// input reads it, so unparseable text counts as zero.
#[derive(Deserialize, Debug, Clone, ToSchema)]
#[serde(untagged)]
pub enum ScoreEntry {
    Number(i64),
    Text(String),
}

impl ScoreEntry {
    pub fn value(&self) -> i64 {
        match self {
            ScoreEntry::Number(n) => *n,
            ScoreEntry::Text(text) => parse_score_entry(text),
        }
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct AddRoundRequest {
    /// One entry per roster seat, in seat order.
    pub scores: Vec<ScoreEntry>,
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct NewGameRequest {
    /// Keep the current names for the next game.
    #[serde(default = "default_true")]
    pub preserve_names: bool,
    /// Save the current game to history before starting over.
    #[serde(default = "default_true")]
    pub save_current: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct PreferencesBody {
    pub theme: String,
    pub sound_enabled: bool,
}

impl From<&Preferences> for PreferencesBody {
    fn from(p: &Preferences) -> Self {
        Self {
            theme: p.theme.clone(),
            sound_enabled: p.sound_enabled,
        }
    }
}

impl From<PreferencesBody> for Preferences {
    fn from(body: PreferencesBody) -> Self {
        Self {
            theme: body.theme,
            sound_enabled: body.sound_enabled,
        }
    }
}

//=========================================================================================
// Responses Sent FROM the Server TO the Client
//=========================================================================================

/// Reports whether a forgiving write actually changed anything.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ChangeResponse {
    pub changed: bool,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct EndGameResponse {
    pub ended: bool,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct PlayerView {
    pub id: Uuid,
    pub name: String,
    pub avatar: String,
}

impl From<&Player> for PlayerView {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            avatar: p.avatar.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct RoundView {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub scores: Vec<i64>,
    pub sum: i64,
}

impl From<&Round> for RoundView {
    fn from(r: &Round) -> Self {
        Self {
            id: r.id,
            timestamp: r.timestamp,
            scores: r.scores.clone(),
            sum: r.sum(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub seat: usize,
    pub player: PlayerView,
    pub total: i64,
}

impl From<&LeaderboardEntry> for LeaderboardRow {
    fn from(e: &LeaderboardEntry) -> Self {
        Self {
            rank: e.rank,
            seat: e.seat,
            player: PlayerView::from(&e.player),
            total: e.total,
        }
    }
}

/// The whole in-progress game.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct GameView {
    pub session_id: Uuid,
    pub mode: String,
    pub players: Vec<PlayerView>,
    pub rounds: Vec<RoundView>,
    /// Per-seat totals, aligned with `players`.
    pub totals: Vec<i64>,
    pub is_ended: bool,
    pub can_start: bool,
    pub preferences: PreferencesBody,
}

impl From<&ScoreLedger> for GameView {
    fn from(ledger: &ScoreLedger) -> Self {
        Self {
            session_id: ledger.session_id(),
            mode: ledger.mode().to_string(),
            players: ledger.players().iter().map(PlayerView::from).collect(),
            rounds: ledger.rounds().iter().map(RoundView::from).collect(),
            totals: ledger.compute_totals(),
            is_ended: ledger.is_ended(),
            can_start: ledger.can_start(),
            preferences: PreferencesBody::from(ledger.preferences()),
        }
    }
}

/// A history list item.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct SessionSummary {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub is_ended: bool,
    pub round_count: usize,
    pub players: Vec<PlayerView>,
    pub totals: Vec<i64>,
    pub winner: Option<LeaderboardRow>,
}

impl From<&Session> for SessionSummary {
    fn from(s: &Session) -> Self {
        Self {
            id: s.id,
            date: s.date,
            is_ended: s.is_ended,
            round_count: s.rounds.len(),
            players: s.players.iter().map(PlayerView::from).collect(),
            totals: s.totals(),
            winner: s.winner().as_ref().map(LeaderboardRow::from),
        }
    }
}

/// A single saved session with everything needed to show its details.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct SessionDetail {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub is_ended: bool,
    pub players: Vec<PlayerView>,
    pub rounds: Vec<RoundView>,
    pub totals: Vec<i64>,
    pub leaderboard: Vec<LeaderboardRow>,
}

impl From<&Session> for SessionDetail {
    fn from(s: &Session) -> Self {
        Self {
            id: s.id,
            date: s.date,
            is_ended: s.is_ended,
            players: s.players.iter().map(PlayerView::from).collect(),
            rounds: s.rounds.iter().map(RoundView::from).collect(),
            totals: s.totals(),
            leaderboard: s.leaderboard().iter().map(LeaderboardRow::from).collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct HistoryDayView {
    pub day: NaiveDate,
    pub sessions: Vec<SessionSummary>,
}

impl From<&HistoryDay> for HistoryDayView {
    fn from(d: &HistoryDay) -> Self {
        Self {
            day: d.day,
            sessions: d.sessions.iter().map(SessionSummary::from).collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct HistorySplitView {
    pub today: Vec<SessionSummary>,
    pub older: Vec<SessionSummary>,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct StandingView {
    pub player_id: Uuid,
    pub name: String,
    pub avatar: String,
    pub total: i64,
    pub sessions_played: usize,
}

impl From<&CareerStanding> for StandingView {
    fn from(s: &CareerStanding) -> Self {
        Self {
            player_id: s.player_id,
            name: s.name.clone(),
            avatar: s.avatar.to_string(),
            total: s.total,
            sessions_played: s.sessions_played,
        }
    }
}
