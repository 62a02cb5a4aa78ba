//! crates/score_ledger_core/src/domain.rs
//!
//! Defines the core data structures of the score ledger: players, rounds,
//! saved sessions and the derived leaderboard rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Smallest roster a resize may produce.
pub const MIN_PLAYERS: usize = 2;
/// Largest roster the ledger will hold.
pub const MAX_PLAYERS: usize = 8;

/// Avatar colours handed out to new seats, cycled by roster size.
pub const AVATAR_PALETTE: [&str; MAX_PLAYERS] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#FFA07A", "#98D8C8", "#F7DC6F", "#BB8FCE", "#85C1E9",
];

//=========================================================================================
// Players
//=========================================================================================

/// Opaque display attribute of a player. The ledger never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AvatarToken(String);

impl AvatarToken {
    /// Picks the palette entry for a seat created when the roster holds `roster_len` seats.
    pub fn for_seat(roster_len: usize) -> Self {
        Self(AVATAR_PALETTE[roster_len % AVATAR_PALETTE.len()].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AvatarToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A seat on the roster. Blank names mark placeholder seats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub avatar: AvatarToken,
}

impl Player {
    pub fn new(name: impl Into<String>, avatar: AvatarToken) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            avatar,
        }
    }

    /// A seat with no name yet.
    pub fn blank(avatar: AvatarToken) -> Self {
        Self::new(String::new(), avatar)
    }

    pub fn is_named(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

//=========================================================================================
// Rounds and Sessions
//=========================================================================================

/// Which validation rule `add_round` applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringMode {
    /// Every round's deltas must sum to exactly zero (chip settlement).
    #[default]
    ZeroSum,
    /// Each entry is an independent point count; no sum constraint.
    Cumulative,
}

impl fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringMode::ZeroSum => f.write_str("zero-sum"),
            ScoringMode::Cumulative => f.write_str("cumulative"),
        }
    }
}

impl std::str::FromStr for ScoringMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero-sum" | "zerosum" | "zero_sum" => Ok(ScoringMode::ZeroSum),
            "cumulative" => Ok(ScoringMode::Cumulative),
            other => Err(format!("unknown scoring mode '{}'", other)),
        }
    }
}

/// One scoring event. `scores[i]` belongs to roster seat `i`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub scores: Vec<i64>,
}

impl Round {
    pub fn new(scores: Vec<i64>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            scores,
        }
    }

    /// The round's total, clamped to the `i64` range.
    pub fn sum(&self) -> i64 {
        self.scores.iter().fold(0i64, |acc, s| acc.saturating_add(*s))
    }
}

/// A saved play sequence: roster snapshot plus its rounds in play order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub players: Vec<Player>,
    pub rounds: Vec<Round>,
    #[serde(default)]
    pub is_ended: bool,
}

impl Session {
    pub fn totals(&self) -> Vec<i64> {
        seat_totals(self.players.len(), &self.rounds)
    }

    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        rank_players(&self.players, &self.totals())
    }

    /// The top-ranked named player, if the session has any.
    pub fn winner(&self) -> Option<LeaderboardEntry> {
        self.leaderboard().into_iter().next()
    }
}

/// Display preferences carried in the current-game record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub theme: String,
    pub sound_enabled: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: "classic".to_string(),
            sound_enabled: true,
        }
    }
}

//=========================================================================================
// Derived Views
//=========================================================================================

/// A leaderboard row. `rank` is the 1-based position in the sorted list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub seat: usize,
    pub player: Player,
    pub total: i64,
}

/// Totals of one player across every saved session they took part in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CareerStanding {
    pub player_id: Uuid,
    pub name: String,
    pub avatar: AvatarToken,
    pub total: i64,
    pub sessions_played: usize,
}

/// History entries that fall on the same calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryDay {
    pub day: chrono::NaiveDate,
    pub sessions: Vec<Session>,
}

/// Sums each seat across `rounds`. Entries past a round's length count as zero,
/// and entries past `seats` are ignored. Sums clamp at the `i64` bounds.
pub fn seat_totals(seats: usize, rounds: &[Round]) -> Vec<i64> {
    let mut totals = vec![0i64; seats];
    for round in rounds {
        for (total, score) in totals.iter_mut().zip(&round.scores) {
            *total = total.saturating_add(*score);
        }
    }
    totals
}

/// Pairs named players with their totals and sorts by total, highest first.
/// `sort_by` is stable, so equal totals keep roster order.
pub fn rank_players(players: &[Player], totals: &[i64]) -> Vec<LeaderboardEntry> {
    let mut rows: Vec<(usize, &Player, i64)> = players
        .iter()
        .enumerate()
        .filter(|(_, p)| p.is_named())
        .map(|(seat, p)| (seat, p, totals.get(seat).copied().unwrap_or(0)))
        .collect();
    rows.sort_by(|a, b| b.2.cmp(&a.2));

    rows.into_iter()
        .enumerate()
        .map(|(pos, (seat, player, total))| LeaderboardEntry {
            rank: pos + 1,
            seat,
            player: player.clone(),
            total,
        })
        .collect()
}

/// Reads a score typed into a numeric field: optional sign followed by digits,
/// anything after the digits ignored. Text with no leading number reads as zero.
pub fn parse_score_entry(text: &str) -> i64 {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    match digits[..end].parse::<i64>() {
        Ok(value) if negative => -value,
        Ok(value) => value,
        Err(_) => 0,
    }
}
