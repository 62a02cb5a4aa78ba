//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.
//!
//! Handlers translate HTTP into ledger calls. The ledger has no confirmation
//! step, so anything destructive here runs as soon as it is requested.

use crate::web::protocol::{
    AddRoundRequest, ChangeResponse, EndGameResponse, GameView, HistoryDayView,
    HistorySplitView, LeaderboardRow, NewGameRequest, PlayerNameRequest, PlayerView,
    PreferencesBody, ResizeRosterRequest, RoundView, ScoreEntry, SessionDetail, SessionSummary,
    StandingView,
};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Local;
use score_ledger_core::{EndGame, LedgerError};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::OpenApi;
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        get_game_handler,
        add_player_handler,
        edit_player_handler,
        remove_player_handler,
        resize_roster_handler,
        add_round_handler,
        delete_round_handler,
        leaderboard_handler,
        end_game_handler,
        new_game_handler,
        save_game_handler,
        list_history_handler,
        history_days_handler,
        history_today_handler,
        get_history_entry_handler,
        load_history_entry_handler,
        delete_history_entry_handler,
        standings_handler,
        update_preferences_handler,
        reset_data_handler,
    ),
    components(
        schemas(
            PlayerNameRequest, ResizeRosterRequest, ScoreEntry, AddRoundRequest, NewGameRequest,
            PreferencesBody, ChangeResponse, EndGameResponse, PlayerView, RoundView,
            LeaderboardRow, GameView, SessionSummary, SessionDetail, HistoryDayView,
            HistorySplitView, StandingView
        )
    ),
    tags(
        (name = "Score Ledger API", description = "Players, rounds, totals and game history for a table of card players.")
    )
)]
pub struct ApiDoc;

type Rejection = (StatusCode, String);

/// Maps a ledger rejection onto an HTTP status.
fn rejection(e: LedgerError) -> Rejection {
    let status = match e {
        LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
        LedgerError::GameEnded => StatusCode::CONFLICT,
    };
    (status, e.to_string())
}

fn not_found(what: &str, id: Uuid) -> Rejection {
    (StatusCode::NOT_FOUND, format!("{} {} not found", what, id))
}

//=========================================================================================
// Current Game
//=========================================================================================

/// Get the in-progress game with its per-seat totals.
#[utoipa::path(
    get,
    path = "/game",
    responses((status = 200, description = "The current game", body = GameView))
)]
pub async fn get_game_handler(State(app_state): State<Arc<AppState>>) -> Json<GameView> {
    let ledger = app_state.ledger.lock().await;
    Json(GameView::from(&*ledger))
}

/// Add a player to the end of the roster.
///
/// This always appends a new seat, even when the roster still has blank seats
/// (a fresh game starts with `INITIAL_SEATS` of them). To name a blank seat, use
/// `PUT /players/{id}`; to drop unused seats, use `PUT /roster`.
#[utoipa::path(
    post,
    path = "/players",
    request_body = PlayerNameRequest,
    responses(
        (status = 201, description = "Player appended after any existing seats, blank ones included", body = PlayerView),
        (status = 400, description = "Blank name or full roster")
    )
)]
pub async fn add_player_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<PlayerNameRequest>,
) -> Result<(StatusCode, Json<PlayerView>), Rejection> {
    let mut ledger = app_state.ledger.lock().await;
    let player = ledger.add_player(&req.name).map_err(rejection)?;
    Ok((StatusCode::CREATED, Json(PlayerView::from(&player))))
}

/// Rename a player. Blank names and unknown ids change nothing.
#[utoipa::path(
    put,
    path = "/players/{id}",
    request_body = PlayerNameRequest,
    params(("id" = Uuid, Path, description = "The player's id.")),
    responses((status = 200, description = "Whether the name changed", body = ChangeResponse))
)]
pub async fn edit_player_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<PlayerNameRequest>,
) -> Json<ChangeResponse> {
    let mut ledger = app_state.ledger.lock().await;
    let changed = ledger.edit_player(id, &req.name);
    Json(ChangeResponse { changed })
}

/// Remove a player and their seat from the in-progress rounds.
#[utoipa::path(
    delete,
    path = "/players/{id}",
    params(("id" = Uuid, Path, description = "The player's id.")),
    responses((status = 200, description = "Whether a player was removed", body = ChangeResponse))
)]
pub async fn remove_player_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Json<ChangeResponse> {
    let mut ledger = app_state.ledger.lock().await;
    let changed = ledger.remove_player(id);
    Json(ChangeResponse { changed })
}

/// Set the number of seats. Counts outside 2..=8 are ignored.
#[utoipa::path(
    put,
    path = "/roster",
    request_body = ResizeRosterRequest,
    responses((status = 200, description = "Whether the roster was resized", body = ChangeResponse))
)]
pub async fn resize_roster_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<ResizeRosterRequest>,
) -> Json<ChangeResponse> {
    let mut ledger = app_state.ledger.lock().await;
    let changed = ledger.resize_player_roster(req.count);
    Json(ChangeResponse { changed })
}

/// Record a round of scores.
#[utoipa::path(
    post,
    path = "/rounds",
    request_body = AddRoundRequest,
    responses(
        (status = 201, description = "Round recorded", body = RoundView),
        (status = 400, description = "Scores do not fit the roster or do not balance"),
        (status = 409, description = "The game has ended")
    )
)]
pub async fn add_round_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<AddRoundRequest>,
) -> Result<(StatusCode, Json<RoundView>), Rejection> {
    let scores = req.scores.iter().map(ScoreEntry::value).collect();
    let mut ledger = app_state.ledger.lock().await;
    let round = ledger.add_round(scores).map_err(rejection)?;
    Ok((StatusCode::CREATED, Json(RoundView::from(&round))))
}

/// Delete a round. Deleting an unknown round is not an error.
#[utoipa::path(
    delete,
    path = "/rounds/{id}",
    params(("id" = Uuid, Path, description = "The round's id.")),
    responses(
        (status = 200, description = "Whether a round was removed", body = ChangeResponse),
        (status = 409, description = "The game has ended")
    )
)]
pub async fn delete_round_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ChangeResponse>, Rejection> {
    let mut ledger = app_state.ledger.lock().await;
    let changed = ledger.delete_round(id).map_err(rejection)?;
    Ok(Json(ChangeResponse { changed }))
}

/// Named players ranked by total for the in-progress game.
#[utoipa::path(
    get,
    path = "/leaderboard",
    responses((status = 200, description = "Ranked players", body = [LeaderboardRow]))
)]
pub async fn leaderboard_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<Vec<LeaderboardRow>> {
    let ledger = app_state.ledger.lock().await;
    Json(ledger.leaderboard().iter().map(LeaderboardRow::from).collect())
}

/// Finish the current game. A game with no rounds is left as it is.
#[utoipa::path(
    post,
    path = "/game/end",
    responses((status = 200, description = "Whether the game ended", body = EndGameResponse))
)]
pub async fn end_game_handler(State(app_state): State<Arc<AppState>>) -> Json<EndGameResponse> {
    let mut ledger = app_state.ledger.lock().await;
    let response = match ledger.end_game() {
        EndGame::Ended => EndGameResponse {
            ended: true,
            message: "game ended".to_string(),
        },
        EndGame::NoRounds => EndGameResponse {
            ended: false,
            message: "no rounds to end".to_string(),
        },
    };
    Json(response)
}

/// Start a new game, by default saving the current one and keeping the names.
#[utoipa::path(
    post,
    path = "/game/new",
    request_body = NewGameRequest,
    responses((status = 200, description = "The new game", body = GameView))
)]
pub async fn new_game_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<NewGameRequest>,
) -> Json<GameView> {
    let mut ledger = app_state.ledger.lock().await;
    if req.save_current {
        ledger.save_current_game();
    }
    ledger.start_new_game(req.preserve_names);
    info!(session_id = %ledger.session_id(), "Started a new game.");
    Json(GameView::from(&*ledger))
}

/// Save the current game into history.
#[utoipa::path(
    post,
    path = "/game/save",
    responses((status = 200, description = "Whether anything was saved", body = ChangeResponse))
)]
pub async fn save_game_handler(State(app_state): State<Arc<AppState>>) -> Json<ChangeResponse> {
    let mut ledger = app_state.ledger.lock().await;
    let changed = ledger.save_current_game();
    Json(ChangeResponse { changed })
}

//=========================================================================================
// History
//=========================================================================================

/// Saved games, most recently created first.
#[utoipa::path(
    get,
    path = "/history",
    responses((status = 200, description = "Saved games", body = [SessionSummary]))
)]
pub async fn list_history_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<Vec<SessionSummary>> {
    let ledger = app_state.ledger.lock().await;
    Json(ledger.history().iter().map(SessionSummary::from).collect())
}

/// Saved games grouped by local calendar day, newest first.
#[utoipa::path(
    get,
    path = "/history/days",
    responses((status = 200, description = "Saved games by day", body = [HistoryDayView]))
)]
pub async fn history_days_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<Vec<HistoryDayView>> {
    let ledger = app_state.ledger.lock().await;
    Json(
        ledger
            .group_history_by_day(&Local)
            .iter()
            .map(HistoryDayView::from)
            .collect(),
    )
}

/// Saved games split into today's and older ones.
#[utoipa::path(
    get,
    path = "/history/today",
    responses((status = 200, description = "Today's and older games", body = HistorySplitView))
)]
pub async fn history_today_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<HistorySplitView> {
    let ledger = app_state.ledger.lock().await;
    let (today, older) = ledger.split_history_today(&Local::now());
    Json(HistorySplitView {
        today: today.iter().map(SessionSummary::from).collect(),
        older: older.iter().map(SessionSummary::from).collect(),
    })
}

/// One saved game with its rounds and final ranking.
#[utoipa::path(
    get,
    path = "/history/{id}",
    params(("id" = Uuid, Path, description = "The session's id.")),
    responses(
        (status = 200, description = "The saved game", body = SessionDetail),
        (status = 404, description = "No saved game with that id")
    )
)]
pub async fn get_history_entry_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionDetail>, Rejection> {
    let ledger = app_state.ledger.lock().await;
    let session = ledger
        .history_entry(id)
        .ok_or_else(|| not_found("Session", id))?;
    Ok(Json(SessionDetail::from(session)))
}

/// Resume a saved game. Unsaved rounds of the current game are saved first.
#[utoipa::path(
    post,
    path = "/history/{id}/load",
    params(("id" = Uuid, Path, description = "The session's id.")),
    responses(
        (status = 200, description = "The loaded game", body = GameView),
        (status = 404, description = "No saved game with that id")
    )
)]
pub async fn load_history_entry_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameView>, Rejection> {
    let mut ledger = app_state.ledger.lock().await;
    let session = ledger
        .history_entry(id)
        .cloned()
        .ok_or_else(|| not_found("Session", id))?;
    ledger.load_game(session);
    info!(session_id = %id, "Loaded a saved game.");
    Ok(Json(GameView::from(&*ledger)))
}

/// Delete a saved game.
#[utoipa::path(
    delete,
    path = "/history/{id}",
    params(("id" = Uuid, Path, description = "The session's id.")),
    responses((status = 200, description = "Whether a saved game was removed", body = ChangeResponse))
)]
pub async fn delete_history_entry_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Json<ChangeResponse> {
    let mut ledger = app_state.ledger.lock().await;
    let changed = ledger.delete_history_entry(id);
    Json(ChangeResponse { changed })
}

/// Totals per player across all saved games.
#[utoipa::path(
    get,
    path = "/standings",
    responses((status = 200, description = "Career standings", body = [StandingView]))
)]
pub async fn standings_handler(State(app_state): State<Arc<AppState>>) -> Json<Vec<StandingView>> {
    let ledger = app_state.ledger.lock().await;
    Json(ledger.career_standings().iter().map(StandingView::from).collect())
}

//=========================================================================================
// Settings
//=========================================================================================

/// Replace the display preferences stored with the current game.
#[utoipa::path(
    put,
    path = "/preferences",
    request_body = PreferencesBody,
    responses((status = 200, description = "The stored preferences", body = PreferencesBody))
)]
pub async fn update_preferences_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<PreferencesBody>,
) -> Json<PreferencesBody> {
    let mut ledger = app_state.ledger.lock().await;
    ledger.set_preferences(req.into());
    Json(PreferencesBody::from(ledger.preferences()))
}

/// Erase every player, round and saved game.
#[utoipa::path(
    delete,
    path = "/data",
    responses((status = 204, description = "All data erased"))
)]
pub async fn reset_data_handler(State(app_state): State<Arc<AppState>>) -> StatusCode {
    let mut ledger = app_state.ledger.lock().await;
    ledger.reset_all();
    ledger.resize_player_roster(app_state.config.initial_seats);
    warn!("All ledger data was erased.");
    StatusCode::NO_CONTENT
}
