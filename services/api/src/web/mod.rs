pub mod protocol;
pub mod rest;
pub mod state;

use axum::{
    routing::{get, post, put},
    Router,
};
use rest::{
    add_player_handler, add_round_handler, delete_history_entry_handler, delete_round_handler,
    edit_player_handler, end_game_handler, get_game_handler, get_history_entry_handler,
    history_days_handler, history_today_handler, leaderboard_handler, list_history_handler,
    load_history_entry_handler, new_game_handler, remove_player_handler, reset_data_handler,
    resize_roster_handler, save_game_handler, standings_handler, update_preferences_handler,
};
use state::AppState;
use std::sync::Arc;

/// Builds the API router over a shared ledger.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/game", get(get_game_handler))
        .route("/game/end", post(end_game_handler))
        .route("/game/new", post(new_game_handler))
        .route("/game/save", post(save_game_handler))
        .route("/players", post(add_player_handler))
        .route(
            "/players/{id}",
            put(edit_player_handler).delete(remove_player_handler),
        )
        .route("/roster", put(resize_roster_handler))
        .route("/rounds", post(add_round_handler))
        .route("/rounds/{id}", axum::routing::delete(delete_round_handler))
        .route("/leaderboard", get(leaderboard_handler))
        .route("/history", get(list_history_handler))
        .route("/history/days", get(history_days_handler))
        .route("/history/today", get(history_today_handler))
        .route(
            "/history/{id}",
            get(get_history_entry_handler).delete(delete_history_entry_handler),
        )
        .route("/history/{id}/load", post(load_history_entry_handler))
        .route("/standings", get(standings_handler))
        .route("/preferences", put(update_preferences_handler))
        .route("/data", axum::routing::delete(reset_data_handler))
        .with_state(app_state)
}
