//! Route Definitions
//!
//! Maps every HTTP path to its handler. Middleware (request ids, CORS,
//! timeouts, tracing) is layered in the server module so this file stays a
//! plain table of the API surface.

use super::handlers::*;
use super::websocket::websocket_handler;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build the complete application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .route("/health", get(health_handler))
        // Players
        .route("/users", post(create_user_handler))
        .route("/users/:id", get(get_user_handler))
        // Games
        .route("/games", get(list_games_handler).post(create_game_handler))
        .route("/games/:id", get(get_game_handler))
        .route("/games/:id/call", post(call_number_handler))
        .route("/games/:id/book", post(book_tickets_handler))
        .route("/games/:id/tickets", get(list_tickets_handler))
        .route("/games/:id/stats", get(game_stats_handler))
        .route("/games/:id/prizes", post(update_prizes_handler))
        .route(
            "/games/:id/claims",
            get(list_claims_handler).post(submit_claim_handler),
        )
        // Claim review
        .route("/claims/:id/approve", post(approve_claim_handler))
        .route("/claims/:id/reject", post(reject_claim_handler))
        // Wallet
        .route("/wallet/deposit", post(deposit_handler))
        .route("/wallet/withdraw", post(withdraw_handler))
        .route("/wallet/:user_id/history", get(wallet_history_handler))
        .route("/transactions/:id/approve", post(approve_transaction_handler))
        .route("/transactions/:id/reject", post(reject_transaction_handler))
        // Live rooms
        .route("/ws", get(websocket_handler))
        .with_state(state)
}
