//! Request Handlers
//!
//! Thin adapters from HTTP to the game core: extract, call, map errors.
//! All game-state mutation and serialization discipline lives in the
//! registry, not here.

use super::{errors::ApiError, middleware::RequestId, models::*};
use crate::game::claims::PayoutRecord;
use crate::game::registry::{GameSessionRegistry, GameStats};
use crate::game::types::{Claim, Game, NewGame, Ticket, UserProfile, WalletTransaction};
use crate::game::wallet::WalletLedger;
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    pub registry: Arc<GameSessionRegistry>,
    pub wallet: Arc<WalletLedger>,
    pub version: String,
}

fn domain(request_id: &RequestId) -> impl Fn(crate::errors::TambolaError) -> ApiError + '_ {
    move |err| ApiError::from_domain(request_id.0.clone(), err)
}

/// Health check handler - minimal response time
/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running".to_string(),
        version: state.version.clone(),
    })
}

/// POST /users
pub async fn create_user_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateUserRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    if body.name.trim().is_empty() {
        return Err(ApiError::bad_request(
            request_id.0,
            "name must not be empty".to_string(),
        ));
    }
    let user = state
        .registry
        .store()
        .create_user(body.name.trim(), body.balance)
        .await
        .map_err(domain(&request_id))?;
    Ok(Json(user))
}

/// GET /users/:id
pub async fn get_user_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<u64>,
) -> Result<Json<UserProfile>, ApiError> {
    state
        .registry
        .store()
        .load_user(user_id)
        .await
        .map_err(domain(&request_id))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(request_id.0, format!("User {} not found", user_id)))
}

/// GET /games
pub async fn list_games_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Game>>, ApiError> {
    let games = state
        .registry
        .store()
        .list_games()
        .await
        .map_err(domain(&request_id))?;
    Ok(Json(games))
}

/// POST /games (operator)
pub async fn create_game_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewGame>,
) -> Result<Json<Game>, ApiError> {
    let game = state
        .registry
        .create_game(body)
        .await
        .map_err(domain(&request_id))?;
    Ok(Json(game))
}

/// GET /games/:id
pub async fn get_game_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<u64>,
) -> Result<Json<Game>, ApiError> {
    state
        .registry
        .store()
        .load_game(game_id)
        .await
        .map_err(domain(&request_id))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(request_id.0, format!("Game {} not found", game_id)))
}

/// POST /games/:id/call (operator)
pub async fn call_number_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<u64>,
    Json(body): Json<CallNumberRequest>,
) -> Result<Json<AckResponse>, ApiError> {
    state
        .registry
        .call_number(game_id, body.number)
        .await
        .map_err(domain(&request_id))?;
    Ok(Json(AckResponse::ok()))
}

/// POST /games/:id/book
pub async fn book_tickets_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<u64>,
    Json(body): Json<BookTicketsRequest>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    let tickets = state
        .registry
        .buy_tickets(game_id, body.user_id, body.count)
        .await
        .map_err(domain(&request_id))?;
    Ok(Json(tickets))
}

/// GET /games/:id/tickets?user_id={id}
pub async fn list_tickets_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<u64>,
    Query(query): Query<TicketsQuery>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    let tickets = state
        .registry
        .store()
        .list_tickets(game_id, query.user_id)
        .await
        .map_err(domain(&request_id))?;
    Ok(Json(tickets))
}

/// GET /games/:id/stats (operator)
pub async fn game_stats_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<u64>,
) -> Result<Json<GameStats>, ApiError> {
    let stats = state
        .registry
        .game_stats(game_id)
        .await
        .map_err(domain(&request_id))?;
    Ok(Json(stats))
}

/// POST /games/:id/prizes (operator)
pub async fn update_prizes_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<u64>,
    Json(body): Json<UpdatePrizePoolRequest>,
) -> Result<Json<AckResponse>, ApiError> {
    state
        .registry
        .update_prize_pool(game_id, body.prize_pool)
        .await
        .map_err(domain(&request_id))?;
    Ok(Json(AckResponse::ok()))
}

/// POST /games/:id/claims
pub async fn submit_claim_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<u64>,
    Json(body): Json<SubmitClaimRequest>,
) -> Result<Json<Claim>, ApiError> {
    let claim = state
        .registry
        .submit_claim(game_id, body.ticket_id, body.user_id, body.claim_type)
        .await
        .map_err(domain(&request_id))?;
    Ok(Json(claim))
}

/// GET /games/:id/claims (operator)
pub async fn list_claims_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<u64>,
) -> Result<Json<Vec<Claim>>, ApiError> {
    let claims = state
        .registry
        .store()
        .list_claims(game_id)
        .await
        .map_err(domain(&request_id))?;
    Ok(Json(claims))
}

/// POST /claims/:id/approve (operator)
pub async fn approve_claim_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(claim_id): Path<u64>,
) -> Result<Json<PayoutRecord>, ApiError> {
    let payout = state
        .registry
        .approve_claim(claim_id)
        .await
        .map_err(domain(&request_id))?;
    Ok(Json(payout))
}

/// POST /claims/:id/reject (operator)
pub async fn reject_claim_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(claim_id): Path<u64>,
) -> Result<Json<Claim>, ApiError> {
    let claim = state
        .registry
        .reject_claim(claim_id)
        .await
        .map_err(domain(&request_id))?;
    Ok(Json(claim))
}

/// POST /wallet/deposit
pub async fn deposit_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<WalletRequest>,
) -> Result<Json<WalletTransaction>, ApiError> {
    let tx = state
        .wallet
        .request_deposit(body.user_id, body.amount, body.details)
        .await
        .map_err(domain(&request_id))?;
    Ok(Json(tx))
}

/// POST /wallet/withdraw
pub async fn withdraw_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<WalletRequest>,
) -> Result<Json<WalletTransaction>, ApiError> {
    let tx = state
        .wallet
        .request_withdraw(body.user_id, body.amount, body.details)
        .await
        .map_err(domain(&request_id))?;
    Ok(Json(tx))
}

/// GET /wallet/:user_id/history
pub async fn wallet_history_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<u64>,
) -> Result<Json<Vec<WalletTransaction>>, ApiError> {
    let history = state
        .wallet
        .history(user_id)
        .await
        .map_err(domain(&request_id))?;
    Ok(Json(history))
}

/// POST /transactions/:id/approve (operator)
pub async fn approve_transaction_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(tx_id): Path<u64>,
) -> Result<Json<WalletTransaction>, ApiError> {
    let tx = state
        .wallet
        .approve_transaction(tx_id)
        .await
        .map_err(domain(&request_id))?;
    Ok(Json(tx))
}

/// POST /transactions/:id/reject (operator)
pub async fn reject_transaction_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(tx_id): Path<u64>,
) -> Result<Json<WalletTransaction>, ApiError> {
    let tx = state
        .wallet
        .reject_transaction(tx_id)
        .await
        .map_err(domain(&request_id))?;
    Ok(Json(tx))
}
