//! API Request/Response Models
//!
//! Wire shapes for the operator and player commands. Domain types
//! (`Game`, `Ticket`, `Claim`, `WalletTransaction`) serialize directly and
//! are returned as-is.

use crate::game::types::{ClaimType, PrizePool};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Create a player profile
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    /// Opening balance; production deployments leave this at zero and fund
    /// accounts through deposits.
    #[serde(default)]
    pub balance: f64,
}

/// Operator command: announce a number
#[derive(Debug, Clone, Deserialize)]
pub struct CallNumberRequest {
    pub number: u8,
}

/// Player command: book tickets for a game
#[derive(Debug, Clone, Deserialize)]
pub struct BookTicketsRequest {
    pub user_id: u64,
    pub count: u32,
}

/// Player command: submit a prize claim
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitClaimRequest {
    pub ticket_id: u64,
    pub user_id: u64,
    pub claim_type: ClaimType,
}

/// Operator command: replace a game's prize pool
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePrizePoolRequest {
    pub prize_pool: PrizePool,
}

/// Wallet deposit/withdraw request body
#[derive(Debug, Clone, Deserialize)]
pub struct WalletRequest {
    pub user_id: u64,
    pub amount: f64,
    #[serde(default)]
    pub details: Option<String>,
}

/// Tickets listing filter
#[derive(Debug, Clone, Deserialize)]
pub struct TicketsQuery {
    #[serde(default)]
    pub user_id: Option<u64>,
}

/// Generic acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
}

impl AckResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
