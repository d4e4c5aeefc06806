//! Error taxonomy for the Tambola game core
//!
//! Every variant here is recoverable at the request boundary: the caller
//! surfaces a rejection and takes no further action. None are fatal to the
//! process, and none carry an automatic retry policy.

use crate::game::types::{ClaimType, TransactionStatus};

/// Root error type for all game-core operations
#[derive(Debug, thiserror::Error)]
pub enum TambolaError {
    #[error("Game {0} not found")]
    GameNotFound(u64),

    #[error("Ticket {0} not found")]
    TicketNotFound(u64),

    #[error("Claim {0} not found")]
    ClaimNotFound(u64),

    #[error("User {0} not found")]
    UserNotFound(u64),

    #[error("Transaction {0} not found")]
    TransactionNotFound(u64),

    #[error("Number {number} already called for game {game_id}")]
    DuplicateNumber { game_id: u64, number: u8 },

    #[error("Number {0} is outside the valid range 1-90")]
    NumberOutOfRange(u8),

    #[error("A {claim_type} claim already exists for ticket {ticket_id}")]
    DuplicateClaim { ticket_id: u64, claim_type: ClaimType },

    #[error("Ticket {ticket_id} does not satisfy the {claim_type} pattern yet")]
    ClaimNotEligible { ticket_id: u64, claim_type: ClaimType },

    #[error("Claim {claim_id} already processed (status: {status})")]
    ClaimAlreadyProcessed { claim_id: u64, status: String },

    #[error("Transaction {tx_id} already processed (status: {status})")]
    TransactionAlreadyProcessed {
        tx_id: u64,
        status: TransactionStatus,
    },

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: f64, available: f64 },

    #[error("Game {game_id} has already started or finished")]
    GameAlreadyStarted { game_id: u64 },

    #[error("Game {game_id} is full: {sold} of {capacity} tickets sold")]
    GameFull {
        game_id: u64,
        sold: usize,
        capacity: u32,
    },

    #[error("Ticket {ticket_id} does not belong to game {game_id}")]
    TicketGameMismatch { ticket_id: u64, game_id: u64 },

    #[error("Ticket generation exceeded {attempts} attempts for a single cell")]
    TicketGeneration { attempts: u32 },

    #[error("Invalid game definition: {0}")]
    InvalidGame(String),

    #[error("Amount must be positive, got {0}")]
    InvalidAmount(f64),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Convenience type alias for Results
pub type TambolaResult<T> = Result<T, TambolaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TambolaError::DuplicateNumber {
            game_id: 7,
            number: 42,
        };
        assert!(err.to_string().contains("42"));
        assert!(err.to_string().contains("game 7"));
    }

    #[test]
    fn test_insufficient_balance_details() {
        let err = TambolaError::InsufficientBalance {
            required: 50.0,
            available: 12.5,
        };
        assert!(err.to_string().contains("required 50"));
        assert!(err.to_string().contains("available 12.5"));
    }
}
