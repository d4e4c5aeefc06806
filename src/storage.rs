//! Persistence boundary
//!
//! The game core talks to durable storage through the [`GameStore`] trait
//! only; the CRUD application behind it (users, wallet ledger, game rows)
//! is an external collaborator. [`MemoryStore`] is the in-process
//! implementation used by the default server binary and by tests.

use crate::errors::{TambolaError, TambolaResult};
use crate::game::types::{
    Claim, ClaimStatus, ClaimType, Game, GameStatus, NewGame, PrizePool, Ticket, TicketGrid,
    TransactionKind, TransactionStatus, UserProfile, WalletTransaction,
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Narrow persistence interface consumed by the game core.
///
/// Implementations must make each individual operation atomic; the caller
/// provides the cross-operation serialization (one writer per game id).
#[async_trait]
pub trait GameStore: Send + Sync {
    // --- users & wallet ---

    async fn create_user(&self, name: &str, balance: f64) -> TambolaResult<UserProfile>;

    async fn load_user(&self, user_id: u64) -> TambolaResult<Option<UserProfile>>;

    /// Add to a user's balance.
    async fn credit_balance(&self, user_id: u64, amount: f64) -> TambolaResult<()>;

    /// Subtract from a user's balance; fails on insufficient funds.
    async fn debit_balance(&self, user_id: u64, amount: f64) -> TambolaResult<()>;

    async fn record_transaction(
        &self,
        user_id: u64,
        amount: f64,
        kind: TransactionKind,
        status: TransactionStatus,
        details: Option<String>,
    ) -> TambolaResult<WalletTransaction>;

    async fn load_transaction(&self, tx_id: u64) -> TambolaResult<Option<WalletTransaction>>;

    async fn update_transaction_status(
        &self,
        tx_id: u64,
        status: TransactionStatus,
    ) -> TambolaResult<()>;

    async fn list_transactions(&self, user_id: u64) -> TambolaResult<Vec<WalletTransaction>>;

    // --- games ---

    async fn create_game(&self, new_game: NewGame) -> TambolaResult<Game>;

    async fn load_game(&self, game_id: u64) -> TambolaResult<Option<Game>>;

    async fn list_games(&self) -> TambolaResult<Vec<Game>>;

    /// Append to the game's called-number log. The caller has already
    /// checked for duplicates under the per-game lock.
    async fn append_called_number(&self, game_id: u64, number: u8) -> TambolaResult<()>;

    async fn set_game_status(&self, game_id: u64, status: GameStatus) -> TambolaResult<()>;

    async fn update_prize_pool(&self, game_id: u64, pool: PrizePool) -> TambolaResult<()>;

    // --- tickets ---

    async fn create_ticket(
        &self,
        game_id: u64,
        user_id: u64,
        grid: TicketGrid,
    ) -> TambolaResult<Ticket>;

    async fn load_ticket(&self, ticket_id: u64) -> TambolaResult<Option<Ticket>>;

    async fn list_tickets(
        &self,
        game_id: u64,
        user_id: Option<u64>,
    ) -> TambolaResult<Vec<Ticket>>;

    async fn count_tickets(&self, game_id: u64) -> TambolaResult<usize>;

    // --- claims ---

    async fn create_claim(
        &self,
        game_id: u64,
        ticket_id: u64,
        user_id: u64,
        claim_type: ClaimType,
    ) -> TambolaResult<Claim>;

    async fn load_claim(&self, claim_id: u64) -> TambolaResult<Option<Claim>>;

    /// Any claim for this (ticket, claim type) pair, regardless of status.
    async fn find_claim(
        &self,
        ticket_id: u64,
        claim_type: ClaimType,
    ) -> TambolaResult<Option<Claim>>;

    async fn update_claim_status(&self, claim_id: u64, status: ClaimStatus) -> TambolaResult<()>;

    async fn list_claims(&self, game_id: u64) -> TambolaResult<Vec<Claim>>;
}

/// In-memory store backed by concurrent maps.
///
/// Individual operations are atomic per entry; there is no cross-table
/// transactionality, matching the guarantees the trait asks for.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<u64, UserProfile>,
    games: DashMap<u64, Game>,
    tickets: DashMap<u64, Ticket>,
    claims: DashMap<u64, Claim>,
    transactions: DashMap<u64, WalletTransaction>,
    next_user_id: AtomicU64,
    next_game_id: AtomicU64,
    next_ticket_id: AtomicU64,
    next_claim_id: AtomicU64,
    next_tx_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(counter: &AtomicU64) -> u64 {
        counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn create_user(&self, name: &str, balance: f64) -> TambolaResult<UserProfile> {
        let user = UserProfile {
            id: Self::next_id(&self.next_user_id),
            name: name.to_string(),
            balance,
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn load_user(&self, user_id: u64) -> TambolaResult<Option<UserProfile>> {
        Ok(self.users.get(&user_id).map(|u| u.clone()))
    }

    async fn credit_balance(&self, user_id: u64, amount: f64) -> TambolaResult<()> {
        let mut user = self
            .users
            .get_mut(&user_id)
            .ok_or(TambolaError::UserNotFound(user_id))?;
        user.balance += amount;
        Ok(())
    }

    async fn debit_balance(&self, user_id: u64, amount: f64) -> TambolaResult<()> {
        let mut user = self
            .users
            .get_mut(&user_id)
            .ok_or(TambolaError::UserNotFound(user_id))?;
        if user.balance < amount {
            return Err(TambolaError::InsufficientBalance {
                required: amount,
                available: user.balance,
            });
        }
        user.balance -= amount;
        Ok(())
    }

    async fn record_transaction(
        &self,
        user_id: u64,
        amount: f64,
        kind: TransactionKind,
        status: TransactionStatus,
        details: Option<String>,
    ) -> TambolaResult<WalletTransaction> {
        let tx = WalletTransaction {
            id: Self::next_id(&self.next_tx_id),
            user_id,
            amount,
            kind,
            status,
            details,
            created_at: Utc::now(),
        };
        self.transactions.insert(tx.id, tx.clone());
        Ok(tx)
    }

    async fn load_transaction(&self, tx_id: u64) -> TambolaResult<Option<WalletTransaction>> {
        Ok(self.transactions.get(&tx_id).map(|t| t.clone()))
    }

    async fn update_transaction_status(
        &self,
        tx_id: u64,
        status: TransactionStatus,
    ) -> TambolaResult<()> {
        let mut tx = self
            .transactions
            .get_mut(&tx_id)
            .ok_or(TambolaError::TransactionNotFound(tx_id))?;
        tx.status = status;
        Ok(())
    }

    async fn list_transactions(&self, user_id: u64) -> TambolaResult<Vec<WalletTransaction>> {
        let mut txs: Vec<WalletTransaction> = self
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .map(|t| t.clone())
            .collect();
        txs.sort_by_key(|t| t.id);
        Ok(txs)
    }

    async fn create_game(&self, new_game: NewGame) -> TambolaResult<Game> {
        let game = Game {
            id: Self::next_id(&self.next_game_id),
            name: new_game.name,
            ticket_price: new_game.ticket_price,
            prize_pool: new_game.prize_pool,
            start_time: new_game.start_time,
            status: GameStatus::Upcoming,
            called_numbers: Vec::new(),
            min_players: new_game.min_players,
            max_players: new_game.max_players,
            created_at: Utc::now(),
        };
        self.games.insert(game.id, game.clone());
        Ok(game)
    }

    async fn load_game(&self, game_id: u64) -> TambolaResult<Option<Game>> {
        Ok(self.games.get(&game_id).map(|g| g.clone()))
    }

    async fn list_games(&self) -> TambolaResult<Vec<Game>> {
        let mut games: Vec<Game> = self.games.iter().map(|g| g.clone()).collect();
        games.sort_by_key(|g| g.id);
        Ok(games)
    }

    async fn append_called_number(&self, game_id: u64, number: u8) -> TambolaResult<()> {
        let mut game = self
            .games
            .get_mut(&game_id)
            .ok_or(TambolaError::GameNotFound(game_id))?;
        game.called_numbers.push(number);
        Ok(())
    }

    async fn set_game_status(&self, game_id: u64, status: GameStatus) -> TambolaResult<()> {
        let mut game = self
            .games
            .get_mut(&game_id)
            .ok_or(TambolaError::GameNotFound(game_id))?;
        game.status = status;
        Ok(())
    }

    async fn update_prize_pool(&self, game_id: u64, pool: PrizePool) -> TambolaResult<()> {
        let mut game = self
            .games
            .get_mut(&game_id)
            .ok_or(TambolaError::GameNotFound(game_id))?;
        game.prize_pool = pool;
        Ok(())
    }

    async fn create_ticket(
        &self,
        game_id: u64,
        user_id: u64,
        grid: TicketGrid,
    ) -> TambolaResult<Ticket> {
        let ticket = Ticket {
            id: Self::next_id(&self.next_ticket_id),
            game_id,
            user_id,
            grid,
            created_at: Utc::now(),
        };
        self.tickets.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    async fn load_ticket(&self, ticket_id: u64) -> TambolaResult<Option<Ticket>> {
        Ok(self.tickets.get(&ticket_id).map(|t| t.clone()))
    }

    async fn list_tickets(
        &self,
        game_id: u64,
        user_id: Option<u64>,
    ) -> TambolaResult<Vec<Ticket>> {
        let mut tickets: Vec<Ticket> = self
            .tickets
            .iter()
            .filter(|t| t.game_id == game_id && user_id.map_or(true, |u| t.user_id == u))
            .map(|t| t.clone())
            .collect();
        tickets.sort_by_key(|t| t.id);
        Ok(tickets)
    }

    async fn count_tickets(&self, game_id: u64) -> TambolaResult<usize> {
        Ok(self.tickets.iter().filter(|t| t.game_id == game_id).count())
    }

    async fn create_claim(
        &self,
        game_id: u64,
        ticket_id: u64,
        user_id: u64,
        claim_type: ClaimType,
    ) -> TambolaResult<Claim> {
        let claim = Claim {
            id: Self::next_id(&self.next_claim_id),
            game_id,
            ticket_id,
            user_id,
            claim_type,
            status: ClaimStatus::Pending,
            created_at: Utc::now(),
        };
        self.claims.insert(claim.id, claim.clone());
        Ok(claim)
    }

    async fn load_claim(&self, claim_id: u64) -> TambolaResult<Option<Claim>> {
        Ok(self.claims.get(&claim_id).map(|c| c.clone()))
    }

    async fn find_claim(
        &self,
        ticket_id: u64,
        claim_type: ClaimType,
    ) -> TambolaResult<Option<Claim>> {
        Ok(self
            .claims
            .iter()
            .find(|c| c.ticket_id == ticket_id && c.claim_type == claim_type)
            .map(|c| c.clone()))
    }

    async fn update_claim_status(&self, claim_id: u64, status: ClaimStatus) -> TambolaResult<()> {
        let mut claim = self
            .claims
            .get_mut(&claim_id)
            .ok_or(TambolaError::ClaimNotFound(claim_id))?;
        claim.status = status;
        Ok(())
    }

    async fn list_claims(&self, game_id: u64) -> TambolaResult<Vec<Claim>> {
        let mut claims: Vec<Claim> = self
            .claims
            .iter()
            .filter(|c| c.game_id == game_id)
            .map(|c| c.clone())
            .collect();
        claims.sort_by_key(|c| c.id);
        Ok(claims)
    }
}
