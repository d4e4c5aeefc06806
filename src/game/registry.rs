//! Live game session coordination
//!
//! One registry per process owns the per-game serialization points, the
//! persistence handle, and the broadcast coordinator. Every mutation of a
//! game's called-number log, status, or claim set happens under that game's
//! lock, which is also what makes the late-join snapshot+subscribe atomic
//! with respect to concurrent number calls.

use crate::errors::{TambolaError, TambolaResult};
use crate::game::broadcast::{BroadcastCoordinator, GameEvent, RoomSubscription};
use crate::game::claims::{ClaimEvaluator, PayoutRecord};
use crate::game::ticket::{TicketGenerator, NUMBER_MAX, NUMBER_MIN};
use crate::game::types::{
    Claim, ClaimStatus, ClaimType, Game, GameStatus, NewGame, PrizePool, Ticket,
    TransactionKind, TransactionStatus,
};
use crate::storage::GameStore;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Snapshot handed to a listener joining a game room.
#[derive(Debug)]
pub struct RoomJoin {
    /// Called numbers at the moment of subscription, in call order.
    pub called_numbers: Vec<u8>,
    /// Live subscription; events published after the snapshot, no gaps,
    /// no repeats.
    pub subscription: RoomSubscription,
}

/// Aggregate view for the operator dashboard.
#[derive(Debug, Clone, serde::Serialize)]
pub struct GameStats {
    pub game_id: u64,
    pub tickets_sold: usize,
    pub total_collection: f64,
}

/// Coordinates all live games in the process.
///
/// Constructed once at startup and shared by `Arc`; never ambient global
/// state.
pub struct GameSessionRegistry {
    store: Arc<dyn GameStore>,
    broadcast: Arc<BroadcastCoordinator>,
    generator: TicketGenerator,
    locks: DashMap<u64, Arc<Mutex<()>>>,
}

impl GameSessionRegistry {
    pub fn new(
        store: Arc<dyn GameStore>,
        broadcast: Arc<BroadcastCoordinator>,
        generator: TicketGenerator,
    ) -> Self {
        Self {
            store,
            broadcast,
            generator,
            locks: DashMap::new(),
        }
    }

    pub fn broadcast(&self) -> &Arc<BroadcastCoordinator> {
        &self.broadcast
    }

    pub fn store(&self) -> &Arc<dyn GameStore> {
        &self.store
    }

    /// The serialization point for one game id.
    fn game_lock(&self, game_id: u64) -> Arc<Mutex<()>> {
        self.locks
            .entry(game_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn require_game(&self, game_id: u64) -> TambolaResult<Game> {
        self.store
            .load_game(game_id)
            .await?
            .ok_or(TambolaError::GameNotFound(game_id))
    }

    /// Create a game (operator command). Prize pool values were already
    /// parsed into tagged variants at deserialization time.
    pub async fn create_game(&self, new_game: NewGame) -> TambolaResult<Game> {
        if new_game.ticket_price <= 0.0 {
            return Err(TambolaError::InvalidGame(format!(
                "ticket price must be positive, got {}",
                new_game.ticket_price
            )));
        }
        if new_game.max_players < new_game.min_players {
            return Err(TambolaError::InvalidGame(format!(
                "max_players {} below min_players {}",
                new_game.max_players, new_game.min_players
            )));
        }

        let game = self.store.create_game(new_game).await?;
        info!(game_id = game.id, name = %game.name, "🎪 game created");
        Ok(game)
    }

    /// Announce the next number for a game.
    ///
    /// Rejects out-of-range and already-called numbers without mutating
    /// anything. On success appends to the log, promotes `upcoming → live`
    /// on the first call, and fans the event out to the room.
    pub async fn call_number(&self, game_id: u64, number: u8) -> TambolaResult<()> {
        if !(NUMBER_MIN..=NUMBER_MAX).contains(&number) {
            return Err(TambolaError::NumberOutOfRange(number));
        }

        let lock = self.game_lock(game_id);
        let _guard = lock.lock().await;

        let game = self.require_game(game_id).await?;
        if game.called_numbers.contains(&number) {
            return Err(TambolaError::DuplicateNumber { game_id, number });
        }

        self.store.append_called_number(game_id, number).await?;
        if game.status == GameStatus::Upcoming {
            self.store.set_game_status(game_id, GameStatus::Live).await?;
            info!(game_id, "🔴 game is live");
        }

        let listeners = self
            .broadcast
            .publish(game_id, GameEvent::NumberCalled { number });
        debug!(game_id, number, listeners, "number called");
        Ok(())
    }

    /// The ordered called-number log for a game.
    pub async fn game_state(&self, game_id: u64) -> TambolaResult<Vec<u8>> {
        Ok(self.require_game(game_id).await?.called_numbers)
    }

    /// Join a game room: snapshot the called numbers and subscribe, as one
    /// atomic step under the game lock. A number called after the snapshot
    /// is guaranteed to arrive on the subscription, and never twice.
    pub async fn join_room(&self, game_id: u64) -> TambolaResult<RoomJoin> {
        let lock = self.game_lock(game_id);
        let _guard = lock.lock().await;

        let game = self.require_game(game_id).await?;
        let subscription = self.broadcast.subscribe(game_id);
        debug!(
            game_id,
            listeners = self.broadcast.listener_count(game_id),
            "listener joined room"
        );
        Ok(RoomJoin {
            called_numbers: game.called_numbers,
            subscription,
        })
    }

    /// Book `count` tickets for a purchaser.
    ///
    /// Guards: game still upcoming, capacity not exceeded, balance covers
    /// the cost. Grids are generated before any money moves so a generation
    /// failure cannot leave a debit without tickets. Each ticket is an
    /// independent draw.
    pub async fn buy_tickets(
        &self,
        game_id: u64,
        user_id: u64,
        count: u32,
    ) -> TambolaResult<Vec<Ticket>> {
        if count == 0 {
            return Err(TambolaError::InvalidGame("ticket count must be positive".into()));
        }

        let lock = self.game_lock(game_id);
        let _guard = lock.lock().await;

        let game = self.require_game(game_id).await?;
        if game.status != GameStatus::Upcoming {
            return Err(TambolaError::GameAlreadyStarted { game_id });
        }

        let sold = self.store.count_tickets(game_id).await?;
        if sold + count as usize > game.max_players as usize {
            return Err(TambolaError::GameFull {
                game_id,
                sold,
                capacity: game.max_players,
            });
        }

        self.store
            .load_user(user_id)
            .await?
            .ok_or(TambolaError::UserNotFound(user_id))?;

        let grids: Vec<_> = (0..count)
            .map(|_| self.generator.generate())
            .collect::<TambolaResult<_>>()?;

        let total_cost = game.ticket_price * count as f64;
        self.store.debit_balance(user_id, total_cost).await?;
        self.store
            .record_transaction(
                user_id,
                total_cost,
                TransactionKind::BuyTicket,
                TransactionStatus::Completed,
                Some(format!("Bought {} tickets for game {}", count, game.name)),
            )
            .await?;

        let mut tickets = Vec::with_capacity(count as usize);
        for grid in grids {
            tickets.push(self.store.create_ticket(game_id, user_id, grid).await?);
        }
        info!(game_id, user_id, count, total_cost, "🎟️ tickets booked");
        Ok(tickets)
    }

    /// Submit a prize claim for a ticket.
    ///
    /// Any existing claim for the same (ticket, claim type) blocks
    /// resubmission permanently, even a rejected one. Ineligible claims are
    /// turned away before they ever reach the operator.
    pub async fn submit_claim(
        &self,
        game_id: u64,
        ticket_id: u64,
        user_id: u64,
        claim_type: ClaimType,
    ) -> TambolaResult<Claim> {
        let lock = self.game_lock(game_id);
        let _guard = lock.lock().await;

        let game = self.require_game(game_id).await?;
        let ticket = self
            .store
            .load_ticket(ticket_id)
            .await?
            .ok_or(TambolaError::TicketNotFound(ticket_id))?;
        if ticket.game_id != game_id {
            return Err(TambolaError::TicketGameMismatch { ticket_id, game_id });
        }

        if self.store.find_claim(ticket_id, claim_type).await?.is_some() {
            return Err(TambolaError::DuplicateClaim {
                ticket_id,
                claim_type,
            });
        }

        if !ClaimEvaluator::eligible(&ticket.grid, claim_type, &game.called_numbers) {
            return Err(TambolaError::ClaimNotEligible {
                ticket_id,
                claim_type,
            });
        }

        let claim = self
            .store
            .create_claim(game_id, ticket_id, user_id, claim_type)
            .await?;
        self.broadcast.publish(
            game_id,
            GameEvent::ClaimSubmitted {
                claim: claim.clone(),
            },
        );
        info!(game_id, ticket_id, %claim_type, claim_id = claim.id, "📣 claim submitted");
        Ok(claim)
    }

    /// Approve a pending claim: resolve the payout from the prize pool,
    /// credit the claimant, record the win, and announce it to the room.
    pub async fn approve_claim(&self, claim_id: u64) -> TambolaResult<PayoutRecord> {
        let claim = self
            .store
            .load_claim(claim_id)
            .await?
            .ok_or(TambolaError::ClaimNotFound(claim_id))?;

        let lock = self.game_lock(claim.game_id);
        let _guard = lock.lock().await;

        // Re-read under the lock; another operator may have raced us.
        let claim = self
            .store
            .load_claim(claim_id)
            .await?
            .ok_or(TambolaError::ClaimNotFound(claim_id))?;
        if claim.status != ClaimStatus::Pending {
            return Err(TambolaError::ClaimAlreadyProcessed {
                claim_id,
                status: claim.status.to_string(),
            });
        }

        let game = self.require_game(claim.game_id).await?;
        let tickets_sold = self.store.count_tickets(claim.game_id).await?;
        let amount = ClaimEvaluator::resolve_payout(
            &game.prize_pool,
            claim.claim_type,
            game.ticket_price,
            tickets_sold,
        );

        self.store
            .update_claim_status(claim_id, ClaimStatus::Approved)
            .await?;
        self.store.credit_balance(claim.user_id, amount).await?;
        let tx = self
            .store
            .record_transaction(
                claim.user_id,
                amount,
                TransactionKind::Win,
                TransactionStatus::Completed,
                Some(format!("Won {} in game {}", claim.claim_type, game.name)),
            )
            .await?;

        let claimant_name = self
            .store
            .load_user(claim.user_id)
            .await?
            .map(|u| u.name)
            .unwrap_or_default();
        self.broadcast.publish(
            claim.game_id,
            GameEvent::ClaimApproved {
                claim_type: claim.claim_type,
                claimant_name,
            },
        );
        info!(
            claim_id,
            game_id = claim.game_id,
            user_id = claim.user_id,
            amount,
            "🏆 claim approved"
        );

        Ok(PayoutRecord {
            claim_id,
            game_id: claim.game_id,
            user_id: claim.user_id,
            claim_type: claim.claim_type,
            amount,
            transaction_id: tx.id,
        })
    }

    /// Reject a pending claim. Terminal, no payout, no broadcast.
    pub async fn reject_claim(&self, claim_id: u64) -> TambolaResult<Claim> {
        let claim = self
            .store
            .load_claim(claim_id)
            .await?
            .ok_or(TambolaError::ClaimNotFound(claim_id))?;

        let lock = self.game_lock(claim.game_id);
        let _guard = lock.lock().await;

        let mut claim = self
            .store
            .load_claim(claim_id)
            .await?
            .ok_or(TambolaError::ClaimNotFound(claim_id))?;
        if claim.status != ClaimStatus::Pending {
            return Err(TambolaError::ClaimAlreadyProcessed {
                claim_id,
                status: claim.status.to_string(),
            });
        }

        self.store
            .update_claim_status(claim_id, ClaimStatus::Rejected)
            .await?;
        claim.status = ClaimStatus::Rejected;
        info!(claim_id, game_id = claim.game_id, "claim rejected");
        Ok(claim)
    }

    /// Replace a game's prize pool (operator command).
    pub async fn update_prize_pool(&self, game_id: u64, pool: PrizePool) -> TambolaResult<()> {
        let lock = self.game_lock(game_id);
        let _guard = lock.lock().await;

        self.require_game(game_id).await?;
        self.store.update_prize_pool(game_id, pool).await
    }

    /// Ticket sales summary for a game.
    pub async fn game_stats(&self, game_id: u64) -> TambolaResult<GameStats> {
        let game = self.require_game(game_id).await?;
        let tickets_sold = self.store.count_tickets(game_id).await?;
        Ok(GameStats {
            game_id,
            tickets_sold,
            total_collection: game.ticket_price * tickets_sold as f64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::Utc;
    use std::collections::HashSet;

    fn registry() -> Arc<GameSessionRegistry> {
        Arc::new(GameSessionRegistry::new(
            Arc::new(MemoryStore::new()),
            Arc::new(BroadcastCoordinator::default()),
            TicketGenerator::default(),
        ))
    }

    async fn sample_game(registry: &GameSessionRegistry, pool: PrizePool) -> Game {
        registry
            .create_game(NewGame {
                name: "Test Night".to_string(),
                ticket_price: 10.0,
                prize_pool: pool,
                start_time: Utc::now(),
                min_players: 2,
                max_players: 100,
            })
            .await
            .unwrap()
    }

    fn percent_pool(claim_type: ClaimType, pct: f64) -> PrizePool {
        let mut pool = PrizePool::default();
        pool.0
            .insert(claim_type, crate::game::types::PrizeValue::Percentage(pct));
        pool
    }

    #[tokio::test]
    async fn test_duplicate_number_rejected_without_mutation() {
        let registry = registry();
        let game = sample_game(&registry, PrizePool::default()).await;

        registry.call_number(game.id, 42).await.unwrap();
        let err = registry.call_number(game.id, 42).await.unwrap_err();
        assert!(matches!(err, TambolaError::DuplicateNumber { number: 42, .. }));

        assert_eq!(registry.game_state(game.id).await.unwrap(), vec![42]);
    }

    #[tokio::test]
    async fn test_number_range_enforced() {
        let registry = registry();
        let game = sample_game(&registry, PrizePool::default()).await;

        for bad in [0, 91, 200] {
            let err = registry.call_number(game.id, bad).await.unwrap_err();
            assert!(matches!(err, TambolaError::NumberOutOfRange(_)));
        }
        assert!(registry.game_state(game.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_first_call_promotes_to_live() {
        let registry = registry();
        let game = sample_game(&registry, PrizePool::default()).await;
        assert_eq!(game.status, GameStatus::Upcoming);

        registry.call_number(game.id, 7).await.unwrap();
        let game = registry.store().load_game(game.id).await.unwrap().unwrap();
        assert_eq!(game.status, GameStatus::Live);

        // A later call leaves the status alone.
        registry.call_number(game.id, 8).await.unwrap();
        let game = registry.store().load_game(game.id).await.unwrap().unwrap();
        assert_eq!(game.status, GameStatus::Live);
    }

    #[tokio::test]
    async fn test_unknown_game_rejected() {
        let registry = registry();
        assert!(matches!(
            registry.call_number(999, 5).await.unwrap_err(),
            TambolaError::GameNotFound(999)
        ));
        assert!(matches!(
            registry.join_room(999).await.unwrap_err(),
            TambolaError::GameNotFound(999)
        ));
    }

    #[tokio::test]
    async fn test_late_join_receives_snapshot_then_live_stream() {
        let registry = registry();
        let game = sample_game(&registry, PrizePool::default()).await;

        for n in [3, 14, 15] {
            registry.call_number(game.id, n).await.unwrap();
        }

        let mut join = registry.join_room(game.id).await.unwrap();
        assert_eq!(join.called_numbers, vec![3, 14, 15]);

        for n in [9, 26] {
            registry.call_number(game.id, n).await.unwrap();
        }

        assert_eq!(
            join.subscription.next_event().await,
            Some(GameEvent::NumberCalled { number: 9 })
        );
        assert_eq!(
            join.subscription.next_event().await,
            Some(GameEvent::NumberCalled { number: 26 })
        );
    }

    #[tokio::test]
    async fn test_late_join_atomic_under_concurrent_calls() {
        let registry = registry();
        let game = sample_game(&registry, PrizePool::default()).await;
        let game_id = game.id;

        // Four callers race 40 distinct numbers against a joining listener.
        let mut callers = Vec::new();
        for chunk in 0..4u8 {
            let registry = registry.clone();
            callers.push(tokio::spawn(async move {
                for i in 0..10u8 {
                    let number = chunk * 10 + i + 1;
                    registry.call_number(game_id, number).await.unwrap();
                }
            }));
        }

        let mut join = registry.join_room(game_id).await.unwrap();
        for caller in callers {
            caller.await.unwrap();
        }

        // Drain the live stream until all 40 numbers are accounted for.
        let mut received = Vec::new();
        while join.called_numbers.len() + received.len() < 40 {
            match join.subscription.next_event().await {
                Some(GameEvent::NumberCalled { number }) => received.push(number),
                other => panic!("unexpected event {:?}", other),
            }
        }

        // Snapshot + stream must be exactly the full log: no gaps, no
        // repeats, order preserved.
        let log = registry.game_state(game_id).await.unwrap();
        let mut observed = join.called_numbers.clone();
        observed.extend(&received);
        assert_eq!(observed, log);
        let distinct: HashSet<u8> = observed.iter().copied().collect();
        assert_eq!(distinct.len(), 40);
    }

    #[tokio::test]
    async fn test_buy_tickets_debits_and_creates() {
        let registry = registry();
        let game = sample_game(&registry, PrizePool::default()).await;
        let user = registry.store().create_user("Ravi", 100.0).await.unwrap();

        let tickets = registry.buy_tickets(game.id, user.id, 5).await.unwrap();
        assert_eq!(tickets.len(), 5);
        for ticket in &tickets {
            crate::game::ticket::validate_grid(&ticket.grid).unwrap();
        }

        let user = registry.store().load_user(user.id).await.unwrap().unwrap();
        assert_eq!(user.balance, 50.0);

        let txs = registry.store().list_transactions(user.id).await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].kind, TransactionKind::BuyTicket);
        assert_eq!(txs[0].amount, 50.0);
    }

    #[tokio::test]
    async fn test_buy_tickets_guards() {
        let registry = registry();
        let game = sample_game(&registry, PrizePool::default()).await;
        let user = registry.store().create_user("Mina", 15.0).await.unwrap();

        // Insufficient balance: 2 x 10 > 15.
        let err = registry.buy_tickets(game.id, user.id, 2).await.unwrap_err();
        assert!(matches!(err, TambolaError::InsufficientBalance { .. }));
        // The failed booking must not have created tickets.
        assert_eq!(registry.store().count_tickets(game.id).await.unwrap(), 0);

        // A live game sells no more tickets.
        registry.call_number(game.id, 1).await.unwrap();
        let err = registry.buy_tickets(game.id, user.id, 1).await.unwrap_err();
        assert!(matches!(err, TambolaError::GameAlreadyStarted { .. }));
    }

    #[tokio::test]
    async fn test_buy_tickets_capacity() {
        let registry = registry();
        let game = registry
            .create_game(NewGame {
                name: "Tiny".to_string(),
                ticket_price: 1.0,
                prize_pool: PrizePool::default(),
                start_time: Utc::now(),
                min_players: 1,
                max_players: 3,
            })
            .await
            .unwrap();
        let user = registry.store().create_user("Max", 100.0).await.unwrap();

        registry.buy_tickets(game.id, user.id, 2).await.unwrap();
        let err = registry.buy_tickets(game.id, user.id, 2).await.unwrap_err();
        assert!(matches!(err, TambolaError::GameFull { sold: 2, .. }));
    }

    /// Call every number on a ticket so any claim type becomes eligible.
    async fn call_ticket_numbers(registry: &GameSessionRegistry, game_id: u64, ticket: &Ticket) {
        for n in ticket.numbers() {
            registry.call_number(game_id, n).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_submit_claim_checks_eligibility() {
        let registry = registry();
        let game = sample_game(&registry, PrizePool::default()).await;
        let user = registry.store().create_user("Sara", 50.0).await.unwrap();
        let ticket = registry.buy_tickets(game.id, user.id, 1).await.unwrap().remove(0);

        // Nothing called yet: every pattern is ineligible.
        let err = registry
            .submit_claim(game.id, ticket.id, user.id, ClaimType::EarlyFive)
            .await
            .unwrap_err();
        assert!(matches!(err, TambolaError::ClaimNotEligible { .. }));

        // Call the top row; top line becomes claimable, bottom stays not.
        for n in ticket.row_numbers(0) {
            registry.call_number(game.id, n).await.unwrap();
        }
        registry
            .submit_claim(game.id, ticket.id, user.id, ClaimType::TopLine)
            .await
            .unwrap();
        let err = registry
            .submit_claim(game.id, ticket.id, user.id, ClaimType::BottomLine)
            .await
            .unwrap_err();
        assert!(matches!(err, TambolaError::ClaimNotEligible { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_claim_blocked_even_after_rejection() {
        let registry = registry();
        let game = sample_game(&registry, PrizePool::default()).await;
        let user = registry.store().create_user("Dev", 50.0).await.unwrap();
        let ticket = registry.buy_tickets(game.id, user.id, 1).await.unwrap().remove(0);
        call_ticket_numbers(&registry, game.id, &ticket).await;

        let claim = registry
            .submit_claim(game.id, ticket.id, user.id, ClaimType::FullHouse)
            .await
            .unwrap();
        assert_eq!(claim.status, ClaimStatus::Pending);

        let err = registry
            .submit_claim(game.id, ticket.id, user.id, ClaimType::FullHouse)
            .await
            .unwrap_err();
        assert!(matches!(err, TambolaError::DuplicateClaim { .. }));

        // Rejection does not reopen the slot.
        registry.reject_claim(claim.id).await.unwrap();
        let err = registry
            .submit_claim(game.id, ticket.id, user.id, ClaimType::FullHouse)
            .await
            .unwrap_err();
        assert!(matches!(err, TambolaError::DuplicateClaim { .. }));
    }

    #[tokio::test]
    async fn test_approve_claim_pays_percentage_of_revenue() {
        let registry = registry();
        let game = sample_game(&registry, percent_pool(ClaimType::FullHouse, 40.0)).await;
        let buyer = registry.store().create_user("Crowd", 200.0).await.unwrap();
        let winner = registry.store().create_user("Lata", 100.0).await.unwrap();

        // 20 tickets sold at 10 => revenue 200; 40% => payout 80.
        registry.buy_tickets(game.id, buyer.id, 19).await.unwrap();
        let ticket = registry.buy_tickets(game.id, winner.id, 1).await.unwrap().remove(0);
        call_ticket_numbers(&registry, game.id, &ticket).await;

        let claim = registry
            .submit_claim(game.id, ticket.id, winner.id, ClaimType::FullHouse)
            .await
            .unwrap();
        let payout = registry.approve_claim(claim.id).await.unwrap();
        assert_eq!(payout.amount, 80.0);

        let winner = registry.store().load_user(winner.id).await.unwrap().unwrap();
        // Started at 100, paid 10 for the ticket, won 80.
        assert_eq!(winner.balance, 170.0);

        let txs = registry.store().list_transactions(payout.user_id).await.unwrap();
        let wins: Vec<_> = txs.iter().filter(|t| t.kind == TransactionKind::Win).collect();
        assert_eq!(wins.len(), 1);
        assert_eq!(wins[0].amount, 80.0);
        assert_eq!(wins[0].id, payout.transaction_id);
    }

    #[tokio::test]
    async fn test_missing_pool_key_pays_zero() {
        let registry = registry();
        let game = sample_game(&registry, PrizePool::default()).await;
        let user = registry.store().create_user("Zed", 50.0).await.unwrap();
        let ticket = registry.buy_tickets(game.id, user.id, 1).await.unwrap().remove(0);
        call_ticket_numbers(&registry, game.id, &ticket).await;

        let claim = registry
            .submit_claim(game.id, ticket.id, user.id, ClaimType::FullHouse)
            .await
            .unwrap();
        let payout = registry.approve_claim(claim.id).await.unwrap();
        assert_eq!(payout.amount, 0.0);
    }

    #[tokio::test]
    async fn test_reprocessing_claim_fails_without_balance_change() {
        let registry = registry();
        let game = sample_game(&registry, percent_pool(ClaimType::FullHouse, 50.0)).await;
        let user = registry.store().create_user("Omi", 50.0).await.unwrap();
        let ticket = registry.buy_tickets(game.id, user.id, 1).await.unwrap().remove(0);
        call_ticket_numbers(&registry, game.id, &ticket).await;

        let claim = registry
            .submit_claim(game.id, ticket.id, user.id, ClaimType::FullHouse)
            .await
            .unwrap();
        registry.approve_claim(claim.id).await.unwrap();
        let balance_after_first = registry
            .store()
            .load_user(user.id)
            .await
            .unwrap()
            .unwrap()
            .balance;

        let err = registry.approve_claim(claim.id).await.unwrap_err();
        assert!(matches!(err, TambolaError::ClaimAlreadyProcessed { .. }));
        let err = registry.reject_claim(claim.id).await.unwrap_err();
        assert!(matches!(err, TambolaError::ClaimAlreadyProcessed { .. }));

        let balance = registry
            .store()
            .load_user(user.id)
            .await
            .unwrap()
            .unwrap()
            .balance;
        assert_eq!(balance, balance_after_first);
    }

    #[tokio::test]
    async fn test_claim_events_reach_the_room() {
        let registry = registry();
        let game = sample_game(&registry, percent_pool(ClaimType::TopLine, 20.0)).await;
        let user = registry.store().create_user("Nia", 50.0).await.unwrap();
        let ticket = registry.buy_tickets(game.id, user.id, 1).await.unwrap().remove(0);

        let mut join = registry.join_room(game.id).await.unwrap();

        for n in ticket.row_numbers(0) {
            registry.call_number(game.id, n).await.unwrap();
        }
        let claim = registry
            .submit_claim(game.id, ticket.id, user.id, ClaimType::TopLine)
            .await
            .unwrap();
        registry.approve_claim(claim.id).await.unwrap();

        // Five NumberCalled events, then the claim lifecycle events.
        for _ in 0..5 {
            assert!(matches!(
                join.subscription.next_event().await,
                Some(GameEvent::NumberCalled { .. })
            ));
        }
        assert!(matches!(
            join.subscription.next_event().await,
            Some(GameEvent::ClaimSubmitted { .. })
        ));
        match join.subscription.next_event().await {
            Some(GameEvent::ClaimApproved {
                claim_type,
                claimant_name,
            }) => {
                assert_eq!(claim_type, ClaimType::TopLine);
                assert_eq!(claimant_name, "Nia");
            }
            other => panic!("expected ClaimApproved, got {:?}", other),
        }
    }
}
