//! Full tournament flow: create a game, fund and book players, run the
//! call sequence with a live room attached, then settle a winning claim.

use chrono::Utc;
use std::sync::Arc;
use tambola::game::broadcast::{BroadcastCoordinator, GameEvent};
use tambola::game::registry::GameSessionRegistry;
use tambola::game::ticket::TicketGenerator;
use tambola::game::types::{ClaimStatus, ClaimType, NewGame, PrizePool, PrizeValue, TransactionKind};
use tambola::game::wallet::WalletLedger;
use tambola::storage::{GameStore, MemoryStore};

fn build() -> (Arc<dyn GameStore>, Arc<GameSessionRegistry>, WalletLedger) {
    let store: Arc<dyn GameStore> = Arc::new(MemoryStore::new());
    let registry = Arc::new(GameSessionRegistry::new(
        store.clone(),
        Arc::new(BroadcastCoordinator::default()),
        TicketGenerator::default(),
    ));
    let wallet = WalletLedger::new(store.clone());
    (store, registry, wallet)
}

#[tokio::test]
async fn test_full_tournament_flow() {
    let (store, registry, wallet) = build();

    println!("=== Phase 1: setup ===");
    let mut pool = PrizePool::default();
    pool.0.insert(ClaimType::FullHouse, PrizeValue::Percentage(50.0));
    pool.0.insert(ClaimType::EarlyFive, PrizeValue::Fixed(5.0));
    let game = registry
        .create_game(NewGame {
            name: "Saturday Night".to_string(),
            ticket_price: 10.0,
            prize_pool: pool,
            start_time: Utc::now(),
            min_players: 2,
            max_players: 50,
        })
        .await
        .unwrap();

    let winner = store.create_user("Asha", 0.0).await.unwrap();
    let crowd = store.create_user("Vik", 100.0).await.unwrap();

    println!("=== Phase 2: funding ===");
    let deposit = wallet
        .request_deposit(winner.id, 50.0, Some("bank transfer".into()))
        .await
        .unwrap();
    wallet.approve_transaction(deposit.id).await.unwrap();
    let funded = store.load_user(winner.id).await.unwrap().unwrap();
    assert_eq!(funded.balance, 50.0);

    println!("=== Phase 3: booking ===");
    // 5 tickets total at 10 each: revenue 50, so full house pays 25.
    registry.buy_tickets(game.id, crowd.id, 4).await.unwrap();
    let ticket = registry
        .buy_tickets(game.id, winner.id, 1)
        .await
        .unwrap()
        .remove(0);

    let stats = registry.game_stats(game.id).await.unwrap();
    assert_eq!(stats.tickets_sold, 5);
    assert_eq!(stats.total_collection, 50.0);

    println!("=== Phase 4: live calls with a room attached ===");
    let mut room = registry.join_room(game.id).await.unwrap();
    assert!(room.called_numbers.is_empty());

    let numbers = ticket.numbers();
    assert_eq!(numbers.len(), 15);
    for n in &numbers {
        registry.call_number(game.id, *n).await.unwrap();
    }
    // A repeat call is refused and the log stays at 15.
    assert!(registry.call_number(game.id, numbers[0]).await.is_err());
    assert_eq!(registry.game_state(game.id).await.unwrap().len(), 15);

    for expected in &numbers {
        match room.subscription.next_event().await {
            Some(GameEvent::NumberCalled { number }) => assert_eq!(number, *expected),
            other => panic!("expected NumberCalled, got {:?}", other),
        }
    }

    println!("=== Phase 5: claim and settlement ===");
    let claim = registry
        .submit_claim(game.id, ticket.id, winner.id, ClaimType::FullHouse)
        .await
        .unwrap();
    assert_eq!(claim.status, ClaimStatus::Pending);

    let payout = registry.approve_claim(claim.id).await.unwrap();
    assert_eq!(payout.amount, 25.0);

    // Winner: 50 deposited, 10 spent on the ticket, 25 won.
    let settled = store.load_user(winner.id).await.unwrap().unwrap();
    assert_eq!(settled.balance, 65.0);

    let history = wallet.history(winner.id).await.unwrap();
    let win = history
        .iter()
        .find(|t| t.kind == TransactionKind::Win)
        .unwrap();
    assert_eq!(win.amount, 25.0);

    println!("=== Phase 6: room saw the claim lifecycle ===");
    assert!(matches!(
        room.subscription.next_event().await,
        Some(GameEvent::ClaimSubmitted { .. })
    ));
    match room.subscription.next_event().await {
        Some(GameEvent::ClaimApproved {
            claim_type,
            claimant_name,
        }) => {
            assert_eq!(claim_type, ClaimType::FullHouse);
            assert_eq!(claimant_name, "Asha");
        }
        other => panic!("expected ClaimApproved, got {:?}", other),
    }

    println!("=== Phase 7: late joiner catches up atomically ===");
    let late = registry.join_room(game.id).await.unwrap();
    assert_eq!(late.called_numbers.len(), 15);
    assert_eq!(late.called_numbers, registry.game_state(game.id).await.unwrap());
}

#[tokio::test]
async fn test_fixed_prize_ignores_revenue() {
    let (store, registry, _wallet) = build();

    let mut pool = PrizePool::default();
    pool.0.insert(ClaimType::EarlyFive, PrizeValue::Fixed(5.0));
    let game = registry
        .create_game(NewGame {
            name: "Quick Five".to_string(),
            ticket_price: 100.0,
            prize_pool: pool,
            start_time: Utc::now(),
            min_players: 1,
            max_players: 10,
        })
        .await
        .unwrap();

    let user = store.create_user("Ira", 500.0).await.unwrap();
    let ticket = registry
        .buy_tickets(game.id, user.id, 1)
        .await
        .unwrap()
        .remove(0);

    // Five matched numbers make early five eligible.
    for n in ticket.numbers().into_iter().take(5) {
        registry.call_number(game.id, n).await.unwrap();
    }
    let claim = registry
        .submit_claim(game.id, ticket.id, user.id, ClaimType::EarlyFive)
        .await
        .unwrap();
    let payout = registry.approve_claim(claim.id).await.unwrap();
    assert_eq!(payout.amount, 5.0);
}
