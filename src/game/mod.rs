//! Game core: ticket generation, session coordination, claims, fan-out.

pub mod broadcast;
pub mod claims;
pub mod registry;
pub mod ticket;
pub mod types;
pub mod wallet;

pub use broadcast::{BroadcastCoordinator, GameEvent, RoomSubscription};
pub use claims::{ClaimEvaluator, PayoutRecord};
pub use registry::{GameSessionRegistry, GameStats, RoomJoin};
pub use ticket::TicketGenerator;
pub use wallet::WalletLedger;
