//! Tambola - Live Tournament Game Server
//!
//! The core of a live Tambola (housie) platform: collision-free ticket
//! generation, a per-game number-calling state machine with room-scoped
//! event fan-out, and the prize-claim lifecycle with payouts from a
//! configurable prize pool. Persistence sits behind the [`storage::GameStore`]
//! trait; the HTTP/WebSocket surface lives under [`api`].

pub mod api;
pub mod config;
pub mod errors;
pub mod game;
pub mod storage;

pub use config::TambolaConfig;
pub use errors::{TambolaError, TambolaResult};
pub use game::{
    BroadcastCoordinator, ClaimEvaluator, GameEvent, GameSessionRegistry, TicketGenerator,
    WalletLedger,
};
pub use storage::{GameStore, MemoryStore};
