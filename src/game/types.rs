//! Domain model for Tambola tournaments
//!
//! Tickets, games, claims, prize pools, and wallet records. These are the
//! shapes shared between the in-memory session layer, the persistence
//! boundary, and the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A Tambola ticket grid: 3 rows by 9 columns, `None` cells are blanks.
///
/// Column `c` holds numbers from `10c+1` to `10c+10` (column 8 spans 81-90),
/// each row carries exactly 5 numbers, and no number repeats on a ticket.
pub type TicketGrid = [[Option<u8>; 9]; 3];

/// A purchased ticket, immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: u64,
    pub game_id: u64,
    pub user_id: u64,
    pub grid: TicketGrid,
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    /// All 15 numbers on the ticket, in row-major order.
    pub fn numbers(&self) -> Vec<u8> {
        self.grid
            .iter()
            .flat_map(|row| row.iter().flatten().copied())
            .collect()
    }

    /// The numbers in one row (0 = top, 1 = middle, 2 = bottom).
    pub fn row_numbers(&self, row: usize) -> Vec<u8> {
        self.grid[row].iter().flatten().copied().collect()
    }
}

/// Game lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Upcoming,
    Live,
    Finished,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::Upcoming => write!(f, "upcoming"),
            GameStatus::Live => write!(f, "live"),
            GameStatus::Finished => write!(f, "finished"),
        }
    }
}

/// A scheduled tournament game.
///
/// `called_numbers` is the append-only announcement log: distinct values in
/// call order, the single source of truth for what has been announced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: u64,
    pub name: String,
    pub ticket_price: f64,
    pub prize_pool: PrizePool,
    pub start_time: DateTime<Utc>,
    pub status: GameStatus,
    pub called_numbers: Vec<u8>,
    pub min_players: u32,
    pub max_players: u32,
    pub created_at: DateTime<Utc>,
}

/// Parameters for creating a game (operator command).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGame {
    pub name: String,
    pub ticket_price: f64,
    pub prize_pool: PrizePool,
    pub start_time: DateTime<Utc>,
    #[serde(default = "default_min_players")]
    pub min_players: u32,
    #[serde(default = "default_max_players")]
    pub max_players: u32,
}

fn default_min_players() -> u32 {
    2
}

fn default_max_players() -> u32 {
    100
}

/// Prize claim patterns
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    EarlyFive,
    TopLine,
    MiddleLine,
    BottomLine,
    FullHouse,
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimType::EarlyFive => write!(f, "early_five"),
            ClaimType::TopLine => write!(f, "top_line"),
            ClaimType::MiddleLine => write!(f, "middle_line"),
            ClaimType::BottomLine => write!(f, "bottom_line"),
            ClaimType::FullHouse => write!(f, "full_house"),
        }
    }
}

/// Claim lifecycle status: pending until an operator decides, then terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimStatus::Pending => write!(f, "pending"),
            ClaimStatus::Approved => write!(f, "approved"),
            ClaimStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// A player's assertion that a ticket satisfies a prize pattern.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claim {
    pub id: u64,
    pub game_id: u64,
    pub ticket_id: u64,
    pub user_id: u64,
    pub claim_type: ClaimType,
    pub status: ClaimStatus,
    pub created_at: DateTime<Utc>,
}

/// A prize pool entry: either a share of ticket revenue or a fixed amount.
///
/// Decided once at configuration time; the wire format is the original
/// string form ("40%" or "250").
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrizeValue {
    /// Percentage of total ticket revenue, e.g. `Percentage(40.0)` for "40%"
    Percentage(f64),
    /// Fixed payout amount regardless of revenue
    Fixed(f64),
}

impl PrizeValue {
    /// Resolve the payout amount against total ticket revenue for a game.
    pub fn payout(&self, revenue: f64) -> f64 {
        match self {
            PrizeValue::Percentage(pct) => revenue * pct / 100.0,
            PrizeValue::Fixed(amount) => *amount,
        }
    }
}

impl FromStr for PrizeValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(pct) = s.strip_suffix('%') {
            let value: f64 = pct
                .trim()
                .parse()
                .map_err(|_| format!("invalid percentage: '{}'", s))?;
            if !(0.0..=100.0).contains(&value) {
                return Err(format!("percentage out of range: '{}'", s));
            }
            Ok(PrizeValue::Percentage(value))
        } else {
            let value: f64 = s.parse().map_err(|_| format!("invalid amount: '{}'", s))?;
            if value < 0.0 {
                return Err(format!("negative amount: '{}'", s));
            }
            Ok(PrizeValue::Fixed(value))
        }
    }
}

impl fmt::Display for PrizeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrizeValue::Percentage(pct) => write!(f, "{}%", pct),
            PrizeValue::Fixed(amount) => write!(f, "{}", amount),
        }
    }
}

impl Serialize for PrizeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PrizeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Per-game mapping of claim type to prize value.
///
/// A claim type missing from the pool resolves to a zero payout, not an
/// error: operators may run games that only pay some patterns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrizePool(pub HashMap<ClaimType, PrizeValue>);

impl PrizePool {
    pub fn get(&self, claim_type: ClaimType) -> Option<PrizeValue> {
        self.0.get(&claim_type).copied()
    }

    /// Resolve the payout for a claim type against total ticket revenue.
    pub fn payout_for(&self, claim_type: ClaimType, revenue: f64) -> f64 {
        self.get(claim_type).map_or(0.0, |v| v.payout(revenue))
    }
}

/// Minimal player identity: display name and wallet balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: u64,
    pub name: String,
    pub balance: f64,
}

/// Wallet transaction kinds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdraw,
    BuyTicket,
    Win,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Deposit => write!(f, "deposit"),
            TransactionKind::Withdraw => write!(f, "withdraw"),
            TransactionKind::BuyTicket => write!(f, "buy_ticket"),
            TransactionKind::Win => write!(f, "win"),
        }
    }
}

/// Wallet transaction status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Approved => write!(f, "approved"),
            TransactionStatus::Rejected => write!(f, "rejected"),
            TransactionStatus::Completed => write!(f, "completed"),
        }
    }
}

/// A recorded wallet movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: u64,
    pub user_id: u64,
    pub amount: f64,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}
