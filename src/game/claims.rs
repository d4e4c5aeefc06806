//! Claim evaluation
//!
//! Pure pattern checks against the called-number log, plus payout
//! resolution against a game's prize pool. No I/O here; the registry wires
//! these into the claim lifecycle.

use crate::game::types::{ClaimType, PrizePool, TicketGrid};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Validates claims against ticket and called-number state.
pub struct ClaimEvaluator;

impl ClaimEvaluator {
    /// Whether a ticket currently satisfies the claimed pattern.
    ///
    /// - early-five: any 5 of the ticket's numbers have been called
    /// - top/middle/bottom-line: every number in that row has been called
    /// - full-house: all 15 numbers have been called
    pub fn eligible(grid: &TicketGrid, claim_type: ClaimType, called: &[u8]) -> bool {
        let called: HashSet<u8> = called.iter().copied().collect();
        match claim_type {
            ClaimType::EarlyFive => {
                let matched = grid
                    .iter()
                    .flat_map(|row| row.iter().flatten())
                    .filter(|n| called.contains(n))
                    .count();
                matched >= 5
            }
            ClaimType::TopLine => row_complete(grid, 0, &called),
            ClaimType::MiddleLine => row_complete(grid, 1, &called),
            ClaimType::BottomLine => row_complete(grid, 2, &called),
            ClaimType::FullHouse => grid
                .iter()
                .flat_map(|row| row.iter().flatten())
                .all(|n| called.contains(n)),
        }
    }

    /// Resolve the payout amount for an approved claim.
    ///
    /// Revenue is ticket price times tickets sold; a claim type missing
    /// from the pool pays zero.
    pub fn resolve_payout(
        pool: &PrizePool,
        claim_type: ClaimType,
        ticket_price: f64,
        tickets_sold: usize,
    ) -> f64 {
        let revenue = ticket_price * tickets_sold as f64;
        pool.payout_for(claim_type, revenue)
    }
}

fn row_complete(grid: &TicketGrid, row: usize, called: &HashSet<u8>) -> bool {
    grid[row].iter().flatten().all(|n| called.contains(n))
}

/// Outcome of an approved claim: what was credited and where it was
/// recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutRecord {
    pub claim_id: u64,
    pub game_id: u64,
    pub user_id: u64,
    pub claim_type: ClaimType,
    pub amount: f64,
    pub transaction_id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ticket::validate_grid;
    use crate::game::types::PrizeValue;

    /// A fixed valid grid used across the eligibility tests.
    ///
    ///   row 0:  1 11 21 31 41  -  -  -  -
    ///   row 1:  - 12 22 32 42 52  -  -  -
    ///   row 2:  -  -  - 33 43 53 63 73  -
    fn fixture_grid() -> TicketGrid {
        let mut grid: TicketGrid = [[None; 9]; 3];
        for (col, n) in [(0, 1), (1, 11), (2, 21), (3, 31), (4, 41)] {
            grid[0][col] = Some(n);
        }
        for (col, n) in [(1, 12), (2, 22), (3, 32), (4, 42), (5, 52)] {
            grid[1][col] = Some(n);
        }
        for (col, n) in [(3, 33), (4, 43), (5, 53), (6, 63), (7, 73)] {
            grid[2][col] = Some(n);
        }
        validate_grid(&grid).expect("fixture must be a valid ticket");
        grid
    }

    #[test]
    fn test_early_five_needs_five_matches() {
        let grid = fixture_grid();
        assert!(!ClaimEvaluator::eligible(&grid, ClaimType::EarlyFive, &[1, 11, 21, 31]));
        // Matches can come from any rows.
        assert!(ClaimEvaluator::eligible(&grid, ClaimType::EarlyFive, &[1, 11, 12, 33, 73]));
        // Called numbers not on the ticket do not count.
        assert!(!ClaimEvaluator::eligible(
            &grid,
            ClaimType::EarlyFive,
            &[2, 3, 4, 5, 6, 7, 1, 11]
        ));
    }

    #[test]
    fn test_line_claims_require_full_row() {
        let grid = fixture_grid();
        assert!(ClaimEvaluator::eligible(&grid, ClaimType::TopLine, &[1, 11, 21, 31, 41]));
        assert!(!ClaimEvaluator::eligible(&grid, ClaimType::TopLine, &[1, 11, 21, 31]));
        // Top line complete does not make the middle line eligible.
        assert!(!ClaimEvaluator::eligible(
            &grid,
            ClaimType::MiddleLine,
            &[1, 11, 21, 31, 41]
        ));
        assert!(ClaimEvaluator::eligible(
            &grid,
            ClaimType::BottomLine,
            &[33, 43, 53, 63, 73]
        ));
    }

    #[test]
    fn test_full_house_requires_all_fifteen() {
        let grid = fixture_grid();
        let mut called: Vec<u8> = grid.iter().flat_map(|r| r.iter().flatten().copied()).collect();
        assert!(ClaimEvaluator::eligible(&grid, ClaimType::FullHouse, &called));
        called.pop();
        assert!(!ClaimEvaluator::eligible(&grid, ClaimType::FullHouse, &called));
    }

    #[test]
    fn test_payout_resolution() {
        let mut pool = PrizePool::default();
        pool.0.insert(ClaimType::FullHouse, PrizeValue::Percentage(40.0));
        pool.0.insert(ClaimType::EarlyFive, PrizeValue::Fixed(15.0));

        // 40% of (10 x 20) = 80
        assert_eq!(
            ClaimEvaluator::resolve_payout(&pool, ClaimType::FullHouse, 10.0, 20),
            80.0
        );
        assert_eq!(
            ClaimEvaluator::resolve_payout(&pool, ClaimType::EarlyFive, 10.0, 20),
            15.0
        );
        // Missing key resolves to zero, not an error.
        assert_eq!(
            ClaimEvaluator::resolve_payout(&pool, ClaimType::TopLine, 10.0, 20),
            0.0
        );
    }
}
