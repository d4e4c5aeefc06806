//! Ticket generation
//!
//! Produces statistically valid Tambola tickets: 3 rows of 5 numbers each,
//! column-ranged, no repeats anywhere on the ticket. Pure computation with
//! no external state; callers attach the grid to a game and purchaser.

use crate::errors::{TambolaError, TambolaResult};
use crate::game::types::TicketGrid;
use rand::Rng;

pub const ROWS: usize = 3;
pub const COLS: usize = 9;
pub const NUMBERS_PER_ROW: usize = 5;
pub const NUMBERS_PER_TICKET: usize = 15;
pub const NUMBER_MIN: u8 = 1;
pub const NUMBER_MAX: u8 = 90;

/// Inclusive numeric range for one ticket column.
///
/// Column 0 is 1-10, column 1 is 11-20, ... column 8 is 81-90.
pub fn column_range(col: usize) -> (u8, u8) {
    let min = (col as u8) * 10 + 1;
    let max = if col == COLS - 1 { 90 } else { min + 9 };
    (min, max)
}

/// Generates one valid ticket grid per call.
///
/// Each call is an independent draw; tickets within a multi-ticket purchase
/// are not guaranteed mutually distinct.
#[derive(Debug, Clone)]
pub struct TicketGenerator {
    /// Retry cap per cell. Column ranges hold at least 9 values against at
    /// most 3 placements, so exhaustion cannot happen in practice; the cap
    /// turns an impossible livelock into a reportable error.
    max_attempts_per_cell: u32,
}

impl Default for TicketGenerator {
    fn default() -> Self {
        Self {
            max_attempts_per_cell: 1_000,
        }
    }
}

impl TicketGenerator {
    pub fn new(max_attempts_per_cell: u32) -> Self {
        Self {
            max_attempts_per_cell,
        }
    }

    /// Generate a structurally valid ticket grid.
    pub fn generate(&self) -> TambolaResult<TicketGrid> {
        let mut rng = rand::thread_rng();
        let mut grid: TicketGrid = [[None; COLS]; ROWS];
        let mut used = [false; NUMBER_MAX as usize + 1];

        for row in 0..ROWS {
            // Pick 5 distinct columns by rejection sampling.
            let mut cols: Vec<usize> = Vec::with_capacity(NUMBERS_PER_ROW);
            while cols.len() < NUMBERS_PER_ROW {
                let col = rng.gen_range(0..COLS);
                if !cols.contains(&col) {
                    cols.push(col);
                }
            }

            for col in cols {
                let (min, max) = column_range(col);
                let mut attempts = 0u32;
                let number = loop {
                    if attempts >= self.max_attempts_per_cell {
                        return Err(TambolaError::TicketGeneration {
                            attempts: self.max_attempts_per_cell,
                        });
                    }
                    attempts += 1;
                    let candidate = rng.gen_range(min..=max);
                    if !used[candidate as usize] {
                        break candidate;
                    }
                };
                used[number as usize] = true;
                grid[row][col] = Some(number);
            }
        }

        Ok(grid)
    }
}

/// Check the structural invariants of a ticket grid.
///
/// Returns the first violated invariant as a message. Used by tests and as
/// a guard before persisting externally supplied grids.
pub fn validate_grid(grid: &TicketGrid) -> Result<(), String> {
    let mut seen = [false; NUMBER_MAX as usize + 1];
    let mut total = 0usize;

    for (r, row) in grid.iter().enumerate() {
        let filled = row.iter().flatten().count();
        if filled != NUMBERS_PER_ROW {
            return Err(format!("row {} has {} numbers, expected 5", r, filled));
        }
        for (c, cell) in row.iter().enumerate() {
            if let Some(n) = cell {
                let (min, max) = column_range(c);
                if *n < min || *n > max {
                    return Err(format!("{} out of range {}-{} for column {}", n, min, max, c));
                }
                if seen[*n as usize] {
                    return Err(format!("{} appears more than once", n));
                }
                seen[*n as usize] = true;
                total += 1;
            }
        }
    }

    if total != NUMBERS_PER_TICKET {
        return Err(format!("ticket has {} numbers, expected 15", total));
    }
    Ok(())
}
