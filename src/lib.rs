//! A generator for a database of critical Connect 4 positions
//!
//! A position is *critical* when exactly one move wins, every other move
//! loses or draws, and the winning move is neither an immediate
//! four-in-a-row nor a forced block of the opponent. This crate walks every
//! position reachable within a ply window, classifies each one with a weak
//! game tree solver and writes the results to a compact open-addressed hash
//! file for fast runtime lookup.
//!
//! # Basic Usage
//!
//! ```
//! use connect4_critical::{bitboard::BitBoard, solver::Solver};
//!
//! # use std::error::Error;
//! # fn main() -> Result<(), Box<dyn Error>> {
//! let mut solver = Solver::new();
//! let score = solver.solve(BitBoard::from_moves("112233")?);
//!
//! assert_eq!(score, 18);
//! # Ok(())
//! # }
//! ```

use static_assertions::*;
pub use anyhow;

pub mod analysis;

pub mod bitboard;

pub mod database;

pub mod generator;

pub mod solver;

pub mod transposition_table;

mod test;

pub use analysis::Analyzer;
pub use bitboard::BitBoard;
pub use database::CriticalDatabase;
pub use generator::{CriticalEntry, Generator};
pub use solver::Solver;

/// The width of the game board in tiles
pub const WIDTH: usize = 7;

/// The height of the game board in tiles
pub const HEIGHT: usize = 6;

// ensure that the given dimensions fit in a u64 for the bitboard representation
const_assert!(WIDTH * (HEIGHT + 1) < 64);
