//! Exhaustive traversal of the reachable game tree collecting critical positions

use indicatif::ProgressBar;
use log::info;

use crate::{analysis::Analyzer, bitboard::BitBoard, solver::Solver, WIDTH};

/// A single record destined for the critical-positions database
#[derive(Copy, Clone, Debug)]
pub struct CriticalEntry {
    /// The position key (see [`BitBoard::key`])
    ///
    /// [`BitBoard::key`]: ../bitboard/struct.BitBoard.html#method.key
    pub key: u64,
    /// The unique non-obvious winning column
    pub winning_column: u8,
    /// The ply the position occurs at, kept for summary statistics
    pub ply: u8,
}

/// Walks every position reachable within the analysis window, recording the
/// critical ones
///
/// # Notes
/// The traversal is a plain depth-first search over board copies. Branches
/// are cut once the window ceiling is reached or the game is decided by an
/// immediate win, as nothing below either kind of node can reach the window
/// in an actual game. Visiting order is fixed by the column loop, so the
/// collected entries arrive in a deterministic order
pub struct Generator {
    analyzer: Analyzer,
    solver: Solver,
    entries: Vec<CriticalEntry>,
    visited: u64,
}

impl Generator {
    /// Creates a `Generator` for the given ply window
    pub fn new(min_ply: usize, max_ply: usize) -> Self {
        Self {
            analyzer: Analyzer::new(min_ply, max_ply),
            solver: Solver::new(),
            entries: Vec::with_capacity(1_000_000),
            visited: 0,
        }
    }

    /// Traverses the game tree below `board`, ticking `progress` once per
    /// visited position
    pub fn run(&mut self, board: BitBoard, progress: &ProgressBar) {
        self.visit(board, progress);
    }

    fn visit(&mut self, board: BitBoard, progress: &ProgressBar) {
        self.visited += 1;
        progress.inc(1);

        if let Some(column) = self.analyzer.analyze(&board, &mut self.solver) {
            self.entries.push(CriticalEntry {
                key: board.key(),
                winning_column: column as u8,
                ply: board.num_moves() as u8,
            });
            if self.entries.len() % 100_000 == 0 {
                info!("found {} critical positions...", self.entries.len());
            }
            progress.set_message(format!("{} critical", self.entries.len()));
        }

        // nothing below the window ceiling can matter
        if board.num_moves() >= self.analyzer.max_ply() {
            return;
        }
        // the game would end here before any deeper position is reached
        if board.can_win_next() {
            return;
        }

        for column in 0..WIDTH {
            if board.playable(column) {
                let mut next = board;
                next.play(board.move_bitmap(column));
                self.visit(next, progress);
            }
        }
    }

    /// Accesses the collected critical entries in discovery order
    pub fn entries(&self) -> &[CriticalEntry] {
        &self.entries
    }

    /// Returns the number of positions visited by the traversal
    pub fn visited(&self) -> u64 {
        self.visited
    }

    /// Returns the number of nodes searched by the underlying solver
    pub fn nodes_searched(&self) -> usize {
        self.solver.node_count
    }
}
