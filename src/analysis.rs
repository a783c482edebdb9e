//! Classification of positions whose single winning move is easy to miss

use crate::{bitboard::BitBoard, solver::Solver, WIDTH};

/// The default first ply considered for the database
pub const DEFAULT_MIN_PLY: usize = 15;
/// The default last ply considered for the database
pub const DEFAULT_MAX_PLY: usize = 28;

/// Decides whether a position is critical
///
/// A position is critical when exactly one move wins, every other move loses
/// or draws, and the winning move is not one an immediate-tactics check would
/// already find (see [`is_obvious_move`])
pub struct Analyzer {
    min_ply: usize,
    max_ply: usize,
}

impl Analyzer {
    /// Creates an `Analyzer` restricted to positions within the given ply window
    pub fn new(min_ply: usize, max_ply: usize) -> Self {
        Self { min_ply, max_ply }
    }

    /// Accesses the first ply of the analysis window
    pub fn min_ply(&self) -> usize {
        self.min_ply
    }

    /// Accesses the last ply of the analysis window
    pub fn max_ply(&self) -> usize {
        self.max_ply
    }

    /// Returns the unique non-obvious winning column of a critical position,
    /// or `None` for every other kind of position
    ///
    /// # Notes
    /// Every playable move that survives [`non_losing_moves`] is solved from
    /// the opponent's side of the board; moves that hand the opponent an
    /// immediate win are already known losses and are skipped. The search
    /// cost is dominated by these per-move solver calls
    ///
    /// [`non_losing_moves`]: ../bitboard/struct.BitBoard.html#method.non_losing_moves
    pub fn analyze(&self, board: &BitBoard, solver: &mut Solver) -> Option<usize> {
        if board.num_moves() < self.min_ply || board.num_moves() > self.max_ply {
            return None;
        }
        // a position with an immediate win is trivial, not critical
        if board.can_win_next() {
            return None;
        }
        let non_losing_moves = board.non_losing_moves();
        if non_losing_moves == 0 {
            return None;
        }

        let mut winning_column = None;
        let mut win_count = 0;
        for column in 0..WIDTH {
            if !board.playable(column) || non_losing_moves & BitBoard::column_mask(column) == 0 {
                continue;
            }
            let mut next = *board;
            next.play(board.move_bitmap(column));
            // the child is scored from the opponent's perspective
            let score = -solver.solve(next);
            if score > 0 {
                winning_column = Some(column);
                win_count += 1;
            }
        }

        match winning_column {
            Some(column) if win_count == 1 && !is_obvious_move(board, column) => Some(column),
            _ => None,
        }
    }
}

/// Returns whether a move is one an immediate-tactics check would find:
/// either it completes four-in-a-row for the mover, or it occupies the
/// square that would complete four-in-a-row for the opponent
pub fn is_obvious_move(board: &BitBoard, column: usize) -> bool {
    // win-in-one
    if board.check_winning_move(column) {
        return true;
    }
    // forced block: the same drop viewed from the opponent's side
    let flipped = BitBoard::from_parts(
        board.player_mask() ^ board.board_mask(),
        board.board_mask(),
        board.num_moves(),
    );
    flipped.check_winning_move(column)
}
