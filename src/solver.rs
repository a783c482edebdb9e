//! A weak solver deciding the game-theoretic outcome of Connect 4 positions

use crate::{bitboard::BitBoard, transposition_table::TranspositionTable, HEIGHT, WIDTH};

/// The minimum possible score of a position
pub const MIN_SCORE: i32 = -((WIDTH * HEIGHT) as i32) / 2 + 3;
/// The maximum possible score of a postion
pub const MAX_SCORE: i32 = ((WIDTH * HEIGHT) as i32 + 1) / 2 - 3;

struct MoveSorter {
    size: usize,
    // move bitmap and score
    moves: [(u64, i32); WIDTH],
}

impl MoveSorter {
    pub fn new() -> Self {
        Self {
            size: 0,
            moves: [(0, 0); WIDTH],
        }
    }
    pub fn push(&mut self, new_move: u64, score: i32) {
        let mut pos = self.size;
        self.size += 1;
        while pos != 0 && self.moves[pos - 1].1 > score {
            self.moves[pos] = self.moves[pos - 1];
            pos -= 1;
        }
        self.moves[pos] = (new_move, score);
    }
}
impl Iterator for MoveSorter {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        match self.size {
            0 => None,
            _ => {
                self.size -= 1;
                Some(self.moves[self.size].0)
            }
        }
    }
}

/// Returns a slice ordering the columns from the middle outwards, as
/// the middle columns are often better moves
pub const fn move_order() -> [usize; WIDTH] {
    let mut move_order = [0; WIDTH];
    let mut i = 0;
    while i < WIDTH {
        move_order[i] = (WIDTH / 2) + (i % 2) * (i / 2 + 1) - (1 - i % 2) * (i / 2);
        i += 1;
    }
    move_order
}

/// An agent deciding the outcome of Connect 4 positions
///
/// # Notes
/// This agent uses a classical game tree search with various optimisations to
/// find the mathematically exact value of any position. Only the sign of the
/// value is needed to tell winning moves from drawing and losing ones, which
/// is what the null-window refinement in [`Solver::solve`] converges on
///
/// # Position Scoring
/// A position is scored by how far a forced win is from the start of the
/// game for either player. If the first player wins with their final placed
/// tile (their 21st tile on a 7x6 board) the score is 1, or -1 if the second
/// player wins with their final tile. Earlier wins have scores further from
/// 0, up to 18/-18, where a player wins with their 4th tile. A drawn
/// position has a score of 0
///
/// The transposition table lives as long as the solver and is intentionally
/// never cleared between calls: keys identify positions exactly, so results
/// cached while solving one position stay valid for every later one
///
/// [`Solver::solve`]: #method.solve
pub struct Solver {
    /// The number of nodes searched by this `Solver` so far (for diagnostics only)
    pub node_count: usize,
    transposition_table: TranspositionTable,
}

impl Solver {
    /// Creates a new `Solver` with an empty transposition table
    pub fn new() -> Self {
        Self {
            node_count: 0,
            transposition_table: TranspositionTable::new(),
        }
    }

    /// Performs game tree search
    ///
    /// Returns the score of the position (see [Position Scoring])
    ///
    /// [Position Scoring]: #position-scoring
    fn negamax(&mut self, board: BitBoard, mut alpha: i32, mut beta: i32) -> i32 {
        self.node_count += 1;

        // check for next-move win for current player
        if board.can_win_next() {
            return ((WIDTH * HEIGHT + 1 - board.num_moves()) / 2) as i32;
        }

        // look for moves that don't give the opponent a next turn win
        let non_losing_moves = board.non_losing_moves();
        if non_losing_moves == 0 {
            return -((WIDTH * HEIGHT - board.num_moves()) as i32) / 2;
        }

        // with two or fewer tiles to place, neither side can complete four
        if board.num_moves() >= WIDTH * HEIGHT - 2 {
            return 0;
        }

        // the earliest possible loss survives the opponent's current threats
        let min = -(((WIDTH * HEIGHT - 2 - board.num_moves()) / 2) as i32);
        if alpha < min {
            alpha = min;
            // if the lower bound is above beta, we can prune the exploration
            if alpha >= beta {
                return alpha;
            }
        }

        // upper bound of score, as we cannot win immediately
        let max = ((WIDTH * HEIGHT - 1 - board.num_moves()) / 2) as i32;
        if beta > max {
            beta = max;
            // if the upper bound is below alpha, we can prune the exploration
            if alpha >= beta {
                return beta;
            }
        }

        // try to fetch a bound on the score from the transposition table
        let key = board.key();
        let value = self.transposition_table.get(key) as i32;
        if value != 0 {
            // check if lower bound
            if value > MAX_SCORE - MIN_SCORE + 1 {
                let min = value + 2 * MIN_SCORE - MAX_SCORE - 2;
                if alpha < min {
                    alpha = min;
                    if alpha >= beta {
                        // prune the exploration
                        return alpha;
                    }
                }
            // else upper bound
            } else {
                let max = value + MIN_SCORE - 1;
                if beta > max {
                    beta = max;
                    if alpha >= beta {
                        // prune the exploration
                        return beta;
                    }
                }
            }
        }

        let mut moves = MoveSorter::new();
        // reversing move order to put edges first reduces the amount of sorting
        // as these moves are worse on average
        for i in (0..WIDTH).rev() {
            let column = move_order()[i];
            let candidate = non_losing_moves & BitBoard::column_mask(column);
            if candidate != 0 {
                moves.push(candidate, board.move_score(candidate));
            }
        }

        // search the next level of the tree
        for move_bitmap in moves {
            let mut next = board;
            next.play(move_bitmap);
            // the search window is flipped for the other player
            let score = -self.negamax(next, -beta, -alpha);
            // if a child node's score reaches beta, a perfect opponent
            // will not pick this branch
            if score >= beta {
                // save a lower bound of the score
                self.transposition_table
                    .set(key, (score + MAX_SCORE - 2 * MIN_SCORE + 2) as u8);
                return score;
            }
            if score > alpha {
                alpha = score;
            }
        }

        // save an upper bound of the score, offset by one so that an empty
        // entry is never stored
        self.transposition_table
            .set(key, (alpha - MIN_SCORE + 1) as u8);
        alpha
    }

    /// Calculates the score of a position with iterative refinement
    ///
    /// # Notes
    /// The true score is bracketed between the fastest possible win and loss,
    /// then a sequence of null-window [`negamax`] probes halves the bracket
    /// until it closes. Each probe only decides whether the true score lies
    /// above or below the probe value, which is dramatically cheaper than a
    /// full-window search
    ///
    /// [`negamax`]: #method.negamax
    pub fn solve(&mut self, board: BitBoard) -> i32 {
        let mut min = -(((WIDTH * HEIGHT) as i32) - board.num_moves() as i32) / 2;
        let mut max = (WIDTH * HEIGHT + 1 - board.num_moves()) as i32 / 2;

        // iteratively narrow the bracket around the true score
        while min < max {
            let mut mid = min + (max - min) / 2;
            // tweak the search value for both negative and positive searches
            if mid <= 0 && min / 2 < mid {
                mid = min / 2
            } else if mid >= 0 && max / 2 > mid {
                mid = max / 2
            }

            // use a null-window to determine if the actual score is greater or less than mid
            let r = self.negamax(board, mid, mid + 1);

            // r is not necessarily the exact true score, but its value indicates
            // whether the true score is above or below the search target
            if r <= mid {
                // actual score <= mid
                max = r
            } else {
                // actual score > mid
                min = r;
            }
        }
        // min and max are equal here
        min
    }
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}
