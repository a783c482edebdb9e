#[cfg(test)]
pub mod test {
    use anyhow::Result;
    use indicatif::ProgressBar;
    use std::collections::HashMap;

    use crate::analysis::{is_obvious_move, Analyzer};
    use crate::database::next_prime;
    use crate::{BitBoard, CriticalDatabase, CriticalEntry, Generator, Solver, HEIGHT, WIDTH};

    #[test]
    pub fn board_tracks_moves_and_ownership() -> Result<()> {
        let moves = "44443512";
        for length in 0..=moves.len() {
            let board = BitBoard::from_moves(&moves[..length])?;
            assert_eq!(board.board_mask().count_ones() as usize, length);
            assert_eq!(board.player_mask() & !board.board_mask(), 0);
            assert_eq!(board.num_moves(), length);
        }
        Ok(())
    }

    #[test]
    pub fn keys_identify_positions_uniquely() {
        fn walk(board: BitBoard, depth: usize, seen: &mut HashMap<u64, (u64, u64)>) {
            let masks = (board.player_mask(), board.board_mask());
            if let Some(previous) = seen.insert(board.key(), masks) {
                assert_eq!(previous, masks);
            }
            if depth == 0 {
                return;
            }
            for column in 0..WIDTH {
                if board.playable(column) {
                    let mut next = board;
                    next.play(board.move_bitmap(column));
                    walk(next, depth - 1, seen);
                }
            }
        }

        let mut seen = HashMap::new();
        walk(BitBoard::new(), 4, &mut seen);
        // at least the empty board and every one- and two-move position
        assert!(seen.len() > 1 + 7 + 49);
    }

    #[test]
    pub fn winning_move_detection() -> Result<()> {
        let board = BitBoard::from_moves("112233")?;
        assert!(board.check_winning_move(3));
        for column in [0, 1, 2, 4, 5, 6] {
            assert!(!board.check_winning_move(column));
        }
        assert!(board.can_win_next());
        Ok(())
    }

    #[test]
    pub fn forced_block_is_the_only_safe_move() -> Result<()> {
        // the mover faces a completed three on the bottom row with one open end
        let board = BitBoard::from_moves("17273")?;
        assert!(!board.can_win_next());
        assert_eq!(board.non_losing_moves(), BitBoard::bottom_mask(3));
        Ok(())
    }

    #[test]
    pub fn double_threat_leaves_no_safe_move() -> Result<()> {
        // an open-ended three threatens to complete on either side
        let board = BitBoard::from_moves("27374")?;
        assert_eq!(board.non_losing_moves(), 0);
        Ok(())
    }

    #[test]
    pub fn win_in_one_scores_distance_to_mate() -> Result<()> {
        let mut solver = Solver::new();
        assert_eq!(solver.solve(BitBoard::from_moves("112233")?), 18);
        Ok(())
    }

    #[test]
    pub fn lost_position_scores_negative_mate_distance() -> Result<()> {
        let mut solver = Solver::new();
        assert_eq!(solver.solve(BitBoard::from_moves("27374")?), -18);
        Ok(())
    }

    #[test]
    pub fn shared_table_keeps_results_stable() -> Result<()> {
        // cache entries from one position must not corrupt another,
        // and repeated solves must agree
        let mut solver = Solver::new();
        let first = solver.solve(BitBoard::from_moves("112233")?);
        let lost = solver.solve(BitBoard::from_moves("27374")?);
        let second = solver.solve(BitBoard::from_moves("112233")?);
        assert_eq!(first, 18);
        assert_eq!(lost, -18);
        assert_eq!(second, first);
        Ok(())
    }

    #[test]
    #[ignore = "searches the full game tree, takes a long time"]
    pub fn first_player_wins_the_empty_board() {
        let mut solver = Solver::new();
        assert_eq!(solver.solve(BitBoard::new()), 1);
    }

    #[test]
    pub fn analyzer_rejects_positions_outside_the_window() -> Result<()> {
        let analyzer = Analyzer::new(15, 28);
        let mut solver = Solver::new();
        // ply 6 is well below the window
        let board = BitBoard::from_moves("112233")?;
        assert_eq!(analyzer.analyze(&board, &mut solver), None);
        Ok(())
    }

    #[test]
    pub fn analyzer_rejects_immediate_wins() -> Result<()> {
        let analyzer = Analyzer::new(0, 41);
        let mut solver = Solver::new();
        let board = BitBoard::from_moves("112233")?;
        assert_eq!(analyzer.analyze(&board, &mut solver), None);
        Ok(())
    }

    #[test]
    pub fn analyzer_rejects_lost_positions() -> Result<()> {
        let analyzer = Analyzer::new(0, 41);
        let mut solver = Solver::new();
        let board = BitBoard::from_moves("27374")?;
        assert_eq!(analyzer.analyze(&board, &mut solver), None);
        Ok(())
    }

    #[test]
    pub fn obvious_moves_are_recognized() -> Result<()> {
        // completing your own four is obvious
        let winning = BitBoard::from_moves("112233")?;
        assert!(is_obvious_move(&winning, 3));
        assert!(!is_obvious_move(&winning, 5));

        // occupying the square the opponent needs is obvious
        let blocking = BitBoard::from_moves("17273")?;
        assert!(is_obvious_move(&blocking, 3));
        assert!(!is_obvious_move(&blocking, 4));
        Ok(())
    }

    #[test]
    pub fn critical_position_is_recognized() -> Result<()> {
        // ply 24, inside the default window: column 2 is the only move that
        // wins, it completes nothing and blocks nothing, and every other
        // safe move loses further down the tree
        let board = BitBoard::from_moves("111474166366316444263152")?;
        let analyzer = Analyzer::new(15, 28);
        let mut solver = Solver::new();

        assert_eq!(analyzer.analyze(&board, &mut solver), Some(2));
        assert!(!is_obvious_move(&board, 2));
        Ok(())
    }

    #[test]
    pub fn critical_entries_flow_into_the_database() -> Result<()> {
        let board = BitBoard::from_moves("111474166366316444263152")?;

        // pin the window to the root's ply so the traversal ends right below it
        let mut generator = Generator::new(board.num_moves(), board.num_moves());
        generator.run(board, &ProgressBar::hidden());

        let entries = generator.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, board.key());
        assert_eq!(entries[0].winning_column, 2);
        assert_eq!(entries[0].ply, board.num_moves() as u8);

        let database = CriticalDatabase::build(entries, 15, 28);
        let directory = tempfile::tempdir()?;
        let path = directory.path().join("critical.db");
        database.save(&path)?;

        let loaded = CriticalDatabase::load(&path)?;
        assert_eq!(loaded.get(board.key()), Some(2));
        Ok(())
    }

    #[test]
    pub fn generator_prunes_at_the_window_ceiling() -> Result<()> {
        // two plies of room below the ceiling and no wins in sight:
        // the root plus its seven children, nothing deeper
        let mut generator = Generator::new(15, 5);
        generator.run(BitBoard::from_moves("1122")?, &ProgressBar::hidden());
        assert_eq!(generator.visited(), 8);
        assert!(generator.entries().is_empty());
        Ok(())
    }

    #[test]
    pub fn generator_prunes_when_a_win_is_available() -> Result<()> {
        // the game would end at this node, so nothing below it is reachable
        let mut generator = Generator::new(15, 28);
        generator.run(BitBoard::from_moves("112233")?, &ProgressBar::hidden());
        assert_eq!(generator.visited(), 1);
        assert!(generator.entries().is_empty());
        Ok(())
    }

    #[test]
    pub fn next_prime_finds_the_smallest_prime() {
        assert_eq!(next_prime(0), 2);
        assert_eq!(next_prime(2), 2);
        assert_eq!(next_prime(4), 5);
        assert_eq!(next_prime(13), 13);
        assert_eq!(next_prime(14), 17);
        assert_eq!(next_prime(90), 97);
    }

    fn sample_entries() -> Vec<CriticalEntry> {
        // spread the keys out so every partial key is distinct and nonzero
        (0..40u64)
            .map(|i| CriticalEntry {
                key: 0x0001_0000 + i * 0x0003_9cd1,
                winning_column: (i % WIDTH as u64) as u8,
                ply: 15 + (i % 14) as u8,
            })
            .collect()
    }

    #[test]
    pub fn database_round_trip() -> Result<()> {
        let entries = sample_entries();
        let database = CriticalDatabase::build(&entries, 15, 28);
        assert!(database.table_size() >= entries.len() * 2);

        let directory = tempfile::tempdir()?;
        let path = directory.path().join("critical.db");
        database.save(&path)?;

        let loaded = CriticalDatabase::load(&path)?;
        assert_eq!(loaded.table_size(), database.table_size());
        assert_eq!(loaded.min_ply(), 15);
        assert_eq!(loaded.max_ply(), 28);
        for entry in &entries {
            assert_eq!(loaded.get(entry.key), Some(entry.winning_column));
        }
        assert_eq!(loaded.get(0x0000_dead_beef_0000), None);
        Ok(())
    }

    #[test]
    pub fn database_header_is_stable() -> Result<()> {
        let entries = sample_entries();
        let database = CriticalDatabase::build(&entries, 15, 28);

        let directory = tempfile::tempdir()?;
        let path = directory.path().join("critical.db");
        database.save(&path)?;

        let bytes = std::fs::read(&path)?;
        assert_eq!(&bytes[..8], &[WIDTH as u8, HEIGHT as u8, 15, 28, 4, 1, 0, 0]);
        let table_size = u32::from_le_bytes(bytes[8..12].try_into()?) as usize;
        assert_eq!(table_size, database.table_size());
        assert_eq!(bytes.len(), 12 + 5 * table_size);
        Ok(())
    }

    #[test]
    pub fn colliding_keys_probe_to_free_slots() {
        // both keys land on the same slot of the 5-slot table
        let first = 1u64 << 20;
        let second = first + 5 * (1 << 16);
        let entries = vec![
            CriticalEntry {
                key: first,
                winning_column: 2,
                ply: 20,
            },
            CriticalEntry {
                key: second,
                winning_column: 6,
                ply: 21,
            },
        ];

        let database = CriticalDatabase::build(&entries, 15, 28);
        assert_eq!(database.table_size(), 5);
        assert_eq!(database.get(first), Some(2));
        assert_eq!(database.get(second), Some(6));
    }
}
