//! Klotski Solver Library
//!
//! Finds move sequences that slide a designated goal piece to its exit on a
//! rectangular board of rectangular pieces. Five interchangeable strategies
//! share one board model, one state key, and one outcome type.

pub mod board;
pub mod config;
pub mod error;
pub mod executor;
pub mod geometry;
pub mod grid;
pub mod heuristic;
pub mod layout;
pub mod node;
pub mod pieces;
pub mod progress;
pub mod solver;

pub use board::{Configuration, Move, SearchContext};
pub use config::{SolverConfig, Strategy};
pub use error::{LayoutError, ReplayError, SolveError, SolveResult};
pub use executor::LiveBoard;
pub use heuristic::Heuristic;
pub use layout::Layout;
pub use progress::{NoopObserver, Progress, ProgressObserver, TracingObserver};
pub use solver::{CancelToken, SearchOutcome, SearchStats, Solver, Status};

/// Solves `layout` with the configured strategy, logging progress through
/// `tracing`.
pub fn solve(layout: &Layout, config: &SolverConfig) -> SolveResult<SearchOutcome> {
    solve_with_observer(layout, config, &TracingObserver)
}

/// Solves `layout`, reporting progress to `observer`.
pub fn solve_with_observer(
    layout: &Layout,
    config: &SolverConfig,
    observer: &dyn ProgressObserver,
) -> SolveResult<SearchOutcome> {
    config.validate()?;
    let ctx = SearchContext::new(layout, config.key_scheme);
    config.solver().solve(&ctx, observer)
}

/// Parses a text layout and solves it.
pub fn solve_text(
    text: &str,
    target: geometry::Cell,
    config: &SolverConfig,
) -> SolveResult<SearchOutcome> {
    let layout = Layout::parse(text, target)?;
    solve(&layout, config)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use proptest::strategy::Strategy as _;

    use super::*;
    use crate::config::Strategy;
    use crate::geometry::Cell;
    use crate::grid::KeyScheme;
    use crate::pieces::{PieceKind, CLASSIC, LEVELS, PILLAR, SEALED, SOLVED, WARMUP};

    #[test]
    fn test_every_strategy_on_sealed_level() {
        let layout = SEALED.layout().unwrap();
        for strategy in Strategy::ALL {
            let config = SolverConfig::new(strategy).with_workers(2);
            let outcome = solve_with_observer(&layout, &config, &NoopObserver).unwrap();
            assert!(!outcome.is_solved(), "{}", strategy.name());
            assert!(outcome.moves.is_empty());
        }
    }

    #[test]
    fn test_every_strategy_on_solved_level() {
        let layout = SOLVED.layout().unwrap();
        for strategy in Strategy::ALL {
            let config = SolverConfig::new(strategy).with_workers(2);
            let outcome = solve_with_observer(&layout, &config, &NoopObserver).unwrap();
            assert_eq!(outcome.status, Status::Solved, "{}", strategy.name());
            assert!(outcome.moves.is_empty());
        }
    }

    #[test]
    fn test_strategies_against_bfs() {
        for level in [WARMUP, PILLAR] {
            let layout = level.layout().unwrap();
            let shortest = solve_with_observer(
                &layout,
                &SolverConfig::new(Strategy::Bfs),
                &NoopObserver,
            )
            .unwrap()
            .moves
            .len();

            for strategy in Strategy::ALL {
                let config = SolverConfig::new(strategy).with_workers(2);
                let outcome = solve_with_observer(&layout, &config, &NoopObserver).unwrap();
                if !outcome.is_solved() {
                    continue;
                }
                LiveBoard::replay(&layout, &outcome.moves).unwrap();
                if strategy.is_exhaustive() {
                    assert_eq!(outcome.moves.len(), shortest, "{}", strategy.name());
                } else {
                    assert!(outcome.moves.len() >= shortest, "{}", strategy.name());
                }
            }
        }
    }

    #[test]
    fn test_labeled_keys_find_the_same_length() {
        for level in [WARMUP, PILLAR] {
            let layout = level.layout().unwrap();
            let lengths: Vec<usize> = [KeyScheme::Interchangeable, KeyScheme::Labeled]
                .into_iter()
                .map(|scheme| {
                    let config = SolverConfig::new(Strategy::Bfs).with_key_scheme(scheme);
                    solve_with_observer(&layout, &config, &NoopObserver)
                        .unwrap()
                        .moves
                        .len()
                })
                .collect();
            assert_eq!(lengths[0], lengths[1], "{}", level.name);
        }
    }

    #[test]
    fn test_invalid_config_is_rejected_before_search() {
        let layout = WARMUP.layout().unwrap();
        let config = SolverConfig::new(Strategy::Beam).with_beam_width(0);
        assert!(matches!(
            solve(&layout, &config),
            Err(SolveError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_invalid_text_layout_is_rejected() {
        let result = solve_text("GA\nAG", Cell::new(0, 0), &SolverConfig::default());
        assert!(matches!(result, Err(SolveError::InvalidLayout(_))));
    }

    /// Random legal walk from a built-in level.
    fn walk(
        level: usize,
        scheme: KeyScheme,
        choices: &[usize],
    ) -> (SearchContext, Vec<Configuration>) {
        let layout = LEVELS[level].layout().unwrap();
        let ctx = SearchContext::new(&layout, scheme);
        let mut trail = vec![ctx.initial()];
        for &choice in choices {
            let current = trail.last().unwrap().clone();
            let moves: Vec<Move> = ctx.legal_moves(&current).collect();
            if moves.is_empty() {
                break;
            }
            trail.push(ctx.apply_move(&current, moves[choice % moves.len()]));
        }
        (ctx, trail)
    }

    /// Piece classes paired with their anchors, sorted: equal exactly when
    /// two configurations differ at most by swapping identical pieces.
    fn class_placement(
        ctx: &SearchContext,
        config: &Configuration,
    ) -> Vec<((PieceKind, u8, u8), Cell)> {
        let mut placement: Vec<_> = ctx
            .pieces()
            .iter()
            .zip(config.origins())
            .map(|(piece, &origin)| (piece.class(), origin))
            .collect();
        placement.sort();
        placement
    }

    /// Small board with a 1x1 goal and up to six 1x1 soldiers, every piece
    /// on a distinct cell.
    fn small_layout() -> impl proptest::strategy::Strategy<Value = Layout> {
        (3u8..=4, 3u8..=4)
            .prop_flat_map(|(rows, cols)| {
                let cells = rows as usize * cols as usize;
                (
                    Just((rows, cols)),
                    prop::sample::subsequence((0..cells).collect::<Vec<_>>(), 1..=7),
                    0..cells,
                    any::<prop::sample::Index>(),
                )
            })
            .prop_map(|((rows, cols), mut occupied, target, goal)| {
                let mut grid = vec!['.'; rows as usize * cols as usize];
                let goal_cell = occupied.remove(goal.index(occupied.len()));
                grid[goal_cell] = 'G';
                for (cell, label) in occupied.into_iter().zip("ABCDEF".chars()) {
                    grid[cell] = label;
                }
                let text: String = grid
                    .chunks(cols as usize)
                    .map(|row| row.iter().collect::<String>() + "\n")
                    .collect();
                let cols = cols as usize;
                let target = Cell::new((target / cols) as u8, (target % cols) as u8);
                Layout::parse(&text, target).unwrap()
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn prop_every_strategy_replays_on_small_boards(layout in small_layout()) {
            let shortest = solve_with_observer(
                &layout,
                &SolverConfig::new(Strategy::Bfs),
                &NoopObserver,
            )
            .unwrap();
            for strategy in Strategy::ALL {
                let config = SolverConfig::new(strategy).with_workers(2);
                let outcome = solve_with_observer(&layout, &config, &NoopObserver).unwrap();
                if !outcome.is_solved() {
                    continue;
                }
                prop_assert!(shortest.is_solved(), "{} solved where bfs did not", strategy.name());
                if let Err(err) = LiveBoard::replay(&layout, &outcome.moves) {
                    prop_assert!(false, "{}: {}", strategy.name(), err);
                }
                prop_assert!(outcome.moves.len() >= shortest.moves.len(), "{}", strategy.name());
            }
        }
    }

    proptest! {
        #[test]
        fn prop_interchangeable_key_matches_class_placement(
            level in 0..LEVELS.len(),
            left in prop::collection::vec(any::<usize>(), 0..30),
            right in prop::collection::vec(any::<usize>(), 0..30),
        ) {
            let (ctx, a) = walk(level, KeyScheme::Interchangeable, &left);
            let (_, b) = walk(level, KeyScheme::Interchangeable, &right);
            let (a, b) = (a.last().unwrap(), b.last().unwrap());
            prop_assert_eq!(
                ctx.key(a) == ctx.key(b),
                class_placement(&ctx, a) == class_placement(&ctx, b)
            );
        }

        #[test]
        fn prop_inverse_restores_occupancy(
            level in 0..LEVELS.len(),
            choices in prop::collection::vec(any::<usize>(), 0..40),
        ) {
            let (ctx, trail) = walk(level, KeyScheme::Labeled, &choices);
            let last = trail.last().unwrap();
            for mv in ctx.legal_moves(last).collect::<Vec<_>>() {
                let next = ctx.apply_move(last, mv);
                prop_assert!(ctx.is_legal_move(&next, mv.inverse()));
                prop_assert_eq!(&ctx.apply_move(&next, mv.inverse()), last);
            }
        }

        #[test]
        fn prop_key_changes_on_every_move(
            level in 0..LEVELS.len(),
            choices in prop::collection::vec(any::<usize>(), 0..40),
        ) {
            let (ctx, trail) = walk(level, KeyScheme::Labeled, &choices);
            for pair in trail.windows(2) {
                prop_assert_ne!(ctx.key(&pair[0]), ctx.key(&pair[1]));
            }
        }

        #[test]
        fn prop_key_equality_matches_occupancy(
            level in 0..LEVELS.len(),
            left in prop::collection::vec(any::<usize>(), 0..30),
            right in prop::collection::vec(any::<usize>(), 0..30),
        ) {
            let (ctx, a) = walk(level, KeyScheme::Labeled, &left);
            let (_, b) = walk(level, KeyScheme::Labeled, &right);
            let (a, b) = (a.last().unwrap(), b.last().unwrap());
            prop_assert_eq!(ctx.key(a) == ctx.key(b), a == b);
        }

        #[test]
        fn prop_walks_replay_on_live_board(
            choices in prop::collection::vec(any::<usize>(), 0..60),
        ) {
            let layout = CLASSIC.layout().unwrap();
            let ctx = SearchContext::new(&layout, KeyScheme::Labeled);
            let mut config = ctx.initial();
            let mut board = LiveBoard::new(&layout);
            for choice in choices {
                let moves: Vec<Move> = ctx.legal_moves(&config).collect();
                let mv = moves[choice % moves.len()];
                prop_assert!(board.apply(mv).is_ok());
                config = ctx.apply_move(&config, mv);
            }
            let origins: Vec<Cell> = board.pieces().iter().map(|p| p.origin).collect();
            prop_assert_eq!(origins.as_slice(), config.origins());
        }
    }
}
