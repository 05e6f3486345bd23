//! Breadth-first search. Unit edge costs make the first goal dequeued a
//! shortest solution.

use std::collections::VecDeque;
use std::time::Instant;

use rustc_hash::FxHashMap;
use tracing::debug;

use super::{conclude, record_if_better, Limits, SearchOutcome, SearchStats, Solver, Status};
use crate::board::SearchContext;
use crate::error::SolveResult;
use crate::node::SearchTree;
use crate::progress::{ProgressMeter, ProgressObserver};

/// Exhaustive breadth-first search.
#[derive(Clone, Debug, Default)]
pub struct BreadthFirst {
    pub limits: Limits,
}

impl Solver for BreadthFirst {
    fn name(&self) -> &'static str {
        "bfs"
    }

    fn solve(
        &self,
        ctx: &SearchContext,
        observer: &dyn ProgressObserver,
    ) -> SolveResult<SearchOutcome> {
        let started = Instant::now();
        let budget = self.limits.start(started);
        let mut meter = ProgressMeter::new(self.name(), self.limits.progress_interval, started);
        let mut stats = SearchStats::default();

        let start = ctx.initial();
        let mut depths = FxHashMap::default();
        depths.insert(ctx.key(&start), 0);
        let mut tree = SearchTree::new();
        let root = tree.push_root(start, 0);
        let mut frontier = VecDeque::from([root]);
        debug!(strategy = self.name(), pieces = ctx.pieces().len(), "search started");

        let status = loop {
            let Some(id) = frontier.pop_front() else {
                break Status::Exhausted;
            };
            if let Some(status) = budget.exceeded() {
                break status;
            }

            let node = tree.get(id);
            if ctx.is_goal(&node.config) {
                let moves = tree.reconstruct(id);
                return Ok(conclude(self.name(), Status::Solved, moves, stats, started));
            }

            let depth = node.g + 1;
            let children: Vec<_> = ctx.successors(&node.config).collect();
            stats.nodes_expanded += 1;
            for (mv, next) in children {
                stats.nodes_generated += 1;
                if record_if_better(&mut depths, ctx.key(&next), depth) {
                    frontier.push_back(tree.push_child(id, mv, next, 0));
                }
            }

            stats.observe(frontier.len(), depth);
            meter.tick(observer, stats.nodes_expanded, frontier.len(), depth);
        };

        Ok(conclude(self.name(), status, Vec::new(), stats, started))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::{CLASSIC, PILLAR, SEALED, SOLVED, WARMUP};
    use crate::progress::{CollectingObserver, NoopObserver};
    use crate::solver::fixtures::{assert_valid_solution, context};

    #[test]
    fn test_classic_shortest_solution() {
        let (layout, ctx) = context(&CLASSIC);
        let outcome = BreadthFirst::default().solve(&ctx, &NoopObserver).unwrap();
        assert_eq!(outcome.status, Status::Solved);
        assert_eq!(outcome.moves.len(), 116);
        assert_valid_solution(&layout, &outcome.moves);
    }

    #[test]
    fn test_warmup_solves_in_four() {
        let (layout, ctx) = context(&WARMUP);
        let outcome = BreadthFirst::default().solve(&ctx, &NoopObserver).unwrap();
        assert_eq!(outcome.moves.len(), 4);
        assert_valid_solution(&layout, &outcome.moves);
    }

    #[test]
    fn test_pillar_routes_around_obstacles() {
        let (layout, ctx) = context(&PILLAR);
        let outcome = BreadthFirst::default().solve(&ctx, &NoopObserver).unwrap();
        assert!(outcome.is_solved());
        assert_valid_solution(&layout, &outcome.moves);
    }

    #[test]
    fn test_already_solved_returns_no_moves() {
        let (_, ctx) = context(&SOLVED);
        let outcome = BreadthFirst::default().solve(&ctx, &NoopObserver).unwrap();
        assert_eq!(outcome.status, Status::Solved);
        assert!(outcome.moves.is_empty());
        assert_eq!(outcome.stats.nodes_expanded, 0);
    }

    #[test]
    fn test_sealed_goal_is_exhausted() {
        let (_, ctx) = context(&SEALED);
        let outcome = BreadthFirst::default().solve(&ctx, &NoopObserver).unwrap();
        assert_eq!(outcome.status, Status::Exhausted);
        assert!(outcome.moves.is_empty());
        // only the lone soldier moves: six reachable arrangements
        assert_eq!(outcome.stats.nodes_expanded, 6);
    }

    #[test]
    fn test_reports_progress() {
        let (_, ctx) = context(&CLASSIC);
        let observer = CollectingObserver::new();
        let solver = BreadthFirst {
            limits: Limits {
                progress_interval: 1_000,
                ..Limits::default()
            },
        };
        let outcome = solver.solve(&ctx, &observer).unwrap();
        let snapshots = observer.snapshots();
        assert!(!snapshots.is_empty());
        assert!(snapshots.iter().all(|p| p.strategy == "bfs"));
        assert!(snapshots
            .windows(2)
            .all(|pair| pair[0].nodes_expanded < pair[1].nodes_expanded));
        assert!(outcome.stats.nodes_expanded >= snapshots.len() as u64 * 1_000);
    }
}
