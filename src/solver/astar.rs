//! A* over a single binary heap.
//!
//! The heap is ordered by ascending `f = g + h`, ties broken by ascending
//! `h` and then by insertion order, so runs are deterministic. A best-known
//! `g` table gates insertion; stale heap entries whose `g` has since been
//! beaten are skipped when popped.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Instant;

use rustc_hash::FxHashMap;
use tracing::debug;

use super::{conclude, record_if_better, Limits, SearchOutcome, SearchStats, Solver, Status};
use crate::board::SearchContext;
use crate::error::SolveResult;
use crate::heuristic::Heuristic;
use crate::node::{NodeId, SearchTree};
use crate::progress::{ProgressMeter, ProgressObserver};

/// Heap entry: `(f, h, insertion sequence, node)`, smallest first.
type Queued = Reverse<(u32, u32, u64, NodeId)>;

#[derive(Clone, Debug, Default)]
pub struct AStar {
    pub heuristic: Heuristic,
    /// Skip the move that would undo the move producing the current node.
    pub prune_reversals: bool,
    pub limits: Limits,
}

impl Solver for AStar {
    fn name(&self) -> &'static str {
        "astar"
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
        let mut best_g = FxHashMap::default();
        best_g.insert(ctx.key(&start), 0);
        let h = self.heuristic.estimate(ctx, &start);
        let mut tree = SearchTree::new();
        let root = tree.push_root(start, h);

        let mut seq = 0u64;
        let mut open: BinaryHeap<Queued> = BinaryHeap::new();
        open.push(Reverse((h, h, seq, root)));
        debug!(
            strategy = self.name(),
            heuristic = ?self.heuristic,
            prune_reversals = self.prune_reversals,
            "search started"
        );

        let status = loop {
            let Some(Reverse((_, _, _, id))) = open.pop() else {
                break Status::Exhausted;
            };
            if let Some(status) = budget.exceeded() {
                break status;
            }

            let node = tree.get(id);
            // settled check: a cheaper route to this state was queued later
            if best_g
                .get(&ctx.key(&node.config))
                .is_some_and(|&g| g < node.g)
            {
                continue;
            }
            if ctx.is_goal(&node.config) {
                let moves = tree.reconstruct(id);
                return Ok(conclude(self.name(), Status::Solved, moves, stats, started));
            }

            let g = node.g + 1;
            let undo = node.via.map(|mv| mv.inverse());
            let children: Vec<_> = ctx
                .successors(&node.config)
                .filter(|&(mv, _)| !(self.prune_reversals && undo == Some(mv)))
                .collect();
            stats.nodes_expanded += 1;

            for (mv, next) in children {
                stats.nodes_generated += 1;
                if record_if_better(&mut best_g, ctx.key(&next), g) {
                    let h = self.heuristic.estimate(ctx, &next);
                    let child = tree.push_child(id, mv, next, h);
                    seq += 1;
                    open.push(Reverse((g + h, h, seq, child)));
                }
            }

            stats.observe(open.len(), g);
            meter.tick(observer, stats.nodes_expanded, open.len(), g);
        };

        Ok(conclude(self.name(), status, Vec::new(), stats, started))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::{CLASSIC, PILLAR, SEALED, SOLVED, WARMUP};
    use crate::progress::NoopObserver;
    use crate::solver::fixtures::{assert_valid_solution, context};
    use crate::solver::{BreadthFirst, CancelToken};

    fn astar(heuristic: Heuristic) -> AStar {
        AStar {
            heuristic,
            prune_reversals: true,
            limits: Limits::default(),
        }
    }

    #[test]
    fn test_manhattan_matches_bfs_on_classic() {
        let (layout, ctx) = context(&CLASSIC);
        let outcome = astar(Heuristic::Manhattan).solve(&ctx, &NoopObserver).unwrap();
        assert_eq!(outcome.status, Status::Solved);
        assert_eq!(outcome.moves.len(), 116);
        assert_valid_solution(&layout, &outcome.moves);
    }

    #[test]
    fn test_never_longer_than_bfs() {
        for level in [WARMUP, PILLAR] {
            let (layout, ctx) = context(&level);
            let shortest = BreadthFirst::default().solve(&ctx, &NoopObserver).unwrap();
            for prune_reversals in [true, false] {
                let solver = AStar {
                    prune_reversals,
                    ..astar(Heuristic::Manhattan)
                };
                let outcome = solver.solve(&ctx, &NoopObserver).unwrap();
                assert_eq!(outcome.moves.len(), shortest.moves.len(), "{}", level.name);
                assert_valid_solution(&layout, &outcome.moves);
            }
        }
    }

    #[test]
    fn test_blocker_penalty_still_finds_valid_solution() {
        let (layout, ctx) = context(&CLASSIC);
        let outcome = astar(Heuristic::blocker()).solve(&ctx, &NoopObserver).unwrap();
        assert!(outcome.is_solved());
        assert!(outcome.moves.len() >= 116);
        assert_valid_solution(&layout, &outcome.moves);
    }

    #[test]
    fn test_deterministic_across_runs() {
        let (_, ctx) = context(&PILLAR);
        let solver = astar(Heuristic::Manhattan);
        let first = solver.solve(&ctx, &NoopObserver).unwrap();
        let second = solver.solve(&ctx, &NoopObserver).unwrap();
        assert_eq!(first.moves, second.moves);
        assert_eq!(first.stats.nodes_expanded, second.stats.nodes_expanded);
    }

    #[test]
    fn test_trivial_and_unsolvable() {
        let (_, ctx) = context(&SOLVED);
        let outcome = astar(Heuristic::Manhattan).solve(&ctx, &NoopObserver).unwrap();
        assert_eq!(outcome.status, Status::Solved);
        assert!(outcome.moves.is_empty());

        let (_, ctx) = context(&SEALED);
        let outcome = astar(Heuristic::blocker()).solve(&ctx, &NoopObserver).unwrap();
        assert_eq!(outcome.status, Status::Exhausted);
        assert!(outcome.moves.is_empty());
    }

    #[test]
    fn test_cancelled_before_start() {
        let (_, ctx) = context(&CLASSIC);
        let cancel = CancelToken::new();
        cancel.cancel();
        let solver = AStar {
            limits: Limits {
                cancel: Some(cancel),
                ..Limits::default()
            },
            ..astar(Heuristic::Manhattan)
        };
        let outcome = solver.solve(&ctx, &NoopObserver).unwrap();
        assert_eq!(outcome.status, Status::Cancelled);
        assert!(outcome.moves.is_empty());
    }
}
