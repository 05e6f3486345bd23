//! Beam search: layer-by-layer expansion keeping only the best `width`
//! candidates of each new layer.
//!
//! Candidates dropped by the width cut are gone for good, which is what
//! makes the strategy incomplete. Duplicates are detected globally by state
//! key. With refinement enabled the arena records every edge it discovers;
//! after a solved pass every retained node is labelled with its graph
//! distance to the goal, and the next pass ranks by `g + distance + h`.

use std::time::Instant;

use rustc_hash::FxHashMap;
use tracing::debug;

use super::{conclude, Budget, Limits, SearchOutcome, SearchStats, Solver, Status};
use crate::board::{Move, SearchContext};
use crate::error::{SolveError, SolveResult};
use crate::grid::StateKey;
use crate::heuristic::Heuristic;
use crate::node::{NodeId, SearchTree};
use crate::progress::{ProgressMeter, ProgressObserver};

#[derive(Clone, Debug)]
pub struct Beam {
    pub heuristic: Heuristic,
    /// Nodes kept per layer.
    pub width: usize,
    /// Layers expanded before giving up.
    pub max_depth: u32,
    /// Extra passes ranked by distance labels from the previous solved pass.
    pub refine_passes: usize,
    pub limits: Limits,
}

/// Distance to the goal per state, learned from a solved pass.
type DistanceLabels = FxHashMap<StateKey, u32>;

enum Pass {
    Solved {
        moves: Vec<Move>,
        labels: DistanceLabels,
    },
    Failed(Status),
}

impl Beam {
    /// Sort key for a candidate. Labelled states rank ahead of unlabelled
    /// ones once labels exist.
    fn rank(
        tree: &SearchTree,
        id: NodeId,
        key: &StateKey,
        labels: Option<&DistanceLabels>,
    ) -> (u8, u32) {
        let node = tree.get(id);
        match labels {
            None => (0, node.f()),
            Some(labels) => match labels.get(key) {
                Some(&distance) => (0, node.f() + distance),
                None => (1, node.f()),
            },
        }
    }

    fn run_pass(
        &self,
        ctx: &SearchContext,
        labels: Option<&DistanceLabels>,
        budget: &Budget,
        stats: &mut SearchStats,
        meter: &ProgressMeter,
        observer: &dyn ProgressObserver,
    ) -> Pass {
        let lattice = self.refine_passes > 0;
        let mut tree = if lattice {
            SearchTree::with_links()
        } else {
            SearchTree::new()
        };
        let mut seen: FxHashMap<StateKey, NodeId> = FxHashMap::default();

        let start = ctx.initial();
        let h = self.heuristic.estimate(ctx, &start);
        let start_key = ctx.key(&start);
        let root = tree.push_root(start, h);
        seen.insert(start_key, root);

        let mut layer = vec![root];
        let mut depth = 0;
        let goal = loop {
            if let Some(&goal) = layer.iter().find(|&&id| ctx.is_goal(&tree.get(id).config)) {
                break goal;
            }
            if let Some(status) = budget.exceeded() {
                return Pass::Failed(status);
            }
            if depth >= self.max_depth {
                return Pass::Failed(Status::Bounded);
            }

            let mut candidates: Vec<(NodeId, StateKey)> = Vec::new();
            for &id in &layer {
                stats.nodes_expanded += 1;
                let children: Vec<_> = ctx.successors(&tree.get(id).config).collect();
                for (mv, next) in children {
                    stats.nodes_generated += 1;
                    let key = ctx.key(&next);
                    match seen.get(&key) {
                        Some(&known) => {
                            tree.link(id, known, mv);
                        }
                        None => {
                            let h = self.heuristic.estimate(ctx, &next);
                            let child = tree.push_child(id, mv, next, h);
                            seen.insert(key.clone(), child);
                            candidates.push((child, key));
                        }
                    }
                }
            }
            depth += 1;
            if candidates.is_empty() {
                return Pass::Failed(Status::Exhausted);
            }

            // a goal is never lost to the width cut
            if let Some(&(goal, _)) = candidates
                .iter()
                .find(|(id, _)| ctx.is_goal(&tree.get(*id).config))
            {
                stats.observe(candidates.len(), depth);
                break goal;
            }

            candidates.sort_by_cached_key(|(id, key)| Self::rank(&tree, *id, key, labels));
            candidates.truncate(self.width);
            layer = candidates.into_iter().map(|(id, _)| id).collect();

            stats.observe(layer.len(), depth);
            meter.report(observer, stats.nodes_expanded, layer.len(), depth);
        };

        let moves = tree.reconstruct(goal);
        let distances = tree.distances_to(&[goal]);
        let labels = seen
            .into_iter()
            .filter_map(|(key, id)| distances[id.index()].map(|distance| (key, distance)))
            .collect();
        Pass::Solved { moves, labels }
    }
}

impl Solver for Beam {
    fn name(&self) -> &'static str {
        "beam"
    }

    fn solve(
        &self,
        ctx: &SearchContext,
        observer: &dyn ProgressObserver,
    ) -> SolveResult<SearchOutcome> {
        if self.width == 0 {
            return Err(SolveError::InvalidConfig {
                message: "beam width must be at least 1".to_string(),
            });
        }
        let started = Instant::now();
        let budget = self.limits.start(started);
        let meter = ProgressMeter::new(self.name(), self.limits.progress_interval, started);
        let mut stats = SearchStats::default();
        debug!(
            strategy = self.name(),
            width = self.width,
            max_depth = self.max_depth,
            refine_passes = self.refine_passes,
            "search started"
        );

        let mut best: Option<Vec<Move>> = None;
        let mut labels: Option<DistanceLabels> = None;
        let mut failure = Status::Exhausted;
        for pass in 0..=self.refine_passes {
            match self.run_pass(ctx, labels.as_ref(), &budget, &mut stats, &meter, observer) {
                Pass::Solved {
                    moves,
                    labels: learned,
                } => {
                    debug!(pass, moves = moves.len(), labelled = learned.len(), "pass solved");
                    if best.as_ref().map_or(true, |known| moves.len() < known.len()) {
                        best = Some(moves);
                    }
                    labels = Some(learned);
                }
                Pass::Failed(status) => {
                    debug!(pass, ?status, "pass failed");
                    if best.is_none() {
                        failure = status;
                    }
                    break;
                }
            }
        }

        let outcome = match best {
            Some(moves) => conclude(self.name(), Status::Solved, moves, stats, started),
            None => conclude(self.name(), failure, Vec::new(), stats, started),
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::{CLASSIC, PILLAR, SEALED, SOLVED, WARMUP};
    use crate::progress::{CollectingObserver, NoopObserver};
    use crate::solver::fixtures::{assert_valid_solution, context};
    use crate::solver::BreadthFirst;

    fn beam(width: usize, max_depth: u32) -> Beam {
        Beam {
            heuristic: Heuristic::blocker(),
            width,
            max_depth,
            refine_passes: 0,
            limits: Limits::default(),
        }
    }

    #[test]
    fn test_wide_beam_solves_classic() {
        let (layout, ctx) = context(&CLASSIC);
        let outcome = beam(10_000, 300).solve(&ctx, &NoopObserver).unwrap();
        assert_eq!(outcome.status, Status::Solved);
        assert!(outcome.moves.len() >= 116);
        assert_valid_solution(&layout, &outcome.moves);
    }

    #[test]
    fn test_never_shorter_than_bfs() {
        for level in [WARMUP, PILLAR] {
            let (layout, ctx) = context(&level);
            let shortest = BreadthFirst::default().solve(&ctx, &NoopObserver).unwrap();
            for width in [1, 2, 50] {
                let outcome = beam(width, 100).solve(&ctx, &NoopObserver).unwrap();
                if outcome.is_solved() {
                    assert!(outcome.moves.len() >= shortest.moves.len());
                    assert_valid_solution(&layout, &outcome.moves);
                }
            }
        }
    }

    #[test]
    fn test_depth_bound_reports_bounded() {
        let (_, ctx) = context(&CLASSIC);
        let outcome = beam(10_000, 10).solve(&ctx, &NoopObserver).unwrap();
        assert_eq!(outcome.status, Status::Bounded);
        assert!(outcome.moves.is_empty());
        assert_eq!(outcome.stats.depth, 10);
    }

    #[test]
    fn test_trivial_and_unsolvable() {
        let (_, ctx) = context(&SOLVED);
        let outcome = beam(5, 10).solve(&ctx, &NoopObserver).unwrap();
        assert_eq!(outcome.status, Status::Solved);
        assert!(outcome.moves.is_empty());

        let (_, ctx) = context(&SEALED);
        let outcome = beam(5, 300).solve(&ctx, &NoopObserver).unwrap();
        assert_eq!(outcome.status, Status::Exhausted);
        assert!(outcome.moves.is_empty());
    }

    #[test]
    fn test_refinement_never_lengthens_the_answer() {
        let (layout, ctx) = context(&CLASSIC);
        let single = beam(2_000, 300).solve(&ctx, &NoopObserver).unwrap();
        let refined = Beam {
            refine_passes: 2,
            ..beam(2_000, 300)
        }
        .solve(&ctx, &NoopObserver)
        .unwrap();
        if single.is_solved() {
            assert!(refined.is_solved());
            assert!(refined.moves.len() <= single.moves.len());
            assert_valid_solution(&layout, &refined.moves);
        }
    }

    #[test]
    fn test_reports_once_per_layer() {
        let (_, ctx) = context(&WARMUP);
        let observer = CollectingObserver::new();
        let outcome = beam(50, 100).solve(&ctx, &observer).unwrap();
        assert!(outcome.is_solved());
        let depths: Vec<u32> = observer.snapshots().iter().map(|p| p.depth).collect();
        // the last layer holds the goal and is not reported
        let expected: Vec<u32> = (1..outcome.moves.len() as u32).collect();
        assert_eq!(depths, expected);
    }

    #[test]
    fn test_zero_width_rejected() {
        let (_, ctx) = context(&WARMUP);
        assert!(matches!(
            beam(0, 10).solve(&ctx, &NoopObserver),
            Err(SolveError::InvalidConfig { .. })
        ));
    }
}
