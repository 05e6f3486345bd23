//! Bidirectional breadth-first search.
//!
//! The backward side starts from a single synthetic goal: the goal piece on
//! its target with every other piece where the layout put it. The true goal
//! set is far larger, so this search can miss solutions that end with the
//! other pieces rearranged, and it gives up immediately when the goal piece
//! cannot sit on the target without overlapping another piece.

use std::time::Instant;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use super::{conclude, Limits, SearchOutcome, SearchStats, Solver, Status};
use crate::board::{Configuration, Move, SearchContext};
use crate::error::SolveResult;
use crate::grid::StateKey;
use crate::node::{NodeId, SearchTree};
use crate::progress::{ProgressMeter, ProgressObserver};

#[derive(Clone, Debug)]
pub struct Bidirectional {
    /// Layer expansions (on either side) before giving up.
    pub max_rounds: u32,
    pub limits: Limits,
}

/// One direction of the search.
struct Side {
    tree: SearchTree,
    index: FxHashMap<StateKey, NodeId>,
    frontier: Vec<NodeId>,
}

impl Side {
    fn seeded(ctx: &SearchContext, config: Configuration) -> Self {
        let mut index = FxHashMap::default();
        let mut tree = SearchTree::new();
        let key = ctx.key(&config);
        let root = tree.push_root(config, 0);
        index.insert(key, root);
        Self {
            tree,
            index,
            frontier: vec![root],
        }
    }

    /// Expands the whole frontier by one layer. Returns `(own, other)` node
    /// ids of the first state the other side has already seen.
    fn expand_layer(
        &mut self,
        ctx: &SearchContext,
        other: &Side,
        stats: &mut SearchStats,
    ) -> Option<(NodeId, NodeId)> {
        let layer = std::mem::take(&mut self.frontier);
        for id in layer {
            stats.nodes_expanded += 1;
            let children: Vec<_> = ctx.successors(&self.tree.get(id).config).collect();
            for (mv, next) in children {
                stats.nodes_generated += 1;
                let key = ctx.key(&next);
                if self.index.contains_key(&key) {
                    continue;
                }
                let child = self.tree.push_child(id, mv, next, 0);
                if let Some(&theirs) = other.index.get(&key) {
                    return Some((child, theirs));
                }
                self.index.insert(key, child);
                self.frontier.push(child);
            }
        }
        None
    }
}

/// Maps each piece index of `backward` to the piece of `forward` that has
/// the same label and anchor.
///
/// The sides meet on key equality, and under interchangeable labels two
/// configurations share a key when identical pieces sit in swapped places.
/// Moves recorded on the backward side name its own indices, so they must be
/// renamed before they can be replayed from the forward meeting state.
fn relabeling(
    ctx: &SearchContext,
    forward: &Configuration,
    backward: &Configuration,
) -> Option<Vec<usize>> {
    backward
        .origins()
        .iter()
        .enumerate()
        .map(|(piece, &origin)| {
            (0..forward.origins().len()).find(|&other| {
                forward.origins()[other] == origin && ctx.labels[other] == ctx.labels[piece]
            })
        })
        .collect()
}

/// Forward moves to the meeting state, then the backward path from the
/// meeting state to the seed, reversed with every move inverted and its
/// piece renamed through `relabel`.
fn splice(
    forward: &SearchTree,
    meet_forward: NodeId,
    backward: &SearchTree,
    meet_backward: NodeId,
    relabel: &[usize],
) -> Vec<Move> {
    let mut moves = forward.reconstruct(meet_forward);
    moves.extend(
        backward
            .reconstruct(meet_backward)
            .into_iter()
            .rev()
            .map(|mv| Move::new(relabel[mv.piece], mv.direction.inverse())),
    );
    moves
}

impl Solver for Bidirectional {
    fn name(&self) -> &'static str {
        "bidirectional"
    }

    fn solve(
        &self,
        ctx: &SearchContext,
        observer: &dyn ProgressObserver,
    ) -> SolveResult<SearchOutcome> {
        let started = Instant::now();
        let budget = self.limits.start(started);
        let meter = ProgressMeter::new(self.name(), self.limits.progress_interval, started);
        let mut stats = SearchStats::default();

        let start = ctx.initial();
        if ctx.is_goal(&start) {
            return Ok(conclude(self.name(), Status::Solved, Vec::new(), stats, started));
        }

        let mut origins = start.origins().to_vec();
        origins[ctx.goal()] = ctx.target();
        let Some(seed) = ctx.arrange(origins) else {
            warn!(
                target_cell = %ctx.target(),
                "goal piece overlaps another piece at the target, no backward seed"
            );
            return Ok(conclude(self.name(), Status::Exhausted, Vec::new(), stats, started));
        };

        let mut forward = Side::seeded(ctx, start);
        let mut backward = Side::seeded(ctx, seed);
        debug!(strategy = self.name(), max_rounds = self.max_rounds, "search started");

        for round in 1..=self.max_rounds {
            if let Some(status) = budget.exceeded() {
                return Ok(conclude(self.name(), status, Vec::new(), stats, started));
            }
            if forward.frontier.is_empty() || backward.frontier.is_empty() {
                return Ok(conclude(self.name(), Status::Exhausted, Vec::new(), stats, started));
            }

            let forward_turn = forward.frontier.len() <= backward.frontier.len();
            let meeting = if forward_turn {
                forward.expand_layer(ctx, &backward, &mut stats)
            } else {
                backward
                    .expand_layer(ctx, &forward, &mut stats)
                    .map(|(own, theirs)| (theirs, own))
            };

            if let Some((meet_forward, meet_backward)) = meeting {
                stats.observe(0, round);
                let Some(relabel) = relabeling(
                    ctx,
                    &forward.tree.get(meet_forward).config,
                    &backward.tree.get(meet_backward).config,
                ) else {
                    warn!(round, "meeting states share a key but not a layout");
                    return Ok(conclude(self.name(), Status::Exhausted, Vec::new(), stats, started));
                };
                let moves = splice(
                    &forward.tree,
                    meet_forward,
                    &backward.tree,
                    meet_backward,
                    &relabel,
                );
                return Ok(conclude(self.name(), Status::Solved, moves, stats, started));
            }

            let frontier_len = forward.frontier.len() + backward.frontier.len();
            stats.observe(frontier_len, round);
            meter.report(observer, stats.nodes_expanded, frontier_len, round);
        }

        Ok(conclude(self.name(), Status::Bounded, Vec::new(), stats, started))
    }
}
