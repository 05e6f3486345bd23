//! Search strategies over the implicit graph of configurations.
//!
//! Every strategy implements [`Solver`] and returns a [`SearchOutcome`]:
//! a status, the move list (empty unless solved), and final statistics.
//! Failing to find a solution is an ordinary outcome, never an error.

mod astar;
mod beam;
mod bfs;
mod bidirectional;
mod parallel;

use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tracing::info;

pub use astar::AStar;
pub use beam::Beam;
pub use bfs::BreadthFirst;
pub use bidirectional::Bidirectional;
pub use parallel::ParallelAStar;

use crate::board::{Move, SearchContext};
use crate::error::SolveResult;
use crate::grid::StateKey;
use crate::progress::ProgressObserver;

/// Trait that erases the concrete strategy for dynamic dispatch.
pub trait Solver: Send + Sync {
    fn name(&self) -> &'static str;

    fn solve(
        &self,
        ctx: &SearchContext,
        observer: &dyn ProgressObserver,
    ) -> SolveResult<SearchOutcome>;
}

/// How a search ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// A goal configuration was reached.
    Solved,
    /// Every reachable configuration the strategy considers was explored.
    Exhausted,
    /// A depth, width, round, or time bound was hit first.
    Bounded,
    /// The caller cancelled the search.
    Cancelled,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Solved => "solved",
            Status::Exhausted => "exhausted",
            Status::Bounded => "bounded",
            Status::Cancelled => "cancelled",
        })
    }
}

/// Counters collected over one search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes_expanded: u64,
    pub nodes_generated: u64,
    pub max_frontier: usize,
    /// Deepest depth, layer, or round reached.
    pub depth: u32,
    pub elapsed: Duration,
}

impl SearchStats {
    #[inline]
    pub(crate) fn observe(&mut self, frontier_len: usize, depth: u32) {
        self.max_frontier = self.max_frontier.max(frontier_len);
        self.depth = self.depth.max(depth);
    }
}

/// Result of one search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchOutcome {
    pub status: Status,
    /// Moves from the initial configuration to the goal; empty unless
    /// solved, and also empty when the layout starts solved.
    pub moves: Vec<Move>,
    pub stats: SearchStats,
}

impl SearchOutcome {
    #[inline]
    pub fn is_solved(&self) -> bool {
        self.status == Status::Solved
    }
}

/// Stamps the elapsed time, logs how the search ended, and builds the
/// outcome. Unsolved outcomes never carry moves.
pub(crate) fn conclude(
    strategy: &'static str,
    status: Status,
    moves: Vec<Move>,
    mut stats: SearchStats,
    started: Instant,
) -> SearchOutcome {
    stats.elapsed = started.elapsed();
    let moves = if status == Status::Solved {
        info!(
            strategy,
            moves = moves.len(),
            expanded = stats.nodes_expanded,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "solved"
        );
        moves
    } else {
        info!(
            strategy,
            ?status,
            expanded = stats.nodes_expanded,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "no solution"
        );
        Vec::new()
    };
    SearchOutcome {
        status,
        moves,
        stats,
    }
}

/// Shared flag a caller can set to stop a running search.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Limits common to every strategy.
#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub time_limit: Option<Duration>,
    pub cancel: Option<CancelToken>,
    pub progress_interval: u64,
}

impl Limits {
    pub(crate) fn start(&self, started: Instant) -> Budget {
        Budget {
            deadline: self.time_limit.map(|limit| started + limit),
            cancel: self.cancel.clone(),
        }
    }
}

/// Wall-clock and cancellation checks for one running search.
#[derive(Clone, Debug)]
pub(crate) struct Budget {
    deadline: Option<Instant>,
    cancel: Option<CancelToken>,
}

impl Budget {
    /// The status to stop with, if the search must stop now.
    #[inline]
    pub(crate) fn exceeded(&self) -> Option<Status> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Some(Status::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Status::Bounded),
            _ => None,
        }
    }
}

/// Records `g` as the best cost for `key` if it is new or strictly better.
#[inline]
pub(crate) fn record_if_better(best: &mut FxHashMap<StateKey, u32>, key: StateKey, g: u32) -> bool {
    match best.entry(key) {
        Entry::Occupied(mut known) => {
            if g < *known.get() {
                known.insert(g);
                true
            } else {
                false
            }
        }
        Entry::Vacant(slot) => {
            slot.insert(g);
            true
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::CLASSIC;

    #[test]
    fn test_record_if_better_only_accepts_strict_improvements() {
        let (_, ctx) = fixtures::context(&CLASSIC);
        let mut best = FxHashMap::default();
        let key = || ctx.key(&ctx.initial());
        assert!(record_if_better(&mut best, key(), 5));
        assert!(!record_if_better(&mut best, key(), 5));
        assert!(!record_if_better(&mut best, key(), 6));
        assert!(record_if_better(&mut best, key(), 4));
        assert_eq!(best[&key()], 4);
    }

    #[test]
    fn test_budget_reports_cancellation() {
        let cancel = CancelToken::new();
        let limits = Limits {
            cancel: Some(cancel.clone()),
            ..Limits::default()
        };
        let budget = limits.start(Instant::now());
        assert_eq!(budget.exceeded(), None);
        cancel.cancel();
        assert_eq!(budget.exceeded(), Some(Status::Cancelled));
    }

    #[test]
    fn test_budget_reports_deadline() {
        let limits = Limits {
            time_limit: Some(Duration::ZERO),
            ..Limits::default()
        };
        assert_eq!(limits.start(Instant::now()).exceeded(), Some(Status::Bounded));
    }
}
