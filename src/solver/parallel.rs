//! A* with one frontier shared by a pool of worker threads.
//!
//! The open list is a lock-protected binary heap with a condition variable;
//! the best-known `g` table is a sharded concurrent map. Workers pop with a
//! bounded wait so they notice a claimed solution, a cancellation, or a
//! deadline promptly. The first worker to pop a goal claims it with a single
//! compare-and-set and closes the frontier, which releases every waiter.
//!
//! The frontier counts nodes in flight (popped but not yet expanded), so an
//! empty heap only means "exhausted" once no worker can push anything more.

use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use rustc_hash::FxBuildHasher;
use tracing::{debug, trace};

use super::{conclude, Budget, Limits, SearchOutcome, SearchStats, Solver, Status};
use crate::board::{Configuration, Move, SearchContext};
use crate::error::{SolveError, SolveResult};
use crate::grid::StateKey;
use crate::heuristic::Heuristic;
use crate::progress::{Progress, ProgressObserver};

/// Concurrent A*: any solution it returns is valid, but which one wins
/// depends on thread timing, so lengths may vary between runs.
#[derive(Clone, Debug)]
pub struct ParallelAStar {
    pub heuristic: Heuristic,
    pub prune_reversals: bool,
    pub workers: usize,
    /// Longest a worker blocks on an empty frontier before re-checking flags.
    pub poll_interval: Duration,
    pub limits: Limits,
}

/// A node in the shared search. Workers only ever hold immutable chains, so
/// parents are plain reference-counted back-links.
#[derive(Debug)]
struct ChainNode {
    config: Configuration,
    g: u32,
    via: Option<Move>,
    parent: Option<Arc<ChainNode>>,
}

impl ChainNode {
    fn path(&self) -> Vec<Move> {
        let mut moves = Vec::with_capacity(self.g as usize);
        let mut current = self;
        while let (Some(mv), Some(parent)) = (current.via, current.parent.as_deref()) {
            moves.push(mv);
            current = parent;
        }
        moves.reverse();
        moves
    }
}

/// Heap entry ranked by `(f, h, seq)`, smallest first.
struct Queued {
    rank: (u32, u32, u64),
    node: Arc<ChainNode>,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.rank == other.rank
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other.rank.cmp(&self.rank)
    }
}

#[derive(Default)]
struct FrontierState {
    open: BinaryHeap<Queued>,
    in_flight: usize,
    seq: u64,
    closed: bool,
}

impl FrontierState {
    fn push(&mut self, f: u32, h: u32, node: Arc<ChainNode>) {
        self.seq += 1;
        self.open.push(Queued {
            rank: (f, h, self.seq),
            node,
        });
    }
}

enum Pop {
    Node(Arc<ChainNode>),
    /// Nothing to take yet, but other workers are still expanding.
    Idle,
    /// Empty and nothing in flight: the reachable space is exhausted.
    Drained,
    Closed,
}

#[derive(Default)]
struct Frontier {
    state: Mutex<FrontierState>,
    ready: Condvar,
}

impl Frontier {
    fn pop(&self, timeout: Duration) -> Pop {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return Pop::Closed;
            }
            if let Some(queued) = state.open.pop() {
                state.in_flight += 1;
                return Pop::Node(queued.node);
            }
            if state.in_flight == 0 {
                return Pop::Drained;
            }
            if self.ready.wait_for(&mut state, timeout).timed_out() {
                return Pop::Idle;
            }
        }
    }

    /// Pushes the children of a popped node and retires it. Returns the
    /// open-list length afterwards.
    fn complete(&self, children: Vec<(u32, u32, Arc<ChainNode>)>) -> usize {
        let mut state = self.state.lock();
        let woken = children.len();
        for (f, h, node) in children {
            state.push(f, h, node);
        }
        state.in_flight = state.in_flight.saturating_sub(1);
        let len = state.open.len();
        let drained = state.in_flight == 0 && state.open.is_empty();
        drop(state);

        if drained {
            self.ready.notify_all();
        } else {
            for _ in 0..woken {
                self.ready.notify_one();
            }
        }
        len
    }

    fn close(&self) {
        self.state.lock().closed = true;
        self.ready.notify_all();
    }
}

/// Closes the frontier if its worker unwinds, so no sibling waits on an
/// in-flight node that will never complete.
struct CloseOnPanic<'a>(&'a Frontier);

impl Drop for CloseOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.close();
        }
    }
}

/// State shared by every worker of one search.
struct Shared<'a> {
    ctx: &'a SearchContext,
    observer: &'a dyn ProgressObserver,
    budget: Budget,
    started: Instant,
    frontier: Frontier,
    best_g: DashMap<StateKey, u32, FxBuildHasher>,
    solved: AtomicBool,
    winner: Mutex<Option<Arc<ChainNode>>>,
    stopped: Mutex<Option<Status>>,
    expanded: AtomicU64,
    generated: AtomicU64,
    max_frontier: AtomicUsize,
    depth: AtomicU32,
}

impl Shared<'_> {
    /// Lowers the best `g` for `key` if `g` is new or strictly better.
    fn improve(&self, key: StateKey, g: u32) -> bool {
        match self.best_g.entry(key) {
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

    fn stop(&self, status: Status) {
        self.stopped.lock().get_or_insert(status);
        self.frontier.close();
    }

    fn stats(&self) -> SearchStats {
        SearchStats {
            nodes_expanded: self.expanded.load(Ordering::Relaxed),
            nodes_generated: self.generated.load(Ordering::Relaxed),
            max_frontier: self.max_frontier.load(Ordering::Relaxed),
            depth: self.depth.load(Ordering::Relaxed),
            elapsed: Duration::ZERO,
        }
    }
}

impl ParallelAStar {
    fn work(&self, worker: usize, shared: &Shared<'_>) {
        let _guard = CloseOnPanic(&shared.frontier);
        let ctx = shared.ctx;
        let interval = self.limits.progress_interval.max(1);
        trace!(worker, "worker started");

        loop {
            if shared.solved.load(Ordering::Acquire) {
                break;
            }
            if let Some(status) = shared.budget.exceeded() {
                shared.stop(status);
                break;
            }
            let node = match shared.frontier.pop(self.poll_interval) {
                Pop::Node(node) => node,
                Pop::Idle => continue,
                Pop::Drained | Pop::Closed => break,
            };

            if ctx.is_goal(&node.config) {
                if shared
                    .solved
                    .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    debug!(worker, g = node.g, "goal claimed");
                    *shared.winner.lock() = Some(Arc::clone(&node));
                    shared.frontier.close();
                }
                shared.frontier.complete(Vec::new());
                break;
            }

            let stale = shared
                .best_g
                .get(&ctx.key(&node.config))
                .is_some_and(|best| *best < node.g);
            if stale {
                shared.frontier.complete(Vec::new());
                continue;
            }

            let g = node.g + 1;
            let undo = node.via.map(|mv| mv.inverse());
            let mut children = Vec::new();
            for (mv, next) in ctx.successors(&node.config) {
                if self.prune_reversals && undo == Some(mv) {
                    continue;
                }
                shared.generated.fetch_add(1, Ordering::Relaxed);
                if shared.improve(ctx.key(&next), g) {
                    let h = self.heuristic.estimate(ctx, &next);
                    let child = ChainNode {
                        config: next,
                        g,
                        via: Some(mv),
                        parent: Some(Arc::clone(&node)),
                    };
                    children.push((g + h, h, Arc::new(child)));
                }
            }

            let frontier_len = shared.frontier.complete(children);
            let expanded = shared.expanded.fetch_add(1, Ordering::Relaxed) + 1;
            shared.max_frontier.fetch_max(frontier_len, Ordering::Relaxed);
            shared.depth.fetch_max(g, Ordering::Relaxed);
            if expanded % interval == 0 {
                shared.observer.on_progress(&Progress {
                    strategy: self.name(),
                    nodes_expanded: expanded,
                    frontier_len,
                    depth: g,
                    elapsed: shared.started.elapsed(),
                });
            }
        }
        trace!(worker, "worker stopped");
    }
}

impl Solver for ParallelAStar {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn solve(
        &self,
        ctx: &SearchContext,
        observer: &dyn ProgressObserver,
    ) -> SolveResult<SearchOutcome> {
        if self.workers == 0 {
            return Err(SolveError::InvalidConfig {
                message: "worker count must be at least 1".to_string(),
            });
        }
        let started = Instant::now();
        let shared = Shared {
            ctx,
            observer,
            budget: self.limits.start(started),
            started,
            frontier: Frontier::default(),
            best_g: DashMap::with_hasher(FxBuildHasher::default()),
            solved: AtomicBool::new(false),
            winner: Mutex::new(None),
            stopped: Mutex::new(None),
            expanded: AtomicU64::new(0),
            generated: AtomicU64::new(0),
            max_frontier: AtomicUsize::new(1),
            depth: AtomicU32::new(0),
        };

        let start = ctx.initial();
        shared.best_g.insert(ctx.key(&start), 0);
        let h = self.heuristic.estimate(ctx, &start);
        let root = ChainNode {
            config: start,
            g: 0,
            via: None,
            parent: None,
        };
        shared.frontier.state.lock().push(h, h, Arc::new(root));
        debug!(strategy = self.name(), workers = self.workers, "search started");

        let panicked = thread::scope(|scope| {
            let handles: Vec<_> = (0..self.workers)
                .map(|worker| {
                    let shared = &shared;
                    scope.spawn(move || self.work(worker, shared))
                })
                .collect();
            handles
                .into_iter()
                .enumerate()
                .filter_map(|(worker, handle)| handle.join().err().map(|_| worker))
                .min()
        });
        if let Some(worker) = panicked {
            return Err(SolveError::WorkerPanicked { worker });
        }

        let stats = shared.stats();
        let winner = shared.winner.lock().take();
        let outcome = match winner {
            Some(node) => conclude(self.name(), Status::Solved, node.path(), stats, started),
            None => {
                let status = (*shared.stopped.lock()).unwrap_or(Status::Exhausted);
                conclude(self.name(), status, Vec::new(), stats, started)
            }
        };
        Ok(outcome)
    }
}
