//! Search telemetry.
//!
//! Strategies report periodic [`Progress`] snapshots to a caller-supplied
//! [`ProgressObserver`]. Observers are purely observational: nothing a
//! search does depends on them.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

/// One telemetry snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    pub strategy: &'static str,
    pub nodes_expanded: u64,
    pub frontier_len: usize,
    /// Current depth, layer, or round, depending on the strategy.
    pub depth: u32,
    pub elapsed: Duration,
}

/// Receives progress snapshots, possibly from several worker threads.
pub trait ProgressObserver: Sync {
    fn on_progress(&self, progress: &Progress);
}

/// Discards every snapshot.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_progress(&self, _progress: &Progress) {}
}

/// Logs every snapshot at debug level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn on_progress(&self, progress: &Progress) {
        debug!(
            strategy = progress.strategy,
            expanded = progress.nodes_expanded,
            frontier = progress.frontier_len,
            depth = progress.depth,
            elapsed_ms = progress.elapsed.as_millis() as u64,
            "search progress"
        );
    }
}

/// Keeps every snapshot in memory.
#[derive(Debug, Default)]
pub struct CollectingObserver {
    snapshots: Mutex<Vec<Progress>>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<Progress> {
        self.snapshots.lock().clone()
    }
}

impl ProgressObserver for CollectingObserver {
    fn on_progress(&self, progress: &Progress) {
        self.snapshots.lock().push(*progress);
    }
}

/// Rate-limits reports from a single-threaded search loop.
#[derive(Debug)]
pub(crate) struct ProgressMeter {
    strategy: &'static str,
    interval: u64,
    next_report: u64,
    started: Instant,
}

impl ProgressMeter {
    pub(crate) fn new(strategy: &'static str, interval: u64, started: Instant) -> Self {
        let interval = interval.max(1);
        Self {
            strategy,
            interval,
            next_report: interval,
            started,
        }
    }

    /// Reports once every `interval` expansions.
    #[inline]
    pub(crate) fn tick(
        &mut self,
        observer: &dyn ProgressObserver,
        nodes_expanded: u64,
        frontier_len: usize,
        depth: u32,
    ) {
        if nodes_expanded >= self.next_report {
            self.next_report = nodes_expanded + self.interval;
            self.report(observer, nodes_expanded, frontier_len, depth);
        }
    }

    /// Reports unconditionally, e.g. once per layer.
    pub(crate) fn report(
        &self,
        observer: &dyn ProgressObserver,
        nodes_expanded: u64,
        frontier_len: usize,
        depth: u32,
    ) {
        observer.on_progress(&Progress {
            strategy: self.strategy,
            nodes_expanded,
            frontier_len,
            depth,
            elapsed: self.started.elapsed(),
        });
    }
}
