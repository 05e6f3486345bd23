//! Solver configuration: strategy choice and strategy parameters.

use std::thread;
use std::time::Duration;

use clap::ValueEnum;

use crate::error::{SolveError, SolveResult};
use crate::grid::KeyScheme;
use crate::heuristic::Heuristic;
use crate::solver::{
    AStar, Beam, Bidirectional, BreadthFirst, CancelToken, Limits, ParallelAStar, Solver,
};

/// Default number of nodes kept per beam layer.
pub const DEFAULT_BEAM_WIDTH: usize = 10_000;
/// Default depth ceiling for beam search.
pub const DEFAULT_MAX_DEPTH: u32 = 300;
/// Default round ceiling for bidirectional search.
pub const DEFAULT_MAX_ROUNDS: u32 = 200;
/// Default bounded wait on the shared frontier.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);
/// Default number of expansions between progress reports.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10_000;

/// The five search strategies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, ValueEnum)]
pub enum Strategy {
    /// Breadth-first search, always shortest.
    Bfs,
    /// A* over a single priority queue.
    #[default]
    Astar,
    /// A* with a frontier shared by a pool of worker threads.
    Parallel,
    /// Layered search keeping only the best `beam_width` nodes per layer.
    Beam,
    /// Breadth-first from both ends, meeting in the middle.
    Bidirectional,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::Bfs,
        Strategy::Astar,
        Strategy::Parallel,
        Strategy::Beam,
        Strategy::Bidirectional,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Strategy::Bfs => "bfs",
            Strategy::Astar => "astar",
            Strategy::Parallel => "parallel",
            Strategy::Beam => "beam",
            Strategy::Bidirectional => "bidirectional",
        }
    }

    /// Whether the strategy always returns a shortest solution when one
    /// exists (given an admissible heuristic where one is used).
    pub const fn is_exhaustive(self) -> bool {
        matches!(self, Strategy::Bfs | Strategy::Astar)
    }
}

/// Every tunable of a solve call.
#[derive(Clone, Debug)]
pub struct SolverConfig {
    pub strategy: Strategy,
    pub heuristic: Heuristic,
    pub key_scheme: KeyScheme,
    pub beam_width: usize,
    pub max_depth: u32,
    pub max_rounds: u32,
    pub workers: usize,
    pub poll_interval: Duration,
    pub time_limit: Option<Duration>,
    /// Skip a move that undoes the move which produced the current node.
    pub prune_reversals: bool,
    /// Extra beam passes ranked by distance labels from the previous pass.
    pub refine_passes: usize,
    pub progress_interval: u64,
    pub cancel: Option<CancelToken>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            heuristic: Heuristic::default(),
            key_scheme: KeyScheme::default(),
            beam_width: DEFAULT_BEAM_WIDTH,
            max_depth: DEFAULT_MAX_DEPTH,
            max_rounds: DEFAULT_MAX_ROUNDS,
            workers: default_workers(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            time_limit: None,
            prune_reversals: true,
            refine_passes: 0,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            cancel: None,
        }
    }
}

/// One worker per available hardware thread.
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl SolverConfig {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    pub fn with_heuristic(mut self, heuristic: Heuristic) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn with_key_scheme(mut self, key_scheme: KeyScheme) -> Self {
        self.key_scheme = key_scheme;
        self
    }

    pub fn with_beam_width(mut self, beam_width: usize) -> Self {
        self.beam_width = beam_width;
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = Some(time_limit);
        self
    }

    pub fn with_prune_reversals(mut self, prune_reversals: bool) -> Self {
        self.prune_reversals = prune_reversals;
        self
    }

    pub fn with_refine_passes(mut self, refine_passes: usize) -> Self {
        self.refine_passes = refine_passes;
        self
    }

    pub fn with_progress_interval(mut self, progress_interval: u64) -> Self {
        self.progress_interval = progress_interval;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Rejects bounds that would make a strategy unable to run.
    pub fn validate(&self) -> SolveResult<()> {
        let invalid = |message: &str| {
            Err(SolveError::InvalidConfig {
                message: message.to_string(),
            })
        };
        match self.strategy {
            Strategy::Beam if self.beam_width == 0 => invalid("beam width must be at least 1"),
            Strategy::Beam if self.max_depth == 0 => invalid("max depth must be at least 1"),
            Strategy::Bidirectional if self.max_rounds == 0 => {
                invalid("max rounds must be at least 1")
            }
            Strategy::Parallel if self.workers == 0 => invalid("worker count must be at least 1"),
            Strategy::Parallel if self.poll_interval.is_zero() => {
                invalid("poll interval must be positive")
            }
            _ => Ok(()),
        }
    }

    fn limits(&self) -> Limits {
        Limits {
            time_limit: self.time_limit,
            cancel: self.cancel.clone(),
            progress_interval: self.progress_interval,
        }
    }

    /// Builds the configured strategy.
    pub fn solver(&self) -> Box<dyn Solver> {
        let limits = self.limits();
        match self.strategy {
            Strategy::Bfs => Box::new(BreadthFirst { limits }),
            Strategy::Astar => Box::new(AStar {
                heuristic: self.heuristic,
                prune_reversals: self.prune_reversals,
                limits,
            }),
            Strategy::Parallel => Box::new(ParallelAStar {
                heuristic: self.heuristic,
                prune_reversals: self.prune_reversals,
                workers: self.workers,
                poll_interval: self.poll_interval,
                limits,
            }),
            Strategy::Beam => Box::new(Beam {
                heuristic: self.heuristic,
                width: self.beam_width,
                max_depth: self.max_depth,
                refine_passes: self.refine_passes,
                limits,
            }),
            Strategy::Bidirectional => Box::new(Bidirectional {
                max_rounds: self.max_rounds,
                limits,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SolverConfig::default();
        assert_eq!(config.strategy, Strategy::Astar);
        assert_eq!(config.heuristic, Heuristic::Manhattan);
        assert_eq!(config.beam_width, 10_000);
        assert_eq!(config.max_depth, 300);
        assert_eq!(config.max_rounds, 200);
        assert!(config.workers >= 1);
        assert!(config.prune_reversals);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_bounds() {
        let cases = [
            SolverConfig::new(Strategy::Beam).with_beam_width(0),
            SolverConfig::new(Strategy::Beam).with_max_depth(0),
            SolverConfig::new(Strategy::Bidirectional).with_max_rounds(0),
            SolverConfig::new(Strategy::Parallel).with_workers(0),
            SolverConfig::new(Strategy::Parallel).with_poll_interval(Duration::ZERO),
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(SolveError::InvalidConfig { .. })),
                "{:?} should be rejected",
                config.strategy
            );
        }
    }

    #[test]
    fn test_unused_bounds_are_ignored() {
        // beam width only matters to beam search
        assert!(SolverConfig::new(Strategy::Bfs)
            .with_beam_width(0)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_solver_names_match_strategy() {
        for strategy in Strategy::ALL {
            assert_eq!(SolverConfig::new(strategy).solver().name(), strategy.name());
        }
    }
}
