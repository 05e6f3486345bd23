//! Klotski Solver
//!
//! Solves sliding-block puzzles where a goal piece must reach an exit cell.
//! Layouts come from the built-in levels or from text files; any of the five
//! search strategies can be selected, and the winning move list can be
//! replayed step by step.

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use klotski::config::{DEFAULT_BEAM_WIDTH, DEFAULT_MAX_DEPTH};
use klotski::geometry::Cell;
use klotski::grid::format_board;
use klotski::pieces::{self, LEVELS};
use klotski::{
    Heuristic, Layout, LayoutError, LiveBoard, SearchOutcome, SolveError, SolverConfig, Strategy,
};

/// Solves Klotski-style sliding-block puzzles.
#[derive(Parser)]
#[command(name = "klotski")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Solve a layout and print the moves.
    Solve(SolveArgs),
    /// List the built-in levels.
    Levels,
    /// Render a layout without solving it.
    Show(Source),
}

/// Where the layout comes from.
#[derive(Args, Default)]
struct Source {
    /// Built-in level name (see `klotski levels`).
    #[arg(long, conflicts_with = "file")]
    level: Option<String>,
    /// Text layout file: `.` empty, `#` obstacle, `G` goal, other letters pieces.
    #[arg(long, requires = "target")]
    file: Option<PathBuf>,
    /// Target cell for the goal piece's top-left corner, as ROW,COL.
    #[arg(long, value_parser = parse_cell)]
    target: Option<Cell>,
}

#[derive(Args)]
struct SolveArgs {
    #[command(flatten)]
    source: Source,
    #[arg(long, value_enum, default_value_t = Strategy::Astar)]
    strategy: Strategy,
    #[arg(long, value_enum, default_value_t = HeuristicArg::Manhattan)]
    heuristic: HeuristicArg,
    /// Nodes kept per layer by beam search.
    #[arg(long, default_value_t = DEFAULT_BEAM_WIDTH)]
    beam_width: usize,
    /// Layers beam search expands before giving up.
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: u32,
    /// Worker threads for the parallel strategy (default: one per core).
    #[arg(long)]
    workers: Option<usize>,
    /// Wall-clock limit for the search, in milliseconds.
    #[arg(long)]
    time_limit_ms: Option<u64>,
    /// Extra beam passes ranked by distance labels.
    #[arg(long, default_value_t = 0)]
    refine: usize,
    /// Render the board after every move.
    #[arg(long)]
    show_steps: bool,
}

impl Default for SolveArgs {
    fn default() -> Self {
        Self {
            source: Source::default(),
            strategy: Strategy::Astar,
            heuristic: HeuristicArg::Manhattan,
            beam_width: DEFAULT_BEAM_WIDTH,
            max_depth: DEFAULT_MAX_DEPTH,
            workers: None,
            time_limit_ms: None,
            refine: 0,
            show_steps: false,
        }
    }
}

impl SolveArgs {
    fn config(&self) -> SolverConfig {
        let mut config = SolverConfig::new(self.strategy)
            .with_heuristic(self.heuristic.into())
            .with_beam_width(self.beam_width)
            .with_max_depth(self.max_depth)
            .with_refine_passes(self.refine);
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        if let Some(ms) = self.time_limit_ms {
            config = config.with_time_limit(Duration::from_millis(ms));
        }
        config
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum HeuristicArg {
    /// Manhattan distance to the exit (shortest solutions with A*).
    Manhattan,
    /// Manhattan distance plus a penalty per blocking piece (faster, not optimal).
    Blocker,
}

impl From<HeuristicArg> for Heuristic {
    fn from(arg: HeuristicArg) -> Self {
        match arg {
            HeuristicArg::Manhattan => Heuristic::Manhattan,
            HeuristicArg::Blocker => Heuristic::blocker(),
        }
    }
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Solve(#[from] SolveError),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn parse_cell(text: &str) -> Result<Cell, String> {
    let (row, col) = text
        .split_once(',')
        .ok_or_else(|| format!("expected ROW,COL, got '{text}'"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<u8>()
            .map_err(|e| format!("invalid coordinate '{part}': {e}"))
    };
    Ok(Cell::new(parse(row)?, parse(col)?))
}

impl Source {
    /// Display name and validated layout.
    fn load(&self) -> Result<(String, Layout), CliError> {
        match (&self.file, self.target) {
            (Some(path), Some(target)) => {
                let text = fs::read_to_string(path).map_err(|source| CliError::Read {
                    path: path.clone(),
                    source,
                })?;
                Ok((path.display().to_string(), Layout::parse(&text, target)?))
            }
            _ => {
                let level = pieces::level(self.level.as_deref().unwrap_or(pieces::CLASSIC.name))?;
                Ok((level.name.to_string(), level.layout()?))
            }
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("klotski=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Some(Command::Solve(args)) => run_solve(&args),
        Some(Command::Levels) => {
            print!("{}", render_levels());
            Ok(())
        }
        Some(Command::Show(source)) => run_show(&source),
        // default: classic level with A*
        None => run_solve(&SolveArgs::default()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Solves the selected layout and prints the outcome.
fn run_solve(args: &SolveArgs) -> Result<(), CliError> {
    let (name, layout) = args.source.load()?;
    let config = args.config();
    println!("{name} ({})", config.strategy.name());
    print!("{}", render_layout(&layout));
    println!();

    let outcome = klotski::solve(&layout, &config)?;
    print!("{}", render_outcome(&layout, &outcome, args.show_steps));
    println!(
        "Expanded {} nodes, generated {}, peak frontier {}, {:.1?}",
        outcome.stats.nodes_expanded,
        outcome.stats.nodes_generated,
        outcome.stats.max_frontier,
        outcome.stats.elapsed
    );
    Ok(())
}

fn run_show(source: &Source) -> Result<(), CliError> {
    let (name, layout) = source.load()?;
    println!("{name}: target {}", layout.target());
    print!("{}", render_layout(&layout));
    Ok(())
}

fn render_layout(layout: &Layout) -> String {
    format_board(layout.rows(), layout.cols(), layout.pieces())
}

/// One line per built-in level: name, size, description.
fn render_levels() -> String {
    let mut output = String::new();
    for level in LEVELS {
        let size = match level.layout() {
            Ok(layout) => format!("{}x{}", layout.rows(), layout.cols()),
            Err(_) => "?".to_string(),
        };
        let _ = writeln!(output, "{:<10}{:<6}{}", level.name, size, level.description);
    }
    output
}

/// The move list, optionally with the board after every move.
fn render_outcome(layout: &Layout, outcome: &SearchOutcome, show_steps: bool) -> String {
    let mut output = String::new();
    if !outcome.is_solved() {
        let _ = writeln!(output, "No solution ({})", outcome.status);
        return output;
    }

    let _ = writeln!(output, "Solved in {} moves", outcome.moves.len());
    let mut board = LiveBoard::new(layout);
    for (i, &mv) in outcome.moves.iter().enumerate() {
        let _ = writeln!(output, "{:>3}. {}", i + 1, mv);
        if show_steps {
            if let Err(e) = board.apply(mv) {
                let _ = writeln!(output, "     replay failed: {e}");
                break;
            }
            output.push_str(&board.format());
            output.push('\n');
        }
    }
    output
}
