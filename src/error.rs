//! Error types for layout validation, solving, and move replay.
//!
//! A search that finds no solution is not an error; it is reported through
//! [`crate::Status`] on the returned outcome.

use thiserror::Error;

use crate::board::Move;
use crate::geometry::Cell;

/// Reasons a caller-supplied layout is rejected before any search starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// Board dimensions outside the supported range
    #[error("Board must be between 1x1 and {max}x{max} cells, got {rows}x{cols}")]
    BoardSize { rows: usize, cols: usize, max: usize },

    /// More pieces than the one-byte cell encoding can label
    #[error("Too many pieces: {count} (at most {max} are supported)")]
    TooManyPieces { count: usize, max: usize },

    /// A piece with zero width or height
    #[error("Piece {piece} has an empty footprint {width}x{height}")]
    EmptyPiece { piece: usize, width: u8, height: u8 },

    /// Part of a piece lies outside the board
    #[error("Piece {piece} at {origin} does not fit on the board")]
    OutOfBounds { piece: usize, origin: Cell },

    /// Two pieces claim the same cell
    #[error("Pieces {first} and {second} overlap at {cell}")]
    Overlap {
        first: usize,
        second: usize,
        cell: Cell,
    },

    /// The goal index does not name a goal piece
    #[error("Goal piece {goal} is missing (layout has {count} pieces)")]
    MissingGoal { goal: usize, count: usize },

    /// A piece other than the designated goal is tagged as a goal
    #[error("Piece {piece} is tagged as a goal but the goal piece is {goal}")]
    DuplicateGoal { piece: usize, goal: usize },

    /// The target anchor would put the goal footprint off the board
    #[error("Target {target} cannot hold the {width}x{height} goal piece")]
    TargetOutOfBounds { target: Cell, width: u8, height: u8 },

    /// Text layout rows have different lengths
    #[error("Row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },

    /// A piece label in a text layout does not form a filled rectangle
    #[error("Cells labelled '{label}' do not form a filled rectangle")]
    NotRectangular { label: char },

    /// A character that is neither empty, obstacle, nor a piece label
    #[error("Unexpected character '{found}' at {cell}")]
    UnknownCell { found: char, cell: Cell },

    /// A text layout without a `G` goal piece
    #[error("Layout has no goal piece 'G'")]
    NoGoalLabel,

    /// Unknown built-in level name
    #[error("Unknown level '{0}'")]
    UnknownLevel(String),
}

/// Result type alias for layout construction
pub type LayoutResult<T> = Result<T, LayoutError>;

/// Failures of a solve call itself, as opposed to an unsolvable layout.
#[derive(Error, Debug)]
pub enum SolveError {
    /// The layout failed validation
    #[error(transparent)]
    InvalidLayout(#[from] LayoutError),

    /// A strategy parameter is out of range
    #[error("Invalid solver configuration: {message}")]
    InvalidConfig { message: String },

    /// A concurrent search worker panicked; all other workers were released
    #[error("Search worker {worker} panicked")]
    WorkerPanicked { worker: usize },
}

/// Result type alias for solve calls
pub type SolveResult<T> = Result<T, SolveError>;

/// Failures while replaying moves against a live board.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    /// A move references a piece the board does not have
    #[error("Move {index} references unknown piece {piece}")]
    UnknownPiece { index: usize, piece: usize },

    /// A move is blocked, leaves the board, or moves an obstacle
    #[error("Move {index} ({mv}) is not legal")]
    IllegalMove { index: usize, mv: Move },

    /// Every move applied but the goal piece is not on its target
    #[error("Replay of {moves} moves does not reach the target")]
    GoalNotReached { moves: usize },
}
