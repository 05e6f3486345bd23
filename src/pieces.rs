//! Piece definitions and the built-in levels.
//!
//! A piece is an axis-aligned rectangle anchored at its top-left cell. Only
//! the anchor ever changes; the footprint is fixed at creation.

use crate::error::{LayoutError, LayoutResult};
use crate::geometry::Cell;
use crate::layout::Layout;

/// Role of a piece on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PieceKind {
    /// The distinguished piece that must reach the target cell.
    Goal,
    /// An ordinary movable piece.
    Block,
    /// An immovable obstacle.
    Obstacle,
}

/// A rectangular piece: footprint, current anchor, and role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Piece {
    pub kind: PieceKind,
    pub width: u8,
    pub height: u8,
    pub origin: Cell,
}

impl Piece {
    pub const fn new(kind: PieceKind, origin: Cell, width: u8, height: u8) -> Self {
        Self {
            kind,
            width,
            height,
            origin,
        }
    }

    pub const fn goal(row: u8, col: u8, width: u8, height: u8) -> Self {
        Self::new(PieceKind::Goal, Cell::new(row, col), width, height)
    }

    pub const fn block(row: u8, col: u8, width: u8, height: u8) -> Self {
        Self::new(PieceKind::Block, Cell::new(row, col), width, height)
    }

    pub const fn obstacle(row: u8, col: u8, width: u8, height: u8) -> Self {
        Self::new(PieceKind::Obstacle, Cell::new(row, col), width, height)
    }

    /// Obstacles never move.
    #[inline]
    pub fn is_fixed(&self) -> bool {
        self.kind == PieceKind::Obstacle
    }

    /// Cells covered when the piece is anchored at `origin`, row-major.
    pub fn cells_at(&self, origin: Cell) -> impl Iterator<Item = Cell> + '_ {
        (0..self.height).flat_map(move |d_row| {
            (0..self.width).map(move |d_col| Cell::new(origin.row + d_row, origin.col + d_col))
        })
    }

    /// Whether the footprint anchored at `origin` lies inside a `rows x cols` board.
    pub fn fits_at(&self, origin: Cell, rows: u8, cols: u8) -> bool {
        origin.row as usize + self.height as usize <= rows as usize
            && origin.col as usize + self.width as usize <= cols as usize
    }

    /// Pieces with the same class are interchangeable for duplicate detection.
    pub fn class(&self) -> (PieceKind, u8, u8) {
        (self.kind, self.width, self.height)
    }
}

/// A named built-in puzzle.
#[derive(Clone, Copy, Debug)]
pub struct Level {
    pub name: &'static str,
    pub description: &'static str,
    /// Text layout, see [`Layout::parse`].
    pub board: &'static str,
    /// Target cell for the goal piece's anchor.
    pub target: Cell,
}

impl Level {
    /// Parses the level text into a validated layout.
    pub fn layout(&self) -> LayoutResult<Layout> {
        Layout::parse(self.board, self.target)
    }
}

/// "Heng Dao Li Ma": the classic 5x4 opening. The 2x2 goal starts top-centre
/// and must slide down to the exit at the bottom-centre.
pub const CLASSIC: Level = Level {
    name: "classic",
    description: "Heng Dao Li Ma, the classic 5x4 opening",
    board: "
        AGGB
        AGGB
        CHHD
        CIJD
        K..L
    ",
    target: Cell::new(3, 1),
};

/// A small warm-up level that solves in a handful of moves.
pub const WARMUP: Level = Level {
    name: "warmup",
    description: "3x3 board, the goal has to squeeze past two soldiers",
    board: "
        G..
        AB.
        ...
    ",
    target: Cell::new(2, 2),
};

/// A 4x4 level with a fixed obstacle in the middle of the board.
pub const PILLAR: Level = Level {
    name: "pillar",
    description: "4x4 board with a fixed pillar the goal must route around",
    board: "
        GGA.
        GG#.
        BC#D
        ....
    ",
    target: Cell::new(2, 0),
};

/// The goal is walled in by obstacles and can never move.
pub const SEALED: Level = Level {
    name: "sealed",
    description: "the goal is boxed in by obstacles, no solution exists",
    board: "
        #G#.
        ###A
        ....
    ",
    target: Cell::new(2, 0),
};

/// A level whose goal already sits on the target.
pub const SOLVED: Level = Level {
    name: "solved",
    description: "the goal already sits on the exit",
    board: "
        AB
        GG
        GG
    ",
    target: Cell::new(1, 0),
};

/// All built-in levels, in display order.
pub const LEVELS: &[Level] = &[CLASSIC, WARMUP, PILLAR, SEALED, SOLVED];

/// Looks up a built-in level by name.
pub fn level(name: &str) -> LayoutResult<&'static Level> {
    LEVELS
        .iter()
        .find(|level| level.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| LayoutError::UnknownLevel(name.to_string()))
}
