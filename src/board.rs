//! Board model: the immutable search context, configurations, and moves.
//!
//! A [`SearchContext`] is built once per search from a validated
//! [`Layout`] and holds everything that never changes while searching:
//! dimensions, footprints, the goal piece, the target, and the key labels.
//! A [`Configuration`] is a value type holding one arrangement of pieces and
//! its occupancy grid; moves produce new configurations and never mutate.

use std::fmt;

use crate::geometry::{Cell, Direction};
use crate::grid::KeyScheme;
use crate::layout::Layout;
use crate::pieces::Piece;

/// Occupancy marker for a cell no piece covers.
pub const EMPTY: u8 = u8::MAX;

/// One single-cell slide of one piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Move {
    pub piece: usize,
    pub direction: Direction,
}

impl Move {
    pub const fn new(piece: usize, direction: Direction) -> Self {
        Self { piece, direction }
    }

    /// The move that undoes this one.
    #[inline]
    pub const fn inverse(self) -> Move {
        Move::new(self.piece, self.direction.inverse())
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.piece, self.direction)
    }
}

/// Immutable per-search record shared by every strategy.
///
/// Replaces any notion of global solver state: two searches over different
/// layouts (or the same layout) can run side by side on separate contexts.
#[derive(Clone, Debug)]
pub struct SearchContext {
    rows: u8,
    cols: u8,
    pieces: Vec<Piece>,
    goal: usize,
    target: Cell,
    /// Key label per piece index, see [`KeyScheme`].
    pub(crate) labels: Vec<u8>,
}

impl SearchContext {
    pub fn new(layout: &Layout, scheme: KeyScheme) -> Self {
        let pieces = layout.pieces().to_vec();
        let labels = scheme.labels(&pieces);
        Self {
            rows: layout.rows(),
            cols: layout.cols(),
            pieces,
            goal: layout.goal(),
            target: layout.target(),
            labels,
        }
    }

    #[inline]
    pub fn rows(&self) -> u8 {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> u8 {
        self.cols
    }

    #[inline]
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    #[inline]
    pub fn goal(&self) -> usize {
        self.goal
    }

    #[inline]
    pub fn target(&self) -> Cell {
        self.target
    }

    #[inline]
    fn cell_index(&self, cell: Cell) -> usize {
        cell.row as usize * self.cols as usize + cell.col as usize
    }

    /// The configuration the layout starts in.
    pub fn initial(&self) -> Configuration {
        let origins: Vec<Cell> = self.pieces.iter().map(|piece| piece.origin).collect();
        self.arrange(origins)
            .expect("validated layouts never overlap")
    }

    /// Builds a configuration from explicit anchors, or `None` if a piece
    /// would leave the board or two pieces would overlap.
    pub fn arrange(&self, origins: Vec<Cell>) -> Option<Configuration> {
        if origins.len() != self.pieces.len() {
            return None;
        }
        let mut occupancy = vec![EMPTY; self.rows as usize * self.cols as usize];
        for (index, (piece, &origin)) in self.pieces.iter().zip(&origins).enumerate() {
            if !piece.fits_at(origin, self.rows, self.cols) {
                return None;
            }
            for cell in piece.cells_at(origin) {
                let slot = &mut occupancy[self.cell_index(cell)];
                if *slot != EMPTY {
                    return None;
                }
                *slot = index as u8;
            }
        }
        Some(Configuration {
            origins: origins.into_boxed_slice(),
            occupancy: occupancy.into_boxed_slice(),
        })
    }

    /// True iff sliding `piece` one cell in `direction` stays on the board
    /// and only enters cells that are empty or already its own.
    pub fn is_legal_move(&self, config: &Configuration, mv: Move) -> bool {
        let Some(piece) = self.pieces.get(mv.piece) else {
            return false;
        };
        if piece.is_fixed() {
            return false;
        }
        let Some(origin) = config.origins[mv.piece].step(mv.direction, self.rows, self.cols)
        else {
            return false;
        };
        if !piece.fits_at(origin, self.rows, self.cols) {
            return false;
        }
        let own = mv.piece as u8;
        piece.cells_at(origin).all(|cell| {
            let occupant = config.occupancy[self.cell_index(cell)];
            occupant == EMPTY || occupant == own
        })
    }

    /// Returns the configuration after `mv`.
    ///
    /// # Panics
    ///
    /// Panics if the move is not legal; strategies must check first.
    pub fn apply_move(&self, config: &Configuration, mv: Move) -> Configuration {
        assert!(
            self.is_legal_move(config, mv),
            "illegal move {mv} applied to configuration"
        );
        let piece = &self.pieces[mv.piece];
        let from = config.origins[mv.piece];
        let (d_row, d_col) = mv.direction.offset();
        let to = Cell::new(
            (from.row as i16 + d_row as i16) as u8,
            (from.col as i16 + d_col as i16) as u8,
        );

        let mut next = config.clone();
        for cell in piece.cells_at(from) {
            next.occupancy[self.cell_index(cell)] = EMPTY;
        }
        for cell in piece.cells_at(to) {
            next.occupancy[self.cell_index(cell)] = mv.piece as u8;
        }
        next.origins[mv.piece] = to;
        next
    }

    /// True iff the goal piece's anchor sits on the target cell.
    #[inline]
    pub fn is_goal(&self, config: &Configuration) -> bool {
        config.origins[self.goal] == self.target
    }

    /// Legal moves from `config`, piece by piece in [`Direction::ALL`] order.
    pub fn legal_moves<'a>(&'a self, config: &'a Configuration) -> impl Iterator<Item = Move> + 'a {
        (0..self.pieces.len())
            .filter(move |&piece| !self.pieces[piece].is_fixed())
            .flat_map(|piece| Direction::ALL.into_iter().map(move |d| Move::new(piece, d)))
            .filter(move |&mv| self.is_legal_move(config, mv))
    }

    /// Every legal move from `config` paired with the configuration it yields.
    pub fn successors<'a>(
        &'a self,
        config: &'a Configuration,
    ) -> impl Iterator<Item = (Move, Configuration)> + 'a {
        self.legal_moves(config)
            .map(move |mv| (mv, self.apply_move(config, mv)))
    }
}

/// One arrangement of every piece plus the derived occupancy grid.
///
/// Equality is occupancy equality: two configurations are the same board
/// when every cell holds the same piece index.
#[derive(Clone, Debug)]
pub struct Configuration {
    origins: Box<[Cell]>,
    occupancy: Box<[u8]>,
}

impl Configuration {
    /// Top-left anchor of every piece, by piece index.
    #[inline]
    pub fn origins(&self) -> &[Cell] {
        &self.origins
    }

    /// Row-major occupancy: piece index per cell, [`EMPTY`] for free cells.
    #[inline]
    pub fn occupancy(&self) -> &[u8] {
        &self.occupancy
    }
}

impl PartialEq for Configuration {
    fn eq(&self, other: &Self) -> bool {
        self.occupancy == other.occupancy
    }
}

impl Eq for Configuration {}
