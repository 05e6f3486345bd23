//! State keys and text rendering of the occupancy grid.
//!
//! The state key is a fixed-width encoding of a configuration's occupancy,
//! one byte per cell, row-major. `0` marks an empty cell; every other value
//! is the label of the piece covering the cell. Keys are exact: two
//! configurations share a key iff their labelled grids are equal cell for
//! cell, so every visited set and best-cost table in the crate can trust
//! key equality.

use crate::board::{Configuration, SearchContext, EMPTY};
use crate::pieces::{Piece, PieceKind};

/// How piece indices map onto key labels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum KeyScheme {
    /// Pieces with the same footprint, kind, and mobility share a label, so
    /// boards that differ only by swapping two identical pieces collapse to
    /// one key. Still exact with respect to the layout: a region covered by
    /// translated copies of a single rectangle has exactly one tiling.
    #[default]
    Interchangeable,
    /// Every piece index gets its own label.
    Labeled,
}

impl KeyScheme {
    /// Label per piece index. Labels start at 1; 0 is reserved for empty.
    pub fn labels(self, pieces: &[Piece]) -> Vec<u8> {
        match self {
            KeyScheme::Labeled => (0..pieces.len()).map(|index| index as u8 + 1).collect(),
            KeyScheme::Interchangeable => {
                let mut classes: Vec<(PieceKind, u8, u8)> = Vec::new();
                pieces
                    .iter()
                    .map(|piece| {
                        let class = piece.class();
                        let id = match classes.iter().position(|&known| known == class) {
                            Some(id) => id,
                            None => {
                                classes.push(class);
                                classes.len() - 1
                            }
                        };
                        id as u8 + 1
                    })
                    .collect()
            }
        }
    }
}

/// Canonical fixed-width key of one configuration.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey(Box<[u8]>);

impl StateKey {
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl SearchContext {
    /// Computes the state key of `config` under this context's key scheme.
    #[inline]
    pub fn key(&self, config: &Configuration) -> StateKey {
        let bytes: Box<[u8]> = config
            .occupancy()
            .iter()
            .map(|&occupant| {
                if occupant == EMPTY {
                    0
                } else {
                    self.labels[occupant as usize]
                }
            })
            .collect();
        assert_eq!(bytes.len(), self.rows() as usize * self.cols() as usize);
        StateKey(bytes)
    }

    /// Renders `config` in the same character grid as [`format_board`].
    pub fn format(&self, config: &Configuration) -> String {
        let pieces: Vec<Piece> = self
            .pieces()
            .iter()
            .zip(config.origins())
            .map(|(piece, &origin)| Piece { origin, ..*piece })
            .collect();
        format_board(self.rows(), self.cols(), &pieces)
    }
}

/// Display character for each piece index.
///
/// The goal shows as `G`, obstacles as `#`, and movable pieces take letters
/// `A`, `B`, ... in index order, skipping `G`.
pub fn piece_symbols(pieces: &[Piece]) -> Vec<char> {
    const SYMBOLS: &[u8] = b"ABCDEFHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

    let mut next = 0;
    pieces
        .iter()
        .map(|piece| match piece.kind {
            PieceKind::Goal => 'G',
            PieceKind::Obstacle => '#',
            PieceKind::Block => {
                let symbol = SYMBOLS.get(next).map_or('?', |&b| char::from(b));
                next += 1;
                symbol
            }
        })
        .collect()
}

/// Formats pieces at their current anchors as a character grid, one line per
/// row. Empty cells show as `.`.
pub fn format_board(rows: u8, cols: u8, pieces: &[Piece]) -> String {
    let symbols = piece_symbols(pieces);
    let mut grid = vec!['.'; rows as usize * cols as usize];

    for (piece, &symbol) in pieces.iter().zip(&symbols) {
        for cell in piece.cells_at(piece.origin) {
            grid[cell.row as usize * cols as usize + cell.col as usize] = symbol;
        }
    }

    let mut output = String::with_capacity(grid.len() + rows as usize);
    for row in grid.chunks(cols as usize) {
        output.extend(row);
        output.push('\n');
    }
    output
}
