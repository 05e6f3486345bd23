//! Caller-supplied puzzle layouts and their validation.
//!
//! A [`Layout`] is the only input the engine takes from its environment:
//! board dimensions, the piece list, which piece is the goal, and the
//! target cell for the goal's anchor. Every layout is validated on
//! construction, so searches never discover a malformed board mid-run.
//!
//! Text format for [`Layout::parse`], one character per cell:
//! - `.` empty
//! - `#` a 1x1 immovable obstacle
//! - `G` the goal piece
//! - any other letter or digit labels one movable piece; all cells with the
//!   same label must form a filled rectangle
//!
//! Leading and trailing whitespace on each line is ignored, as are blank
//! lines, so layouts can be written as indented string literals.

use std::collections::BTreeMap;

use crate::error::{LayoutError, LayoutResult};
use crate::geometry::Cell;
use crate::pieces::{Piece, PieceKind};

/// Largest supported board side.
pub const MAX_SIDE: usize = 32;

/// Largest supported piece count; labels must fit in one byte next to the
/// empty marker.
pub const MAX_PIECES: usize = u8::MAX as usize - 1;

/// A validated puzzle: dimensions, pieces, goal piece, and target cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    rows: u8,
    cols: u8,
    pieces: Vec<Piece>,
    goal: usize,
    target: Cell,
}

impl Layout {
    /// Builds a layout, rejecting overlapping or out-of-bounds pieces and a
    /// missing or unreachable goal.
    pub fn new(
        rows: usize,
        cols: usize,
        pieces: Vec<Piece>,
        goal: usize,
        target: Cell,
    ) -> LayoutResult<Self> {
        if rows == 0 || cols == 0 || rows > MAX_SIDE || cols > MAX_SIDE {
            return Err(LayoutError::BoardSize {
                rows,
                cols,
                max: MAX_SIDE,
            });
        }
        if pieces.len() > MAX_PIECES {
            return Err(LayoutError::TooManyPieces {
                count: pieces.len(),
                max: MAX_PIECES,
            });
        }
        let (rows, cols) = (rows as u8, cols as u8);

        let mut owner: Vec<Option<usize>> = vec![None; rows as usize * cols as usize];
        for (index, piece) in pieces.iter().enumerate() {
            if piece.width == 0 || piece.height == 0 {
                return Err(LayoutError::EmptyPiece {
                    piece: index,
                    width: piece.width,
                    height: piece.height,
                });
            }
            if !piece.fits_at(piece.origin, rows, cols) {
                return Err(LayoutError::OutOfBounds {
                    piece: index,
                    origin: piece.origin,
                });
            }
            for cell in piece.cells_at(piece.origin) {
                let slot = &mut owner[cell.row as usize * cols as usize + cell.col as usize];
                if let Some(first) = *slot {
                    return Err(LayoutError::Overlap {
                        first,
                        second: index,
                        cell,
                    });
                }
                *slot = Some(index);
            }
        }

        match pieces.get(goal) {
            Some(piece) if piece.kind == PieceKind::Goal => {
                if !piece.fits_at(target, rows, cols) {
                    return Err(LayoutError::TargetOutOfBounds {
                        target,
                        width: piece.width,
                        height: piece.height,
                    });
                }
            }
            _ => {
                return Err(LayoutError::MissingGoal {
                    goal,
                    count: pieces.len(),
                })
            }
        }
        if let Some(piece) = pieces
            .iter()
            .enumerate()
            .position(|(index, piece)| index != goal && piece.kind == PieceKind::Goal)
        {
            return Err(LayoutError::DuplicateGoal { piece, goal });
        }

        Ok(Self {
            rows,
            cols,
            pieces,
            goal,
            target,
        })
    }

    /// Parses the text format described in the module docs.
    ///
    /// Pieces are numbered in row-major order of their top-left cell.
    pub fn parse(text: &str, target: Cell) -> LayoutResult<Self> {
        let lines: Vec<Vec<char>> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.chars().collect())
            .collect();

        let rows = lines.len();
        let cols = lines.first().map_or(0, Vec::len);
        if rows == 0 || cols == 0 || rows > MAX_SIDE || cols > MAX_SIDE {
            return Err(LayoutError::BoardSize {
                rows,
                cols,
                max: MAX_SIDE,
            });
        }

        // label -> (first cell in scan order, cells)
        let mut labelled: BTreeMap<char, (usize, Vec<Cell>)> = BTreeMap::new();
        let mut obstacles: Vec<(usize, Cell)> = Vec::new();

        for (row, line) in lines.iter().enumerate() {
            if line.len() != cols {
                return Err(LayoutError::RaggedRow {
                    row,
                    found: line.len(),
                    expected: cols,
                });
            }
            for (col, &ch) in line.iter().enumerate() {
                let cell = Cell::new(row as u8, col as u8);
                let scan = row * cols + col;
                match ch {
                    '.' => {}
                    '#' => obstacles.push((scan, cell)),
                    c if c.is_ascii_alphanumeric() => {
                        labelled.entry(c).or_insert_with(|| (scan, Vec::new())).1.push(cell);
                    }
                    other => return Err(LayoutError::UnknownCell { found: other, cell }),
                }
            }
        }

        if !labelled.contains_key(&'G') {
            return Err(LayoutError::NoGoalLabel);
        }

        let mut placed: Vec<(usize, char, Piece)> = Vec::with_capacity(labelled.len());
        for (label, (scan, cells)) in labelled {
            let piece = rectangle(label, &cells)?;
            placed.push((scan, label, piece));
        }
        placed.extend(
            obstacles
                .into_iter()
                .map(|(scan, cell)| (scan, '#', Piece::obstacle(cell.row, cell.col, 1, 1))),
        );
        placed.sort_by_key(|&(scan, _, _)| scan);

        let goal = placed
            .iter()
            .position(|&(_, label, _)| label == 'G')
            .ok_or(LayoutError::NoGoalLabel)?;
        let pieces = placed.into_iter().map(|(_, _, piece)| piece).collect();

        Self::new(rows, cols, pieces, goal, target)
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
}

/// Turns the cells of one label into a piece, checking they fill their
/// bounding box exactly.
fn rectangle(label: char, cells: &[Cell]) -> LayoutResult<Piece> {
    let min_row = cells.iter().map(|c| c.row).min().unwrap_or(0);
    let max_row = cells.iter().map(|c| c.row).max().unwrap_or(0);
    let min_col = cells.iter().map(|c| c.col).min().unwrap_or(0);
    let max_col = cells.iter().map(|c| c.col).max().unwrap_or(0);
    let height = max_row - min_row + 1;
    let width = max_col - min_col + 1;

    // cells are distinct, so a matching count means the box is full
    if cells.len() != width as usize * height as usize {
        return Err(LayoutError::NotRectangular { label });
    }

    let kind = if label == 'G' {
        PieceKind::Goal
    } else {
        PieceKind::Block
    };
    Ok(Piece::new(kind, Cell::new(min_row, min_col), width, height))
}
