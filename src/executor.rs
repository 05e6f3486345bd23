//! A mutable board for replaying moves one at a time.
//!
//! [`LiveBoard`] keeps its own piece list and checks each move by rectangle
//! intersection against every other piece, independently of the occupancy
//! grids the search uses. That makes it a useful second opinion on any move
//! list a strategy returns.

use crate::board::Move;
use crate::error::ReplayError;
use crate::geometry::Cell;
use crate::grid::format_board;
use crate::layout::Layout;
use crate::pieces::Piece;

#[derive(Clone, Debug)]
pub struct LiveBoard {
    rows: u8,
    cols: u8,
    pieces: Vec<Piece>,
    goal: usize,
    target: Cell,
    history: Vec<Move>,
}

impl LiveBoard {
    pub fn new(layout: &Layout) -> Self {
        Self {
            rows: layout.rows(),
            cols: layout.cols(),
            pieces: layout.pieces().to_vec(),
            goal: layout.goal(),
            target: layout.target(),
            history: Vec::new(),
        }
    }

    /// Applies `moves` in order to a fresh board and checks the goal piece
    /// ends on its target.
    pub fn replay(layout: &Layout, moves: &[Move]) -> Result<Self, ReplayError> {
        let mut board = Self::new(layout);
        for &mv in moves {
            board.apply(mv)?;
        }
        if board.is_won() {
            Ok(board)
        } else {
            Err(ReplayError::GoalNotReached { moves: moves.len() })
        }
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Moves applied and not undone.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    pub fn move_count(&self) -> usize {
        self.history.len()
    }

    pub fn is_won(&self) -> bool {
        self.pieces[self.goal].origin == self.target
    }

    /// Anchor `mv` would move its piece to, if that stays on the board and
    /// clears every other piece.
    fn destination(&self, mv: Move) -> Option<Cell> {
        let piece = self.pieces.get(mv.piece)?;
        if piece.is_fixed() {
            return None;
        }
        let origin = piece.origin.step(mv.direction, self.rows, self.cols)?;
        if !piece.fits_at(origin, self.rows, self.cols) {
            return None;
        }
        let moved = Piece { origin, ..*piece };
        let blocked = self
            .pieces
            .iter()
            .enumerate()
            .any(|(index, other)| index != mv.piece && overlaps(&moved, other));
        (!blocked).then_some(origin)
    }

    pub fn can_move(&self, mv: Move) -> bool {
        self.destination(mv).is_some()
    }

    /// Slides one piece one cell, recording the move.
    pub fn apply(&mut self, mv: Move) -> Result<(), ReplayError> {
        let index = self.history.len();
        if mv.piece >= self.pieces.len() {
            return Err(ReplayError::UnknownPiece {
                index,
                piece: mv.piece,
            });
        }
        let origin = self
            .destination(mv)
            .ok_or(ReplayError::IllegalMove { index, mv })?;
        self.pieces[mv.piece].origin = origin;
        self.history.push(mv);
        Ok(())
    }

    /// Takes back the last move, returning it.
    pub fn undo(&mut self) -> Option<Move> {
        let mv = self.history.pop()?;
        let inverse = mv.inverse();
        let piece = &mut self.pieces[mv.piece];
        // the cell we came from is free: nothing else moved since
        if let Some(origin) = piece.origin.step(inverse.direction, self.rows, self.cols) {
            piece.origin = origin;
        }
        Some(mv)
    }

    /// Renders the board in the same character grid as the search context.
    pub fn format(&self) -> String {
        format_board(self.rows, self.cols, &self.pieces)
    }
}

/// Axis-aligned rectangle intersection of two piece footprints.
fn overlaps(a: &Piece, b: &Piece) -> bool {
    let (a_top, a_left) = (a.origin.row, a.origin.col);
    let (b_top, b_left) = (b.origin.row, b.origin.col);
    a_left < b_left + b.width
        && b_left < a_left + a.width
        && a_top < b_top + b.height
        && b_top < a_top + a.height
}
