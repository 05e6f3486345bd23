//! Distance estimates from a configuration to the goal.

use rustc_hash::FxHashSet;

use crate::board::{Configuration, SearchContext, EMPTY};
use crate::geometry::Cell;

/// Default cost added per piece standing between the goal and the target.
pub const DEFAULT_BLOCKER_WEIGHT: u32 = 2;

/// Selectable estimate used by the informed strategies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Heuristic {
    /// Manhattan distance from the goal anchor to the target. Admissible
    /// and consistent: A* with it returns shortest solutions.
    #[default]
    Manhattan,
    /// Manhattan distance plus `weight` per other piece sitting on the
    /// goal's straight-line route to the target.
    ///
    /// Not admissible: a blocker can often step aside in fewer moves than
    /// its penalty, so A* with this estimate may return longer solutions
    /// in exchange for expanding fewer nodes.
    BlockerPenalty { weight: u32 },
}

impl Heuristic {
    pub const fn blocker() -> Self {
        Heuristic::BlockerPenalty {
            weight: DEFAULT_BLOCKER_WEIGHT,
        }
    }

    /// Whether A* is guaranteed optimal with this estimate.
    pub fn is_admissible(&self) -> bool {
        match self {
            Heuristic::Manhattan => true,
            Heuristic::BlockerPenalty { weight } => *weight == 0,
        }
    }

    pub fn estimate(&self, ctx: &SearchContext, config: &Configuration) -> u32 {
        let anchor = config.origins()[ctx.goal()];
        let distance = anchor.manhattan(ctx.target());
        match *self {
            Heuristic::Manhattan => distance,
            Heuristic::BlockerPenalty { weight } => {
                distance + weight * blockers(ctx, config, anchor) as u32
            }
        }
    }
}

/// Counts distinct non-goal pieces on the L-shaped route from `anchor` to
/// the target: along the anchor's row to the target column, then down or up
/// that column to the target row. The anchor cell itself is skipped.
fn blockers(ctx: &SearchContext, config: &Configuration, anchor: Cell) -> usize {
    let target = ctx.target();
    let cols = ctx.cols() as usize;
    let goal = ctx.goal() as u8;

    let across = span(anchor.col, target.col).map(|col| Cell::new(anchor.row, col));
    let along = span(anchor.row, target.row).map(|row| Cell::new(row, target.col));

    let mut seen = FxHashSet::default();
    for cell in across.chain(along) {
        if cell == anchor {
            continue;
        }
        let occupant = config.occupancy()[cell.row as usize * cols + cell.col as usize];
        if occupant != EMPTY && occupant != goal {
            seen.insert(occupant);
        }
    }
    seen.len()
}

/// Inclusive range between two coordinates in either order.
fn span(from: u8, to: u8) -> std::ops::RangeInclusive<u8> {
    from.min(to)..=from.max(to)
}
