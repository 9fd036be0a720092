#![forbid(unsafe_code)]

//! Nearest-edge snapping for entrance markers.
//!
//! Entrances are openings in the building perimeter, so a dragged entrance
//! never rests mid-grid: the pointer cell is attached to the closest edge
//! and projected onto it.

use serde::{Deserialize, Serialize};

use crate::entity::{Entrance, Side};
use crate::geometry::{CellPoint, GridSpec, clamp_axis};

/// A legal entrance position: a side plus a segment along it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeAnchor {
    pub side: Side,
    pub offset: u16,
    pub span: u16,
}

impl EdgeAnchor {
    #[must_use]
    pub const fn new(side: Side, offset: u16, span: u16) -> Self {
        Self { side, offset, span }
    }

    /// Anchor currently held by an entrance.
    #[must_use]
    pub fn of(entrance: &Entrance) -> Self {
        Self::new(entrance.side, entrance.offset, entrance.span)
    }

    /// Write this anchor into an entrance.
    pub fn apply_to(self, entrance: &mut Entrance) {
        entrance.side = self.side;
        entrance.offset = self.offset;
        entrance.span = self.span;
    }
}

/// Distance from a cell to each edge, in [`Side::ALL`] order.
///
/// Values can be negative for cells outside the grid.
#[must_use]
pub fn edge_distances(grid: GridSpec, cell: CellPoint) -> [(Side, i32); 4] {
    let last_col = i32::from(grid.columns) - 1;
    let last_row = i32::from(grid.rows) - 1;
    [
        (Side::Top, cell.y),
        (Side::Bottom, last_row.saturating_sub(cell.y)),
        (Side::Left, cell.x),
        (Side::Right, last_col.saturating_sub(cell.x)),
    ]
}

/// Side closest to `cell`; ties go to the earlier side in top, bottom,
/// left, right order.
#[must_use]
pub fn nearest_side(grid: GridSpec, cell: CellPoint) -> Side {
    let mut best = (Side::Top, i32::MAX);
    for (side, distance) in edge_distances(grid, cell) {
        if distance < best.1 {
            best = (side, distance);
        }
    }
    best.0
}

/// Snap a raw pointer cell to the nearest edge.
///
/// On top/bottom the offset is `clamp(x, 0, columns - span)`; on left/right
/// it is `clamp(y, 0, rows - span)`. A span longer than the chosen edge is
/// shortened to the edge length.
#[must_use]
pub fn snap_to_edge(grid: GridSpec, cell: CellPoint, span: u16) -> EdgeAnchor {
    let side = nearest_side(grid, cell);
    let along = if side.is_horizontal() { cell.x } else { cell.y };
    project(grid, side, along, span)
}

/// Re-project an anchor onto its own side.
///
/// Legal anchors come back unchanged; out-of-range ones are clamped.
#[must_use]
pub fn project_onto_side(grid: GridSpec, anchor: EdgeAnchor) -> EdgeAnchor {
    project(grid, anchor.side, i32::from(anchor.offset), anchor.span)
}

fn project(grid: GridSpec, side: Side, along: i32, span: u16) -> EdgeAnchor {
    let edge = grid.edge_length(side).max(1);
    let span = span.clamp(1, edge);
    EdgeAnchor {
        side,
        offset: clamp_axis(along, edge - span),
        span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(columns: u16, rows: u16) -> GridSpec {
        GridSpec::new(columns, rows).expect("test grid in range")
    }

    #[test]
    fn extreme_cells_snap_without_overflow() {
        let g = grid(12, 8);
        assert_eq!(
            snap_to_edge(g, CellPoint::new(i32::MIN, 2), 2),
            EdgeAnchor::new(Side::Left, 2, 2)
        );
        assert_eq!(
            snap_to_edge(g, CellPoint::new(3, i32::MIN), 2),
            EdgeAnchor::new(Side::Top, 3, 2)
        );
        assert_eq!(
            snap_to_edge(g, CellPoint::new(i32::MIN, i32::MIN), 1),
            EdgeAnchor::new(Side::Top, 0, 1)
        );
    }

    #[test]
    fn snaps_to_top_when_on_first_row() {
        let anchor = snap_to_edge(grid(12, 8), CellPoint::new(3, 0), 1);
        assert_eq!(anchor, EdgeAnchor::new(Side::Top, 3, 1));
    }

    #[test]
    fn picks_closest_edge() {
        let g = grid(12, 8);
        assert_eq!(nearest_side(g, CellPoint::new(5, 6)), Side::Bottom);
        assert_eq!(nearest_side(g, CellPoint::new(1, 4)), Side::Left);
        assert_eq!(nearest_side(g, CellPoint::new(10, 4)), Side::Right);
        assert_eq!(nearest_side(g, CellPoint::new(5, -4)), Side::Top);
        assert_eq!(nearest_side(g, CellPoint::new(40, 3)), Side::Right);
    }

    #[test]
    fn ties_follow_priority() {
        let g = grid(12, 8);
        // Corner: top and left both zero.
        assert_eq!(nearest_side(g, CellPoint::new(0, 0)), Side::Top);
        // Bottom-right corner: bottom and right both zero.
        assert_eq!(nearest_side(g, CellPoint::new(11, 7)), Side::Bottom);
        assert_eq!(nearest_side(g, CellPoint::new(2, 2)), Side::Top);
        assert_eq!(nearest_side(g, CellPoint::new(2, 5)), Side::Bottom);
    }

    #[test]
    fn projection_clamps_offset_by_span() {
        let g = grid(12, 8);
        assert_eq!(
            snap_to_edge(g, CellPoint::new(11, 0), 3),
            EdgeAnchor::new(Side::Top, 9, 3)
        );
        assert_eq!(
            snap_to_edge(g, CellPoint::new(0, 7), 2),
            EdgeAnchor::new(Side::Bottom, 0, 2)
        );
        assert_eq!(
            snap_to_edge(g, CellPoint::new(11, 7), 2),
            EdgeAnchor::new(Side::Bottom, 10, 2)
        );
        assert_eq!(
            snap_to_edge(g, CellPoint::new(-3, 6), 4),
            EdgeAnchor::new(Side::Left, 4, 4)
        );
    }

    #[test]
    fn oversized_span_shrinks_to_edge() {
        let g = grid(12, 4);
        assert_eq!(
            snap_to_edge(g, CellPoint::new(0, 2), 10),
            EdgeAnchor::new(Side::Left, 0, 4)
        );
    }

    #[test]
    fn projecting_legal_anchor_is_identity() {
        let g = grid(12, 8);
        for anchor in [
            EdgeAnchor::new(Side::Top, 0, 2),
            EdgeAnchor::new(Side::Left, 0, 8),
            EdgeAnchor::new(Side::Right, 6, 2),
            EdgeAnchor::new(Side::Bottom, 11, 1),
        ] {
            assert_eq!(project_onto_side(g, anchor), anchor);
        }
    }
}
