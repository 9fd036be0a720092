#![forbid(unsafe_code)]

//! Collision-free placement for newly created entities.
//!
//! Placement is a deterministic scan: the same layout always yields the same
//! spot for the same request. Collision avoidance applies only here, at
//! creation time; dragging never rejects overlap.
//!
//! When the scan finds nothing the resolver falls back to a fixed position
//! and reports [`PlacementOutcome::Fallback`]. A fallback may overlap
//! existing entities; it never blocks the add.

use serde::{Deserialize, Serialize};

use crate::config::TableLimits;
use crate::entity::Side;
use crate::geometry::{CellRect, clamp_rect};
use crate::layout::Layout;

/// Origin used for tables when no free slot exists.
pub const TABLE_FALLBACK_ORIGIN: (u16, u16) = (0, 0);

/// Anchor used for entrances when every perimeter cell is taken.
pub const ENTRANCE_FALLBACK: (Side, u16) = (Side::Top, 0);

/// Width and height of a requested table, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Footprint {
    pub width: u16,
    pub height: u16,
}

impl Footprint {
    #[must_use]
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Whether a placement came from the scan or the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementOutcome {
    Placed,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePlacement {
    pub rect: CellRect,
    pub outcome: PlacementOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrancePlacement {
    pub side: Side,
    pub offset: u16,
    pub span: u16,
    pub outcome: PlacementOutcome,
}

/// Finds free spots for new tables and entrances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionResolver {
    limits: TableLimits,
}

impl Default for CollisionResolver {
    fn default() -> Self {
        Self::new(TableLimits::default())
    }
}

impl CollisionResolver {
    #[must_use]
    pub const fn new(limits: TableLimits) -> Self {
        Self { limits }
    }

    #[must_use]
    pub const fn limits(&self) -> &TableLimits {
        &self.limits
    }

    /// Clamp a requested footprint to the table limits and the grid.
    #[must_use]
    pub fn normalize_footprint(&self, layout: &Layout, footprint: Footprint) -> Footprint {
        let max_width = self.limits.max_width.min(layout.grid.columns).max(1);
        let max_height = self.limits.max_height.min(layout.grid.rows).max(1);
        Footprint {
            width: footprint.width.clamp(1, max_width),
            height: footprint.height.clamp(1, max_height),
        }
    }

    /// Find the first free origin for a table of `footprint`.
    ///
    /// Candidates are scanned row-major starting at
    /// `(placement_margin, placement_margin)` so new tables keep clear of the
    /// perimeter (and the entrances on it). A candidate is accepted when it
    /// lies inside the grid and overlaps no existing table.
    #[must_use]
    pub fn place_table(&self, layout: &Layout, footprint: Footprint) -> TablePlacement {
        let Footprint { width, height } = self.normalize_footprint(layout, footprint);
        let grid = layout.grid;
        let margin = self.limits.placement_margin;

        // Upper bounds are inclusive; an empty range means nothing fits past the margin.
        let last_x = grid.columns.saturating_sub(width);
        let last_y = grid.rows.saturating_sub(height);
        if width <= grid.columns && height <= grid.rows {
            for y in margin..=last_y {
                for x in margin..=last_x {
                    let candidate = CellRect::new(x, y, width, height);
                    if !layout
                        .tables
                        .iter()
                        .any(|table| table.rect().overlaps(&candidate))
                    {
                        return TablePlacement {
                            rect: candidate,
                            outcome: PlacementOutcome::Placed,
                        };
                    }
                }
            }
        }

        let (fx, fy) = TABLE_FALLBACK_ORIGIN;
        let (x, y) = clamp_rect(i32::from(fx), i32::from(fy), width, height, grid);
        tracing::warn!(
            target: "floorplan.placement",
            width,
            height,
            tables = layout.tables.len(),
            x,
            y,
            "no free slot for table, using fallback origin"
        );
        TablePlacement {
            rect: CellRect::new(x, y, width, height),
            outcome: PlacementOutcome::Fallback,
        }
    }

    /// Find the first free one-cell perimeter slot for a new entrance.
    ///
    /// Sides are walked top, bottom, left, right; along each side offsets
    /// are scanned from 0. Only entrances on the same side can conflict.
    #[must_use]
    pub fn place_entrance(&self, layout: &Layout) -> EntrancePlacement {
        for side in Side::ALL {
            let edge = layout.grid.edge_length(side);
            let free = (0..edge).find(|&offset| {
                !layout
                    .entrances
                    .iter()
                    .any(|entrance| entrance.overlaps_segment(side, offset, 1))
            });
            if let Some(offset) = free {
                return EntrancePlacement {
                    side,
                    offset,
                    span: 1,
                    outcome: PlacementOutcome::Placed,
                };
            }
        }

        let (side, offset) = ENTRANCE_FALLBACK;
        tracing::warn!(
            target: "floorplan.placement",
            entrances = layout.entrances.len(),
            %side,
            offset,
            "perimeter full, using fallback entrance slot"
        );
        EntrancePlacement {
            side,
            offset,
            span: 1,
            outcome: PlacementOutcome::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entrance, Table};
    use crate::geometry::GridSpec;

    fn grid(columns: u16, rows: u16) -> GridSpec {
        GridSpec::new(columns, rows).expect("test grid in range")
    }

    #[test]
    fn first_table_lands_inside_margin() {
        let layout = Layout::empty(grid(12, 8));
        let placement = CollisionResolver::default().place_table(&layout, Footprint::new(2, 1));
        assert_eq!(placement.rect, CellRect::new(1, 1, 2, 1));
        assert_eq!(placement.outcome, PlacementOutcome::Placed);
    }

    #[test]
    fn scan_skips_occupied_cells_row_major() {
        let mut layout = Layout::empty(grid(12, 8));
        layout.tables.push(Table::new("T1", 1, 1, 2, 1));
        let placement = CollisionResolver::default().place_table(&layout, Footprint::new(2, 1));
        assert_eq!(placement.rect, CellRect::new(3, 1, 2, 1));

        layout.tables.push(Table::new("T2", 3, 1, 9, 1));
        let placement = CollisionResolver::default().place_table(&layout, Footprint::new(2, 1));
        assert_eq!(placement.rect, CellRect::new(1, 2, 2, 1));
    }

    #[test]
    fn footprint_is_clamped_to_limits() {
        let layout = Layout::empty(grid(12, 8));
        let placement = CollisionResolver::default().place_table(&layout, Footprint::new(9, 0));
        assert_eq!(placement.rect, CellRect::new(1, 1, 4, 1));
    }

    #[test]
    fn exhausted_grid_falls_back() {
        let mut layout = Layout::empty(grid(4, 4));
        layout.tables.push(Table::new("T1", 0, 0, 4, 4));
        let placement = CollisionResolver::default().place_table(&layout, Footprint::new(1, 1));
        assert_eq!(placement.outcome, PlacementOutcome::Fallback);
        assert_eq!(placement.rect, CellRect::new(0, 0, 1, 1));
    }

    #[test]
    fn fallback_when_footprint_cannot_clear_margin() {
        let layout = Layout::empty(grid(4, 4));
        let resolver = CollisionResolver::new(TableLimits {
            max_width: 4,
            max_height: 4,
            ..TableLimits::default()
        });
        let placement = resolver.place_table(&layout, Footprint::new(4, 4));
        assert_eq!(placement.outcome, PlacementOutcome::Fallback);
        assert_eq!(placement.rect, CellRect::new(0, 0, 4, 4));
    }

    #[test]
    fn entrance_takes_first_free_top_cell() {
        let layout = Layout::default();
        let placement = CollisionResolver::default().place_entrance(&layout);
        assert_eq!((placement.side, placement.offset), (Side::Top, 0));

        let mut layout = Layout::empty(grid(4, 4));
        layout
            .entrances
            .push(Entrance::new("entrance-1", Side::Top, 0, 3));
        let placement = CollisionResolver::default().place_entrance(&layout);
        assert_eq!((placement.side, placement.offset), (Side::Top, 3));
    }

    #[test]
    fn entrance_moves_to_next_side_when_full() {
        let mut layout = Layout::empty(grid(4, 4));
        layout
            .entrances
            .push(Entrance::new("entrance-1", Side::Top, 0, 4));
        layout
            .entrances
            .push(Entrance::new("entrance-2", Side::Bottom, 0, 2));
        let placement = CollisionResolver::default().place_entrance(&layout);
        assert_eq!((placement.side, placement.offset), (Side::Bottom, 2));
    }

    #[test]
    fn entrance_fallback_when_perimeter_full() {
        let mut layout = Layout::empty(grid(4, 4));
        for (i, side) in Side::ALL.into_iter().enumerate() {
            layout
                .entrances
                .push(Entrance::new(format!("entrance-{i}"), side, 0, 4));
        }
        let placement = CollisionResolver::default().place_entrance(&layout);
        assert_eq!(placement.outcome, PlacementOutcome::Fallback);
        assert_eq!((placement.side, placement.offset), ENTRANCE_FALLBACK);
    }
}
