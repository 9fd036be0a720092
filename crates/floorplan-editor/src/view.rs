#![forbid(unsafe_code)]

//! Render-ready view of a layout.
//!
//! [`FloorPlanView`] resolves every entity to pixel rectangles for a given
//! cell size and joins tables with live occupancy from the host. Hosts draw
//! it however they like; nothing here knows about styling.

use std::collections::HashMap;

use floorplan_core::{
    CellRect, EntityId, EntranceId, GridSpec, Layout, PixelPoint, PixelRect, Side, TableId,
    TableShape, cell_to_pixel, pixel_to_cell,
};
use serde::{Deserialize, Serialize};

/// Live order state of one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Occupancy {
    pub occupied: bool,
    pub active_orders: u32,
}

impl Occupancy {
    pub const FREE: Self = Self {
        occupied: false,
        active_orders: 0,
    };

    #[must_use]
    pub const fn with_orders(active_orders: u32) -> Self {
        Self {
            occupied: active_orders > 0,
            active_orders,
        }
    }
}

/// Host-supplied occupancy source, read-only from the editor's side.
pub trait OccupancyLookup {
    fn occupancy(&self, table: &TableId) -> Occupancy;
}

/// Lookup that reports every table as free.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOccupancy;

impl OccupancyLookup for NoOccupancy {
    fn occupancy(&self, _table: &TableId) -> Occupancy {
        Occupancy::FREE
    }
}

impl OccupancyLookup for HashMap<TableId, Occupancy> {
    fn occupancy(&self, table: &TableId) -> Occupancy {
        self.get(table).copied().unwrap_or_default()
    }
}

/// Adapts a closure into an [`OccupancyLookup`].
#[derive(Debug, Clone, Copy)]
pub struct FnOccupancy<F>(pub F);

impl<F: Fn(&TableId) -> Occupancy> OccupancyLookup for FnOccupancy<F> {
    fn occupancy(&self, table: &TableId) -> Occupancy {
        (self.0)(table)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableTile {
    pub id: TableId,
    pub label: String,
    pub cells: CellRect,
    pub pixels: PixelRect,
    pub shape: TableShape,
    pub capacity: Option<u16>,
    pub occupancy: Occupancy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntranceMarker {
    pub id: EntranceId,
    pub side: Side,
    pub cells: CellRect,
    pub pixels: PixelRect,
}

/// A layout resolved for drawing at one cell size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorPlanView {
    pub grid: GridSpec,
    pub cell_size: u32,
    /// Whole grid in pixels.
    pub canvas: PixelRect,
    pub tables: Vec<TableTile>,
    pub entrances: Vec<EntranceMarker>,
}

impl FloorPlanView {
    #[must_use]
    pub fn build(layout: &Layout, cell_size: u32, lookup: &dyn OccupancyLookup) -> Self {
        let tables = layout
            .tables
            .iter()
            .map(|table| TableTile {
                id: table.id.clone(),
                label: table.label().to_owned(),
                cells: table.rect(),
                pixels: cell_to_pixel(table.rect(), cell_size),
                shape: table.shape,
                capacity: table.capacity,
                occupancy: lookup.occupancy(&table.id),
            })
            .collect();
        let entrances = layout
            .entrances
            .iter()
            .map(|entrance| {
                let cells = entrance.rect(layout.grid);
                EntranceMarker {
                    id: entrance.id.clone(),
                    side: entrance.side,
                    cells,
                    pixels: cell_to_pixel(cells, cell_size),
                }
            })
            .collect();

        Self {
            grid: layout.grid,
            cell_size,
            canvas: cell_to_pixel(layout.grid.bounds(), cell_size),
            tables,
            entrances,
        }
    }

    /// Entity under a pixel position.
    ///
    /// Entrance markers sit above tables; among tables the later one wins,
    /// matching draw order.
    #[must_use]
    pub fn hit_test(&self, point: PixelPoint) -> Option<EntityId> {
        let cell = pixel_to_cell(point, self.cell_size);
        let (Ok(x), Ok(y)) = (u16::try_from(cell.x), u16::try_from(cell.y)) else {
            return None;
        };
        if let Some(marker) = self.entrances.iter().rev().find(|m| m.cells.contains(x, y)) {
            return Some(EntityId::Entrance(marker.id.clone()));
        }
        self.tables
            .iter()
            .rev()
            .find(|tile| tile.cells.contains(x, y))
            .map(|tile| EntityId::Table(tile.id.clone()))
    }

    /// Number of tables with at least one active order.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.tables.iter().filter(|t| t.occupancy.occupied).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorplan_core::Table;

    fn layout() -> Layout {
        let mut layout = Layout::default();
        layout.tables.push(
            Table::new("T1", 1, 1, 2, 1)
                .with_name("Booth")
                .with_shape(TableShape::Round)
                .with_capacity(4),
        );
        layout.tables.push(Table::new("T2", 5, 0, 2, 2));
        layout
    }

    #[test]
    fn tiles_carry_pixels_and_labels() {
        let view = FloorPlanView::build(&layout(), 40, &NoOccupancy);
        assert_eq!(view.canvas, PixelRect { x: 0, y: 0, width: 480, height: 320 });
        let tile = &view.tables[0];
        assert_eq!(tile.label, "Booth");
        assert_eq!(tile.pixels, PixelRect { x: 40, y: 40, width: 80, height: 40 });
        assert_eq!(tile.shape, TableShape::Round);
        assert_eq!(tile.capacity, Some(4));
        assert_eq!(view.tables[1].label, "T2");
        assert_eq!(
            view.entrances[0].pixels,
            PixelRect { x: 200, y: 0, width: 80, height: 40 }
        );
    }

    #[test]
    fn occupancy_comes_from_lookup() {
        let mut orders = HashMap::new();
        orders.insert(TableId::new("T2"), Occupancy::with_orders(2));
        let view = FloorPlanView::build(&layout(), 40, &orders);
        assert_eq!(view.tables[0].occupancy, Occupancy::FREE);
        assert_eq!(view.tables[1].occupancy.active_orders, 2);
        assert_eq!(view.occupied_count(), 1);

        let all_busy = FnOccupancy(|_: &TableId| Occupancy::with_orders(1));
        assert_eq!(FloorPlanView::build(&layout(), 40, &all_busy).occupied_count(), 2);
    }

    #[test]
    fn hit_test_prefers_entrances() {
        let view = FloorPlanView::build(&layout(), 40, &NoOccupancy);
        assert_eq!(
            view.hit_test(PixelPoint::new(50.0, 50.0)),
            Some(EntityId::Table(TableId::new("T1")))
        );
        // Cell (5, 0) holds both T2 and the entrance.
        assert_eq!(
            view.hit_test(PixelPoint::new(210.0, 10.0)),
            Some(EntityId::Entrance(EntranceId::new("entrance-1")))
        );
        assert_eq!(
            view.hit_test(PixelPoint::new(210.0, 50.0)),
            Some(EntityId::Table(TableId::new("T2")))
        );
        assert_eq!(view.hit_test(PixelPoint::new(-5.0, 10.0)), None);
        assert_eq!(view.hit_test(PixelPoint::new(400.0, 280.0)), None);
    }
}
