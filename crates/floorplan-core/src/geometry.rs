#![forbid(unsafe_code)]

//! Grid geometry: dimensions, cell rectangles, and pixel/cell conversion.
//!
//! All entity positions live in integer grid-cell space with the origin at
//! the top-left corner of the floor plan. Pixels only appear at the edges of
//! the model: the host measures its container, asks [`cell_size_for`] how
//! large a cell may be, and converts pointer positions with
//! [`pixel_to_cell`].
//!
//! Pointer positions are expected relative to the grid origin (the host
//! subtracts the canvas margin before calling in). They may be negative or
//! beyond the grid when the pointer leaves the canvas; every consumer clamps.

use serde::{Deserialize, Serialize};

use crate::entity::Side;
use crate::error::GridSpecError;

/// Smallest accepted column/row count.
pub const GRID_MIN: u16 = 4;

/// Largest accepted column/row count.
pub const GRID_MAX: u16 = 20;

/// Pointer-derived cell coordinates are bounded to `±CELL_COORD_LIMIT`.
pub const CELL_COORD_LIMIT: i32 = u16::MAX as i32;

/// Floor plan dimensions in cells.
///
/// Both axes are bounded to `GRID_MIN..=GRID_MAX`. [`GridSpec::new`] rejects
/// anything else; [`GridSpec::clamped`] is the entry point for untrusted
/// input such as a grid-size stepper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSpec {
    pub columns: u16,
    pub rows: u16,
}

impl GridSpec {
    /// Create a grid, rejecting dimensions outside the editing range.
    pub fn new(columns: u16, rows: u16) -> Result<Self, GridSpecError> {
        let grid = Self { columns, rows };
        if grid.is_in_range() {
            Ok(grid)
        } else {
            Err(GridSpecError::OutOfRange { columns, rows })
        }
    }

    /// Create a grid with both dimensions clamped into the editing range.
    #[must_use]
    pub fn clamped(columns: u16, rows: u16) -> Self {
        Self {
            columns: columns.clamp(GRID_MIN, GRID_MAX),
            rows: rows.clamp(GRID_MIN, GRID_MAX),
        }
    }

    /// Whether both dimensions lie inside the editing range.
    #[inline]
    #[must_use]
    pub const fn is_in_range(&self) -> bool {
        self.columns >= GRID_MIN
            && self.columns <= GRID_MAX
            && self.rows >= GRID_MIN
            && self.rows <= GRID_MAX
    }

    /// Length in cells of the given perimeter edge.
    ///
    /// Top/bottom edges run along the x axis, left/right along the y axis.
    #[inline]
    #[must_use]
    pub const fn edge_length(&self, side: Side) -> u16 {
        match side {
            Side::Top | Side::Bottom => self.columns,
            Side::Left | Side::Right => self.rows,
        }
    }

    /// The whole grid as a cell rectangle.
    #[inline]
    #[must_use]
    pub const fn bounds(&self) -> CellRect {
        CellRect::new(0, 0, self.columns, self.rows)
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            columns: 12,
            rows: 8,
        }
    }
}

/// A raw (unclamped) cell coordinate, usually derived from a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CellPoint {
    pub x: i32,
    pub y: i32,
}

impl CellPoint {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in cell units.
///
/// `x`/`y` are the inclusive top-left cell; `right()`/`bottom()` are
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CellRect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl CellRect {
    #[inline]
    #[must_use]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether a cell lies inside the rectangle.
    #[inline]
    #[must_use]
    pub const fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Whether `other` lies entirely inside `self`.
    #[inline]
    #[must_use]
    pub const fn contains_rect(&self, other: &CellRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Strict overlap test; rectangles that only share an edge do not overlap.
    #[inline]
    #[must_use]
    pub const fn overlaps(&self, other: &CellRect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }
}

/// A pointer position in pixels, relative to the grid origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A rectangle in pixels, relative to the grid origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Lower and upper bound for a derived cell size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSizeBounds {
    pub min_px: u32,
    pub max_px: u32,
}

impl Default for CellSizeBounds {
    fn default() -> Self {
        Self {
            min_px: 30,
            max_px: 120,
        }
    }
}

/// Largest square cell size that fits `grid` into the container.
///
/// Computes `min(floor((w - 2m) / columns), floor((h - 2m) / rows))` and
/// clamps the result into `bounds`, so a tiny or unmeasured container never
/// collapses the grid and an empty one never blows it up.
#[must_use]
pub fn cell_size_for(
    container_width: f64,
    container_height: f64,
    grid: GridSpec,
    margin: f64,
    bounds: CellSizeBounds,
) -> u32 {
    let margin = if margin.is_finite() { margin.max(0.0) } else { 0.0 };
    let per_axis = |extent: f64, cells: u16| -> f64 {
        if !extent.is_finite() || cells == 0 {
            return 0.0;
        }
        ((extent - 2.0 * margin).max(0.0) / f64::from(cells)).floor()
    };

    let fit = per_axis(container_width, grid.columns).min(per_axis(container_height, grid.rows));
    let max = f64::from(bounds.max_px);
    let min = f64::from(bounds.min_px);
    // `as` saturates; the clamp keeps the value inside u32 anyway.
    fit.min(max).max(min) as u32
}

/// Cell under a pixel position, using floor division.
///
/// No rounding: the cell containing the pointer is always chosen, and
/// positions left of or above the grid map to negative cells.
#[must_use]
pub fn pixel_to_cell(point: PixelPoint, cell_size: u32) -> CellPoint {
    let size = f64::from(cell_size.max(1));
    let to_cell = |v: f64| -> i32 {
        if v.is_finite() {
            let limit = f64::from(CELL_COORD_LIMIT);
            (v / size).floor().clamp(-limit, limit) as i32
        } else {
            0
        }
    };
    CellPoint::new(to_cell(point.x), to_cell(point.y))
}

/// Pixel rectangle covered by a cell rectangle.
#[must_use]
pub fn cell_to_pixel(rect: CellRect, cell_size: u32) -> PixelRect {
    PixelRect {
        x: u32::from(rect.x) * cell_size,
        y: u32::from(rect.y) * cell_size,
        width: u32::from(rect.width) * cell_size,
        height: u32::from(rect.height) * cell_size,
    }
}

/// Clamp a `width × height` footprint's origin so it lies inside `grid`.
///
/// `x' = clamp(x, 0, columns - width)`, `y' = clamp(y, 0, rows - height)`.
/// A footprint larger than the grid pins to the origin.
#[must_use]
pub fn clamp_rect(x: i32, y: i32, width: u16, height: u16, grid: GridSpec) -> (u16, u16) {
    (
        clamp_axis(x, grid.columns.saturating_sub(width)),
        clamp_axis(y, grid.rows.saturating_sub(height)),
    )
}

/// Clamp `value` into `0..=max`.
#[inline]
pub(crate) fn clamp_axis(value: i32, max: u16) -> u16 {
    // max fits in i32 and is non-negative, so the clamp cannot panic.
    value.clamp(0, i32::from(max)) as u16
}
