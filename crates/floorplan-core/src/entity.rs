#![forbid(unsafe_code)]

//! Placeable floor-plan entities: tables and perimeter entrances.
//!
//! Both kinds expose a [`CellRect`] footprint so overlap tests can treat them
//! uniformly; entrances derive theirs from the edge they are anchored to.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{CellRect, GridSpec};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::new(raw)
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

string_id! {
    /// Stable table identifier, distinct from its cosmetic display name.
    TableId
}

string_id! {
    /// Stable entrance identifier.
    EntranceId
}

/// Reference to any placeable entity in a layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityId {
    Table(TableId),
    Entrance(EntranceId),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table(id) => write!(f, "table {id}"),
            Self::Entrance(id) => write!(f, "entrance {id}"),
        }
    }
}

impl From<TableId> for EntityId {
    fn from(id: TableId) -> Self {
        Self::Table(id)
    }
}

impl From<EntranceId> for EntityId {
    fn from(id: EntranceId) -> Self {
        Self::Entrance(id)
    }
}

/// One of the four perimeter edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    /// All sides in scan/tie-break priority order.
    pub const ALL: [Side; 4] = [Side::Top, Side::Bottom, Side::Left, Side::Right];

    /// Whether the edge runs along the x axis.
    #[inline]
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Side::Top | Side::Bottom)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Top => "top",
            Side::Bottom => "bottom",
            Side::Left => "left",
            Side::Right => "right",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableShape {
    #[default]
    Square,
    Round,
}

/// A dining table occupying a rectangle of cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: TableId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    #[serde(default)]
    pub shape: TableShape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u16>,
}

impl Table {
    /// A square, unnamed table without a capacity.
    #[must_use]
    pub fn new(id: impl Into<TableId>, x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            x,
            y,
            width,
            height,
            shape: TableShape::Square,
            capacity: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_shape(mut self, shape: TableShape) -> Self {
        self.shape = shape;
        self
    }

    #[must_use]
    pub fn with_capacity(mut self, capacity: u16) -> Self {
        self.capacity = Some(capacity);
        self
    }

    #[inline]
    #[must_use]
    pub const fn rect(&self) -> CellRect {
        CellRect::new(self.x, self.y, self.width, self.height)
    }

    /// Text shown on the tile: the display name, or the id when the name is
    /// missing or blank.
    #[must_use]
    pub fn label(&self) -> &str {
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => self.id.as_str(),
        }
    }
}

/// An opening in the building perimeter, anchored to one side.
///
/// Occupies `span` cells of `side`, starting at `offset` along that edge's
/// axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entrance {
    pub id: EntranceId,
    pub side: Side,
    pub offset: u16,
    pub span: u16,
}

impl Entrance {
    #[must_use]
    pub fn new(id: impl Into<EntranceId>, side: Side, offset: u16, span: u16) -> Self {
        Self {
            id: id.into(),
            side,
            offset,
            span,
        }
    }

    /// Exclusive end of the occupied segment along the edge.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> u16 {
        self.offset.saturating_add(self.span)
    }

    /// Whether the segment shares at least one cell with `[offset, offset + span)`
    /// on the same side.
    #[inline]
    #[must_use]
    pub fn overlaps_segment(&self, side: Side, offset: u16, span: u16) -> bool {
        self.side == side && self.offset < offset.saturating_add(span) && self.end() > offset
    }

    /// Footprint in grid cells.
    #[must_use]
    pub fn rect(&self, grid: GridSpec) -> CellRect {
        match self.side {
            Side::Top => CellRect::new(self.offset, 0, self.span, 1),
            Side::Bottom => CellRect::new(self.offset, grid.rows.saturating_sub(1), self.span, 1),
            Side::Left => CellRect::new(0, self.offset, 1, self.span),
            Side::Right => {
                CellRect::new(grid.columns.saturating_sub(1), self.offset, 1, self.span)
            }
        }
    }

    /// Whether the segment is non-empty and lies within its edge.
    #[must_use]
    pub fn fits(&self, grid: GridSpec) -> bool {
        self.span >= 1 && self.end() <= grid.edge_length(self.side)
    }
}
