#![forbid(unsafe_code)]

//! Floor-plan geometry and placement.
//!
//! This crate is the pure, host-agnostic half of the floor-plan editor:
//!
//! - [`geometry`]: grid dimensions, cell rectangles, pixel/cell conversion
//!   and bounds clamping.
//! - [`entity`]: tables and perimeter entrances.
//! - [`layout`]: the persisted [`Layout`] with invariant checks and repair.
//! - [`placement`]: collision-free spots for new tables and entrances.
//! - [`snap`]: nearest-edge snapping for dragged entrances.
//! - [`config`]: editor tunables loadable from TOML or JSON.
//!
//! Nothing here allocates beyond the layout itself or performs I/O (except
//! config file loading); the interactive state machines live in
//! `floorplan-editor`.

pub mod config;
pub mod entity;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod placement;
pub mod snap;

pub use config::{CellSizeConfig, EditorConfig, EntranceDefaults, GridDefaults, TableLimits};
pub use entity::{EntityId, Entrance, EntranceId, Side, Table, TableId, TableShape};
pub use error::{ConfigError, GridSpecError};
pub use geometry::{
    CELL_COORD_LIMIT, CellPoint, CellRect, CellSizeBounds, GRID_MAX, GRID_MIN, GridSpec, PixelPoint,
    PixelRect, cell_size_for, cell_to_pixel, clamp_rect, pixel_to_cell,
};
pub use layout::{
    Layout, LayoutInvariantReport, LayoutIssue, LayoutIssueCode, LayoutRepairSummary,
    clamp_entrance_into, clamp_table_into,
};
pub use placement::{
    CollisionResolver, EntrancePlacement, Footprint, PlacementOutcome, TablePlacement,
};
pub use snap::{EdgeAnchor, nearest_side, project_onto_side, snap_to_edge};
