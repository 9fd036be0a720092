#![forbid(unsafe_code)]

//! Interactive floor-plan editing.
//!
//! - [`gesture`]: pointer drag/resize state machine producing ghost previews.
//! - [`session`]: draft/commit/discard editing with in-flight commit tickets.
//! - [`store`]: layout persistence (memory and JSON directory) plus legacy
//!   record migration.
//! - [`view`]: render-ready tiles joined with host occupancy.
//! - [`editor`]: [`FloorPlanEditor`], tying the above together.

pub mod editor;
pub mod error;
pub mod gesture;
pub mod session;
pub mod store;
pub mod view;

pub use editor::FloorPlanEditor;
pub use error::{SessionError, StoreError};
pub use gesture::{
    DragResizeController, GestureEffect, GestureKind, GestureNoopReason, GestureState, Ghost,
    PointerSample, ResizeHandle, preview_side,
};
pub use session::{Added, CommitOutcome, CommitTicket, EditMode, EditSession};
pub use store::{
    FLOOR_PLAN_FILE, FLOOR_PLAN_SCHEMA_VERSION, FloorPlanRecord, JsonDirLayoutStore, LayoutStore,
    LegacyDoorPosition, MemoryLayoutStore, MigrationResult, TABLES_FILE, migrate_floor_plan,
};
pub use view::{
    EntranceMarker, FloorPlanView, FnOccupancy, NoOccupancy, Occupancy, OccupancyLookup, TableTile,
};
