#![forbid(unsafe_code)]

//! Pointer gesture lifecycle for moving and resizing floor-plan entities.
//!
//! [`DragResizeController`] turns pointer-down → pointer-move* → pointer-up
//! sequences into ghost previews and, on release, a final ghost for the
//! session to apply.
//!
//! ```text
//! Idle -> Dragging -> Idle
//!    \--> Resizing -> Idle
//! ```
//!
//! # Invariants
//!
//! 1. At most one gesture is active. A pointer-down while active is a no-op.
//! 2. Every move recomputes the ghost from the gesture's start geometry and
//!    the current pointer, never from the previous ghost, so dropped or
//!    coalesced moves cannot desynchronize the preview.
//! 3. Ghosts are always legal: tables are clamped into the grid and
//!    entrances are snapped onto an edge.
//! 4. Pointer-up without any move yields no ghost; the entity is unchanged.
//!
//! # Failure Modes
//!
//! Stray moves/releases, pointer-id mismatches and gestures on unknown
//! entities produce [`GestureEffect::Noop`] with a reason and never touch
//! state.

use floorplan_core::{
    CELL_COORD_LIMIT, CellPoint, CellRect, EdgeAnchor, EntityId, EntranceId, GridSpec, Layout, PixelPoint, Side,
    TableId, TableLimits, clamp_entrance_into, clamp_rect, clamp_table_into, pixel_to_cell,
    project_onto_side, snap_to_edge,
};
use serde::{Deserialize, Serialize};

/// One pointer sample in pixels relative to the grid origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    pub pointer_id: u32,
    pub position: PixelPoint,
}

impl PointerSample {
    #[must_use]
    pub const fn new(pointer_id: u32, x: f64, y: f64) -> Self {
        Self {
            pointer_id,
            position: PixelPoint::new(x, y),
        }
    }
}

/// Which handle a resize gesture grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeHandle {
    /// Bottom-right corner of a table; origin stays fixed.
    Corner,
    /// Start of an entrance span; the end stays fixed.
    Start,
    /// End of an entrance span; the offset stays fixed.
    End,
}

/// Transient geometry for an entity mid-gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Ghost {
    Table { id: TableId, rect: CellRect },
    Entrance { id: EntranceId, anchor: EdgeAnchor },
}

impl Ghost {
    /// Current geometry of `target` in `layout`, if present.
    #[must_use]
    pub fn capture(layout: &Layout, target: &EntityId) -> Option<Self> {
        match target {
            EntityId::Table(id) => layout.table(id).map(|table| Ghost::Table {
                id: id.clone(),
                rect: table.rect(),
            }),
            EntityId::Entrance(id) => layout.entrance(id).map(|entrance| Ghost::Entrance {
                id: id.clone(),
                anchor: EdgeAnchor::of(entrance),
            }),
        }
    }

    #[must_use]
    pub fn target(&self) -> EntityId {
        match self {
            Ghost::Table { id, .. } => EntityId::Table(id.clone()),
            Ghost::Entrance { id, .. } => EntityId::Entrance(id.clone()),
        }
    }

    /// Write the ghost geometry into `layout`, clamped into its grid.
    ///
    /// Returns `false` when the entity no longer exists.
    pub fn apply_to(&self, layout: &mut Layout) -> bool {
        let grid = layout.grid;
        match self {
            Ghost::Table { id, rect } => {
                let Some(table) = layout.table_mut(id) else {
                    return false;
                };
                table.x = rect.x;
                table.y = rect.y;
                table.width = rect.width;
                table.height = rect.height;
                clamp_table_into(table, grid);
            }
            Ghost::Entrance { id, anchor } => {
                let Some(entrance) = layout.entrance_mut(id) else {
                    return false;
                };
                anchor.apply_to(entrance);
                clamp_entrance_into(entrance, grid);
            }
        }
        true
    }
}

/// Gesture kinds, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    Move,
    Resize(ResizeHandle),
}

/// Controller lifecycle state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GestureState {
    Idle,
    Dragging {
        pointer_id: u32,
        /// Cell delta between the pointer and the entity origin at pointer-down.
        grab_offset: CellPoint,
        origin: Ghost,
        ghost: Option<Ghost>,
    },
    Resizing {
        pointer_id: u32,
        handle: ResizeHandle,
        start_pointer: PixelPoint,
        origin: Ghost,
        ghost: Option<Ghost>,
    },
}

/// Explicit reasons for safely ignored input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureNoopReason {
    IdleWithoutActiveGesture,
    GestureAlreadyActive,
    PointerMismatch,
    UnknownTarget,
    HandleMismatch,
}

/// Outcome of one controller step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum GestureEffect {
    Started {
        target: EntityId,
        kind: GestureKind,
    },
    Preview(Ghost),
    /// Gesture finished. `ghost` is `None` when the pointer never moved.
    Committed {
        target: EntityId,
        ghost: Option<Ghost>,
    },
    Canceled {
        target: EntityId,
    },
    Noop {
        reason: GestureNoopReason,
    },
}

impl GestureEffect {
    const fn noop(reason: GestureNoopReason) -> Self {
        Self::Noop { reason }
    }
}

/// Per-gesture state machine for moving and resizing tables and entrances.
#[derive(Debug, Clone, PartialEq)]
pub struct DragResizeController {
    state: GestureState,
    limits: TableLimits,
}

impl Default for DragResizeController {
    fn default() -> Self {
        Self::new(TableLimits::default())
    }
}

impl DragResizeController {
    #[must_use]
    pub fn new(limits: TableLimits) -> Self {
        Self {
            state: GestureState::Idle,
            limits,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &GestureState {
        &self.state
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self.state, GestureState::Idle)
    }

    /// Latest ghost preview of the active gesture.
    #[must_use]
    pub fn ghost(&self) -> Option<&Ghost> {
        match &self.state {
            GestureState::Idle => None,
            GestureState::Dragging { ghost, .. } | GestureState::Resizing { ghost, .. } => {
                ghost.as_ref()
            }
        }
    }

    /// Start moving `target` with the pointer at `sample`.
    pub fn begin_move(
        &mut self,
        layout: &Layout,
        target: &EntityId,
        sample: PointerSample,
        cell_size: u32,
    ) -> GestureEffect {
        if self.is_active() {
            return Self::ignore(GestureNoopReason::GestureAlreadyActive);
        }
        let Some(origin) = Ghost::capture(layout, target) else {
            return Self::ignore(GestureNoopReason::UnknownTarget);
        };

        let cell = pixel_to_cell(sample.position, cell_size);
        let grab_offset = match &origin {
            Ghost::Table { rect, .. } => {
                CellPoint::new(
                    cell.x.saturating_sub(i32::from(rect.x)),
                    cell.y.saturating_sub(i32::from(rect.y)),
                )
            }
            // Entrances follow the pointer cell directly.
            Ghost::Entrance { .. } => CellPoint::default(),
        };

        self.state = GestureState::Dragging {
            pointer_id: sample.pointer_id,
            grab_offset,
            origin,
            ghost: None,
        };
        tracing::debug!(
            target: "floorplan.gesture",
            %target,
            pointer_id = sample.pointer_id,
            grab_x = grab_offset.x,
            grab_y = grab_offset.y,
            "drag started"
        );
        GestureEffect::Started {
            target: target.clone(),
            kind: GestureKind::Move,
        }
    }

    /// Start resizing `target` from `handle`.
    ///
    /// Tables accept only [`ResizeHandle::Corner`]; entrances accept
    /// [`ResizeHandle::Start`] and [`ResizeHandle::End`].
    pub fn begin_resize(
        &mut self,
        layout: &Layout,
        target: &EntityId,
        handle: ResizeHandle,
        sample: PointerSample,
    ) -> GestureEffect {
        if self.is_active() {
            return Self::ignore(GestureNoopReason::GestureAlreadyActive);
        }
        let Some(origin) = Ghost::capture(layout, target) else {
            return Self::ignore(GestureNoopReason::UnknownTarget);
        };
        let handle_fits = matches!(
            (&origin, handle),
            (Ghost::Table { .. }, ResizeHandle::Corner)
                | (Ghost::Entrance { .. }, ResizeHandle::Start | ResizeHandle::End)
        );
        if !handle_fits {
            return Self::ignore(GestureNoopReason::HandleMismatch);
        }

        self.state = GestureState::Resizing {
            pointer_id: sample.pointer_id,
            handle,
            start_pointer: sample.position,
            origin,
            ghost: None,
        };
        tracing::debug!(
            target: "floorplan.gesture",
            %target,
            pointer_id = sample.pointer_id,
            ?handle,
            "resize started"
        );
        GestureEffect::Started {
            target: target.clone(),
            kind: GestureKind::Resize(handle),
        }
    }

    /// Recompute the ghost for the current pointer position.
    pub fn pointer_move(
        &mut self,
        grid: GridSpec,
        sample: PointerSample,
        cell_size: u32,
    ) -> GestureEffect {
        let limits = self.limits;
        match &mut self.state {
            GestureState::Idle => {
                GestureEffect::noop(GestureNoopReason::IdleWithoutActiveGesture)
            }
            GestureState::Dragging {
                pointer_id,
                grab_offset,
                origin,
                ghost,
            } => {
                if *pointer_id != sample.pointer_id {
                    return GestureEffect::noop(GestureNoopReason::PointerMismatch);
                }
                let cell = pixel_to_cell(sample.position, cell_size);
                let next = drag_ghost(grid, origin, cell, *grab_offset);
                *ghost = Some(next.clone());
                GestureEffect::Preview(next)
            }
            GestureState::Resizing {
                pointer_id,
                handle,
                start_pointer,
                origin,
                ghost,
            } => {
                if *pointer_id != sample.pointer_id {
                    return GestureEffect::noop(GestureNoopReason::PointerMismatch);
                }
                let delta = CellPoint::new(
                    cells_from_pixels(sample.position.x - start_pointer.x, cell_size),
                    cells_from_pixels(sample.position.y - start_pointer.y, cell_size),
                );
                let next = resize_ghost(grid, &limits, origin, *handle, delta);
                *ghost = Some(next.clone());
                GestureEffect::Preview(next)
            }
        }
    }

    /// Finish the gesture, handing back the last ghost (if any).
    ///
    /// The release position is not used: the last preview already reflects
    /// the last known pointer, so releasing outside the canvas behaves like
    /// releasing inside.
    pub fn pointer_up(&mut self, pointer_id: u32) -> GestureEffect {
        let active_pointer = match &self.state {
            GestureState::Idle => {
                return Self::ignore(GestureNoopReason::IdleWithoutActiveGesture);
            }
            GestureState::Dragging { pointer_id, .. } | GestureState::Resizing { pointer_id, .. } => {
                *pointer_id
            }
        };
        if active_pointer != pointer_id {
            return Self::ignore(GestureNoopReason::PointerMismatch);
        }

        match std::mem::replace(&mut self.state, GestureState::Idle) {
            GestureState::Idle => GestureEffect::noop(GestureNoopReason::IdleWithoutActiveGesture),
            GestureState::Dragging { origin, ghost, .. }
            | GestureState::Resizing { origin, ghost, .. } => {
                let target = origin.target();
                tracing::debug!(
                    target: "floorplan.gesture",
                    %target,
                    moved = ghost.is_some(),
                    "gesture committed"
                );
                GestureEffect::Committed { target, ghost }
            }
        }
    }

    /// Abandon the active gesture without producing a result.
    pub fn cancel(&mut self) -> GestureEffect {
        match std::mem::replace(&mut self.state, GestureState::Idle) {
            GestureState::Idle => GestureEffect::noop(GestureNoopReason::IdleWithoutActiveGesture),
            GestureState::Dragging { origin, .. } | GestureState::Resizing { origin, .. } => {
                let target = origin.target();
                tracing::debug!(target: "floorplan.gesture", %target, "gesture canceled");
                GestureEffect::Canceled { target }
            }
        }
    }

    fn ignore(reason: GestureNoopReason) -> GestureEffect {
        tracing::debug!(target: "floorplan.gesture", ?reason, "gesture input ignored");
        GestureEffect::noop(reason)
    }
}

/// Whole cells covered by a pixel delta, rounded to nearest.
fn cells_from_pixels(delta_px: f64, cell_size: u32) -> i32 {
    if !delta_px.is_finite() {
        return 0;
    }
    let limit = f64::from(CELL_COORD_LIMIT);
    (delta_px / f64::from(cell_size.max(1)))
        .round()
        .clamp(-limit, limit) as i32
}

fn drag_ghost(grid: GridSpec, origin: &Ghost, cell: CellPoint, grab_offset: CellPoint) -> Ghost {
    match origin {
        Ghost::Table { id, rect } => {
            let (x, y) = clamp_rect(
                cell.x.saturating_sub(grab_offset.x),
                cell.y.saturating_sub(grab_offset.y),
                rect.width,
                rect.height,
                grid,
            );
            Ghost::Table {
                id: id.clone(),
                rect: CellRect::new(x, y, rect.width, rect.height),
            }
        }
        Ghost::Entrance { id, anchor } => Ghost::Entrance {
            id: id.clone(),
            anchor: snap_to_edge(grid, cell, anchor.span),
        },
    }
}

fn resize_ghost(
    grid: GridSpec,
    limits: &TableLimits,
    origin: &Ghost,
    handle: ResizeHandle,
    delta: CellPoint,
) -> Ghost {
    match origin {
        Ghost::Table { id, rect } => {
            let max_width = limits.max_width.min(grid.columns.saturating_sub(rect.x));
            let max_height = limits.max_height.min(grid.rows.saturating_sub(rect.y));
            let width = clamp_size(i32::from(rect.width).saturating_add(delta.x), max_width);
            let height = clamp_size(i32::from(rect.height).saturating_add(delta.y), max_height);
            Ghost::Table {
                id: id.clone(),
                rect: CellRect::new(rect.x, rect.y, width, height),
            }
        }
        Ghost::Entrance { id, anchor } => {
            let anchor = project_onto_side(grid, *anchor);
            let along = if anchor.side.is_horizontal() {
                delta.x
            } else {
                delta.y
            };
            Ghost::Entrance {
                id: id.clone(),
                anchor: resize_span(grid, anchor, handle, along),
            }
        }
    }
}

fn clamp_size(value: i32, max: u16) -> u16 {
    value.clamp(1, i32::from(max.max(1))) as u16
}

/// Move one end of an entrance segment by `along` cells, keeping the other
/// end fixed.
fn resize_span(grid: GridSpec, anchor: EdgeAnchor, handle: ResizeHandle, along: i32) -> EdgeAnchor {
    let edge = i32::from(grid.edge_length(anchor.side));
    let offset = i32::from(anchor.offset);
    let end = offset + i32::from(anchor.span);
    let (offset, end) = match handle {
        ResizeHandle::Start => (offset.saturating_add(along).clamp(0, end - 1), end),
        ResizeHandle::End | ResizeHandle::Corner => {
            (offset, end.saturating_add(along).clamp(offset + 1, edge))
        }
    };
    EdgeAnchor::new(anchor.side, offset as u16, (end - offset) as u16)
}

/// Side an entrance would land on for a pointer cell; exposed for hosts
/// that highlight the target wall while dragging.
#[must_use]
pub fn preview_side(grid: GridSpec, cell: CellPoint) -> Side {
    floorplan_core::nearest_side(grid, cell)
}
