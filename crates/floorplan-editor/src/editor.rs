#![forbid(unsafe_code)]

//! One-stop editor wiring: store, session, gesture controller and canvas
//! sizing behind a single handle a host can drive from UI events.

use std::borrow::Cow;

use floorplan_core::{EditorConfig, EntityId, Layout, cell_size_for};

use crate::error::SessionError;
use crate::gesture::{DragResizeController, GestureEffect, PointerSample, ResizeHandle};
use crate::session::EditSession;
use crate::store::LayoutStore;
use crate::view::{FloorPlanView, OccupancyLookup};

/// Editor facade over a [`LayoutStore`].
#[derive(Debug)]
pub struct FloorPlanEditor<S> {
    store: S,
    config: EditorConfig,
    session: EditSession,
    gestures: DragResizeController,
    cell_size: u32,
}

impl<S: LayoutStore> FloorPlanEditor<S> {
    /// Load the committed layout from `store` and start in viewing mode.
    pub fn open(mut store: S, config: EditorConfig) -> Result<Self, SessionError> {
        let layout = store.load_layout()?;
        let mut session = EditSession::with_limits(config.default_layout(), config.table);
        session.replace_committed(layout)?;
        Ok(Self {
            store,
            config,
            session,
            gestures: DragResizeController::new(config.table),
            cell_size: config.cell_size.min_px,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &EditorConfig {
        &self.config
    }

    #[must_use]
    pub const fn session(&self) -> &EditSession {
        &self.session
    }

    /// Direct access for draft edits (add, delete, rename, resize grid).
    pub fn session_mut(&mut self) -> &mut EditSession {
        &mut self.session
    }

    #[must_use]
    pub const fn gestures(&self) -> &DragResizeController {
        &self.gestures
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    #[must_use]
    pub const fn cell_size(&self) -> u32 {
        self.cell_size
    }

    /// Recompute the cell size for a new container size in pixels.
    pub fn set_container(&mut self, width: f64, height: f64) -> u32 {
        let cell = self.config.cell_size;
        self.cell_size = cell_size_for(
            width,
            height,
            self.session.view().grid,
            f64::from(cell.margin_px),
            cell.bounds(),
        );
        self.cell_size
    }

    pub fn enter_edit(&mut self) -> Result<(), SessionError> {
        self.session.enter_edit()
    }

    pub fn discard(&mut self) -> Result<(), SessionError> {
        self.gestures.cancel();
        self.session.discard()
    }

    /// Persist the draft through the store.
    pub fn commit(&mut self) -> Result<(), SessionError> {
        self.gestures.cancel();
        self.session.commit_to(&mut self.store)
    }

    /// Reload the committed layout from the store. Only while viewing.
    pub fn reload(&mut self) -> Result<(), SessionError> {
        if self.session.is_editing() {
            return Err(SessionError::AlreadyEditing);
        }
        let layout = self.store.load_layout()?;
        self.session.replace_committed(layout)
    }

    /// Pointer-down on an entity body.
    pub fn begin_move(
        &mut self,
        target: &EntityId,
        sample: PointerSample,
    ) -> Result<GestureEffect, SessionError> {
        let draft = editable_draft(&self.session)?;
        Ok(self
            .gestures
            .begin_move(draft, target, sample, self.cell_size))
    }

    /// Pointer-down on a resize handle.
    pub fn begin_resize(
        &mut self,
        target: &EntityId,
        handle: ResizeHandle,
        sample: PointerSample,
    ) -> Result<GestureEffect, SessionError> {
        let draft = editable_draft(&self.session)?;
        Ok(self.gestures.begin_resize(draft, target, handle, sample))
    }

    pub fn pointer_move(&mut self, sample: PointerSample) -> GestureEffect {
        let grid = self.session.view().grid;
        self.gestures.pointer_move(grid, sample, self.cell_size)
    }

    /// Pointer-up: apply the final ghost, if any, to the draft.
    ///
    /// While the session cannot take edits the gesture stays active, so the
    /// host can release again once a pending commit settles.
    pub fn pointer_up(&mut self, pointer_id: u32) -> Result<GestureEffect, SessionError> {
        if self.gestures.is_active() {
            editable_draft(&self.session)?;
        }
        let effect = self.gestures.pointer_up(pointer_id);
        if let GestureEffect::Committed {
            ghost: Some(ghost), ..
        } = &effect
        {
            self.session.apply_ghost(ghost)?;
        }
        Ok(effect)
    }

    pub fn cancel_gesture(&mut self) -> GestureEffect {
        self.gestures.cancel()
    }

    /// Layout as it should be drawn right now, including any live ghost.
    #[must_use]
    pub fn preview(&self) -> Cow<'_, Layout> {
        let layout = self.session.view();
        match self.gestures.ghost() {
            Some(ghost) => {
                let mut preview = layout.clone();
                ghost.apply_to(&mut preview);
                Cow::Owned(preview)
            }
            None => Cow::Borrowed(layout),
        }
    }

    #[must_use]
    pub fn view(&self, lookup: &dyn OccupancyLookup) -> FloorPlanView {
        FloorPlanView::build(&self.preview(), self.cell_size, lookup)
    }
}

/// Draft a gesture may start on: editing and no commit in flight.
fn editable_draft(session: &EditSession) -> Result<&Layout, SessionError> {
    if session.is_busy() {
        return Err(SessionError::Busy);
    }
    session.draft().ok_or(SessionError::NotEditing)
}
