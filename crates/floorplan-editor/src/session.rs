#![forbid(unsafe_code)]

//! Draft/commit editing over a persisted layout.
//!
//! ```text
//!            enter_edit                  begin_commit
//! Viewing ───────────────▶ Editing ─────────────────▶ Editing (busy)
//!    ▲                       │  ▲                         │
//!    │        discard        │  │   finish_commit(Err)    │
//!    ├───────────────────────┘  └─────────────────────────┤
//!    │                 finish_commit(Ok)                  │
//!    └────────────────────────────────────────────────────┘
//! ```
//!
//! # Invariants
//!
//! 1. Edits only ever touch the draft; the committed layout changes only on
//!    a successful commit or an explicit reload.
//! 2. `discard` restores exactly the layout seen at `enter_edit`.
//! 3. While a commit is in flight the draft is frozen: every mutation fails
//!    with [`SessionError::Busy`].
//! 4. A commit result is accepted only for the generation that started it.
//!    Results arriving after a discard or re-entry are ignored.
//!
//! The session is single-writer and never performs I/O itself; persistence
//! is handed a borrowed draft through [`EditSession::commit`] or a
//! [`CommitTicket`].

use floorplan_core::{
    CollisionResolver, EntityId, Entrance, EntranceId, Footprint, GridSpec, Layout,
    PlacementOutcome, Table, TableId, TableLimits, TableShape,
};
use serde::{Deserialize, Serialize};

use crate::error::{SessionError, StoreError};
use crate::gesture::Ghost;
use crate::store::LayoutStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditMode {
    Viewing,
    Editing,
}

/// Handle for one in-flight commit.
///
/// Carries a snapshot of the draft to persist and the session generation it
/// belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitTicket {
    generation: u64,
    layout: Layout,
}

impl CommitTicket {
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Layout to hand to the store.
    #[must_use]
    pub const fn layout(&self) -> &Layout {
        &self.layout
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitOutcome {
    Committed,
    /// The ticket was stale; the session was left untouched.
    Ignored,
}

/// A newly added entity and how its position was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Added<Id> {
    pub id: Id,
    pub outcome: PlacementOutcome,
}

/// Editing session over a committed layout.
#[derive(Debug, Clone)]
pub struct EditSession {
    committed: Layout,
    draft: Option<Layout>,
    resolver: CollisionResolver,
    generation: u64,
    pending: Option<u64>,
}

impl EditSession {
    #[must_use]
    pub fn new(committed: Layout) -> Self {
        Self::with_limits(committed, TableLimits::default())
    }

    #[must_use]
    pub fn with_limits(committed: Layout, limits: TableLimits) -> Self {
        Self {
            committed,
            draft: None,
            resolver: CollisionResolver::new(limits),
            generation: 0,
            pending: None,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> EditMode {
        if self.draft.is_some() {
            EditMode::Editing
        } else {
            EditMode::Viewing
        }
    }

    #[must_use]
    pub const fn is_editing(&self) -> bool {
        self.draft.is_some()
    }

    /// Whether a commit is in flight.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub const fn committed(&self) -> &Layout {
        &self.committed
    }

    #[must_use]
    pub const fn draft(&self) -> Option<&Layout> {
        self.draft.as_ref()
    }

    /// The layout to display: the draft while editing, else the committed one.
    #[must_use]
    pub fn view(&self) -> &Layout {
        self.draft.as_ref().unwrap_or(&self.committed)
    }

    #[must_use]
    pub const fn limits(&self) -> &TableLimits {
        self.resolver.limits()
    }

    /// Whether the draft differs from the committed layout.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.draft.as_ref().is_some_and(|draft| draft != &self.committed)
    }

    pub fn enter_edit(&mut self) -> Result<(), SessionError> {
        if self.is_editing() {
            return Err(SessionError::AlreadyEditing);
        }
        self.draft = Some(self.committed.clone());
        self.generation += 1;
        tracing::debug!(
            target: "floorplan.session",
            generation = self.generation,
            "entered edit mode"
        );
        Ok(())
    }

    /// Drop the draft and any in-flight commit, returning to viewing.
    pub fn discard(&mut self) -> Result<(), SessionError> {
        let Some(draft) = self.draft.take() else {
            return Err(SessionError::NotEditing);
        };
        let abandoned_commit = self.pending.take().is_some();
        self.generation += 1;
        tracing::debug!(
            target: "floorplan.session",
            changed = draft != self.committed,
            abandoned_commit,
            "draft discarded"
        );
        Ok(())
    }

    /// Freeze the draft and hand out a ticket for persisting it.
    pub fn begin_commit(&mut self) -> Result<CommitTicket, SessionError> {
        if self.is_busy() {
            return Err(SessionError::Busy);
        }
        let Some(draft) = &self.draft else {
            return Err(SessionError::NotEditing);
        };
        let ticket = CommitTicket {
            generation: self.generation,
            layout: draft.clone(),
        };
        self.pending = Some(self.generation);
        tracing::debug!(
            target: "floorplan.session",
            generation = self.generation,
            "commit started"
        );
        Ok(ticket)
    }

    /// Apply the result of persisting `ticket`.
    ///
    /// On success the ticket's layout becomes the committed layout and the
    /// session returns to viewing. On failure the draft is kept, the session
    /// stays in edit mode and the error is returned. Stale tickets are
    /// ignored.
    pub fn finish_commit(
        &mut self,
        ticket: CommitTicket,
        result: Result<(), StoreError>,
    ) -> Result<CommitOutcome, SessionError> {
        if self.pending != Some(ticket.generation) {
            tracing::debug!(
                target: "floorplan.session",
                ticket = ticket.generation,
                current = self.generation,
                "stale commit result ignored"
            );
            return Ok(CommitOutcome::Ignored);
        }
        self.pending = None;

        match result {
            Ok(()) => {
                self.committed = ticket.layout;
                self.draft = None;
                self.generation += 1;
                tracing::info!(
                    target: "floorplan.session",
                    tables = self.committed.tables.len(),
                    entrances = self.committed.entrances.len(),
                    "layout committed"
                );
                Ok(CommitOutcome::Committed)
            }
            Err(err) => {
                tracing::warn!(
                    target: "floorplan.session",
                    error = %err,
                    "commit failed, draft kept"
                );
                Err(SessionError::Persist(err))
            }
        }
    }

    /// Commit synchronously through `persist`.
    pub fn commit<F>(&mut self, persist: F) -> Result<(), SessionError>
    where
        F: FnOnce(&Layout) -> Result<(), StoreError>,
    {
        let ticket = self.begin_commit()?;
        let result = persist(ticket.layout());
        self.finish_commit(ticket, result).map(|_| ())
    }

    pub fn commit_to<S: LayoutStore + ?Sized>(&mut self, store: &mut S) -> Result<(), SessionError> {
        self.commit(|layout| store.save_layout(layout))
    }

    /// Replace the committed layout with a fresh snapshot from the store.
    ///
    /// Only allowed while viewing; the incoming layout is repaired into a
    /// valid state first.
    pub fn replace_committed(&mut self, mut layout: Layout) -> Result<(), SessionError> {
        if self.is_editing() {
            return Err(SessionError::AlreadyEditing);
        }
        layout.repair();
        self.committed = layout;
        tracing::debug!(target: "floorplan.session", "committed layout reloaded");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Draft edits
    // ---------------------------------------------------------------------

    /// Add a table of `footprint` at the first free position.
    pub fn add_table(&mut self, footprint: Footprint) -> Result<Added<TableId>, SessionError> {
        let resolver = self.resolver;
        let draft = self.draft_mut()?;
        let placement = resolver.place_table(draft, footprint);
        let id = draft.next_table_id();
        let rect = placement.rect;
        draft
            .tables
            .push(Table::new(id.clone(), rect.x, rect.y, rect.width, rect.height));
        tracing::debug!(
            target: "floorplan.session",
            %id,
            x = rect.x,
            y = rect.y,
            width = rect.width,
            height = rect.height,
            "table added"
        );
        Ok(Added {
            id,
            outcome: placement.outcome,
        })
    }

    /// Add a table with the configured default footprint.
    pub fn add_default_table(&mut self) -> Result<Added<TableId>, SessionError> {
        let limits = self.resolver.limits();
        let footprint = Footprint::new(limits.default_width, limits.default_height);
        self.add_table(footprint)
    }

    /// Add a one-cell entrance at the first free perimeter slot.
    pub fn add_entrance(&mut self) -> Result<Added<EntranceId>, SessionError> {
        let resolver = self.resolver;
        let draft = self.draft_mut()?;
        let placement = resolver.place_entrance(draft);
        let id = draft.next_entrance_id();
        draft.entrances.push(Entrance::new(
            id.clone(),
            placement.side,
            placement.offset,
            placement.span,
        ));
        tracing::debug!(
            target: "floorplan.session",
            %id,
            side = %placement.side,
            offset = placement.offset,
            "entrance added"
        );
        Ok(Added {
            id,
            outcome: placement.outcome,
        })
    }

    pub fn delete_entity(&mut self, id: &EntityId) -> Result<(), SessionError> {
        let draft = self.draft_mut()?;
        if !draft.remove(id) {
            return Err(SessionError::UnknownEntity(id.clone()));
        }
        tracing::debug!(target: "floorplan.session", %id, "entity deleted");
        Ok(())
    }

    /// Set a table's display name; a blank name clears it.
    pub fn rename_table(&mut self, id: &TableId, name: &str) -> Result<(), SessionError> {
        let table = self.table_mut(id)?;
        let name = name.trim();
        table.display_name = (!name.is_empty()).then(|| name.to_owned());
        Ok(())
    }

    pub fn set_table_shape(&mut self, id: &TableId, shape: TableShape) -> Result<(), SessionError> {
        self.table_mut(id)?.shape = shape;
        Ok(())
    }

    pub fn set_table_capacity(
        &mut self,
        id: &TableId,
        capacity: Option<u16>,
    ) -> Result<(), SessionError> {
        self.table_mut(id)?.capacity = capacity;
        Ok(())
    }

    /// Resize the draft grid, clamping dimensions into range and every
    /// entity into the new bounds. Returns the number of entities changed.
    pub fn resize_grid(&mut self, columns: u16, rows: u16) -> Result<usize, SessionError> {
        let grid = GridSpec::clamped(columns, rows);
        let draft = self.draft_mut()?;
        let changed = draft.set_grid(grid);
        tracing::debug!(
            target: "floorplan.session",
            columns = grid.columns,
            rows = grid.rows,
            changed,
            "grid resized"
        );
        Ok(changed)
    }

    /// Write a finished gesture's ghost into the draft.
    pub fn apply_ghost(&mut self, ghost: &Ghost) -> Result<(), SessionError> {
        let draft = self.draft_mut()?;
        if !ghost.apply_to(draft) {
            return Err(SessionError::UnknownEntity(ghost.target()));
        }
        Ok(())
    }

    fn draft_mut(&mut self) -> Result<&mut Layout, SessionError> {
        if self.pending.is_some() {
            return Err(SessionError::Busy);
        }
        self.draft.as_mut().ok_or(SessionError::NotEditing)
    }

    fn table_mut(&mut self, id: &TableId) -> Result<&mut Table, SessionError> {
        self.draft_mut()?
            .table_mut(id)
            .ok_or_else(|| SessionError::UnknownEntity(EntityId::Table(id.clone())))
    }
}
