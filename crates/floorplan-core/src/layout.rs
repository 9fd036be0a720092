#![forbid(unsafe_code)]

//! The persisted floor-plan layout and its structural invariants.
//!
//! A [`Layout`] is the unit of persistence: grid dimensions plus every table
//! and entrance. Geometry violations are never errors in the editor; they are
//! clamped. [`Layout::invariant_report`] exists for data arriving from
//! outside (a store, a migration, a hand-edited file) and
//! [`Layout::repair`] brings such data back into a valid state.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, Entrance, EntranceId, Side, Table, TableId};
use crate::geometry::{GridSpec, clamp_axis, clamp_rect};

/// Id prefix for generated table ids (`T1`, `T2`, ...).
pub const TABLE_ID_PREFIX: &str = "T";

/// Id prefix for generated entrance ids (`entrance-1`, ...).
pub const ENTRANCE_ID_PREFIX: &str = "entrance-";

/// Span of the entrance in a freshly created layout.
pub const DEFAULT_ENTRANCE_SPAN: u16 = 2;

/// Grid dimensions, tables and entrances of one floor plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub grid: GridSpec,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub entrances: Vec<Entrance>,
}

impl Default for Layout {
    /// A 12x8 grid with no tables and a single top-centered entrance.
    fn default() -> Self {
        Self::with_centered_entrance(GridSpec::default(), DEFAULT_ENTRANCE_SPAN)
    }
}

impl Layout {
    /// An empty layout (no tables, no entrances).
    #[must_use]
    pub fn empty(grid: GridSpec) -> Self {
        Self {
            grid,
            tables: Vec::new(),
            entrances: Vec::new(),
        }
    }

    /// An empty layout with one entrance centered on the top edge.
    #[must_use]
    pub fn with_centered_entrance(grid: GridSpec, span: u16) -> Self {
        let span = span.clamp(1, grid.columns);
        let offset = (grid.columns - span) / 2;
        Self {
            grid,
            tables: Vec::new(),
            entrances: vec![Entrance::new(
                format!("{ENTRANCE_ID_PREFIX}1"),
                Side::Top,
                offset,
                span,
            )],
        }
    }

    #[must_use]
    pub fn table(&self, id: &TableId) -> Option<&Table> {
        self.tables.iter().find(|t| &t.id == id)
    }

    #[must_use]
    pub fn table_mut(&mut self, id: &TableId) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| &t.id == id)
    }

    #[must_use]
    pub fn entrance(&self, id: &EntranceId) -> Option<&Entrance> {
        self.entrances.iter().find(|e| &e.id == id)
    }

    #[must_use]
    pub fn entrance_mut(&mut self, id: &EntranceId) -> Option<&mut Entrance> {
        self.entrances.iter_mut().find(|e| &e.id == id)
    }

    /// Whether the layout contains the referenced entity.
    #[must_use]
    pub fn contains(&self, id: &EntityId) -> bool {
        match id {
            EntityId::Table(id) => self.table(id).is_some(),
            EntityId::Entrance(id) => self.entrance(id).is_some(),
        }
    }

    /// Remove an entity, returning whether it existed.
    pub fn remove(&mut self, id: &EntityId) -> bool {
        match id {
            EntityId::Table(id) => {
                let before = self.tables.len();
                self.tables.retain(|t| &t.id != id);
                self.tables.len() != before
            }
            EntityId::Entrance(id) => {
                let before = self.entrances.len();
                self.entrances.retain(|e| &e.id != id);
                self.entrances.len() != before
            }
        }
    }

    /// First unused table id of the form `T{n}`, `n >= 1`.
    #[must_use]
    pub fn next_table_id(&self) -> TableId {
        let taken: HashSet<&str> = self.tables.iter().map(|t| t.id.as_str()).collect();
        TableId::new(first_free(TABLE_ID_PREFIX, &taken))
    }

    /// First unused entrance id of the form `entrance-{n}`, `n >= 1`.
    #[must_use]
    pub fn next_entrance_id(&self) -> EntranceId {
        let taken: HashSet<&str> = self.entrances.iter().map(|e| e.id.as_str()).collect();
        EntranceId::new(first_free(ENTRANCE_ID_PREFIX, &taken))
    }

    /// Replace the grid and re-clamp every entity into the new bounds.
    ///
    /// Entities that no longer fit are shrunk and moved, never removed.
    /// Returns the number of entities that changed.
    pub fn set_grid(&mut self, grid: GridSpec) -> usize {
        self.grid = grid;
        self.clamp_entities()
    }

    /// Check structural invariants.
    #[must_use]
    pub fn invariant_report(&self) -> LayoutInvariantReport {
        let mut issues = Vec::new();
        let bounds = self.grid.bounds();

        if !self.grid.is_in_range() {
            issues.push(LayoutIssue {
                code: LayoutIssueCode::GridOutOfRange,
                entity: None,
                message: format!(
                    "grid {}x{} outside supported range",
                    self.grid.columns, self.grid.rows
                ),
            });
        }

        let mut seen_tables = HashSet::new();
        for table in &self.tables {
            let entity = Some(EntityId::Table(table.id.clone()));
            if !seen_tables.insert(&table.id) {
                issues.push(LayoutIssue {
                    code: LayoutIssueCode::DuplicateTableId,
                    entity: entity.clone(),
                    message: format!("table id {} appears more than once", table.id),
                });
            }
            if table.width == 0 || table.height == 0 {
                issues.push(LayoutIssue {
                    code: LayoutIssueCode::TableZeroSize,
                    entity: entity.clone(),
                    message: format!(
                        "table {} has empty footprint {}x{}",
                        table.id, table.width, table.height
                    ),
                });
            } else if !bounds.contains_rect(&table.rect()) {
                issues.push(LayoutIssue {
                    code: LayoutIssueCode::TableOutOfBounds,
                    entity,
                    message: format!(
                        "table {} at ({}, {}) size {}x{} exceeds grid {}x{}",
                        table.id,
                        table.x,
                        table.y,
                        table.width,
                        table.height,
                        self.grid.columns,
                        self.grid.rows
                    ),
                });
            }
        }

        let mut seen_entrances = HashSet::new();
        for entrance in &self.entrances {
            let entity = Some(EntityId::Entrance(entrance.id.clone()));
            if !seen_entrances.insert(&entrance.id) {
                issues.push(LayoutIssue {
                    code: LayoutIssueCode::DuplicateEntranceId,
                    entity: entity.clone(),
                    message: format!("entrance id {} appears more than once", entrance.id),
                });
            }
            if entrance.span == 0 {
                issues.push(LayoutIssue {
                    code: LayoutIssueCode::EntranceZeroSpan,
                    entity,
                    message: format!("entrance {} has zero span", entrance.id),
                });
            } else if !entrance.fits(self.grid) {
                issues.push(LayoutIssue {
                    code: LayoutIssueCode::EntranceOutOfBounds,
                    entity,
                    message: format!(
                        "entrance {} segment [{}, {}) exceeds {} edge length {}",
                        entrance.id,
                        entrance.offset,
                        entrance.end(),
                        entrance.side,
                        self.grid.edge_length(entrance.side)
                    ),
                });
            }
        }

        LayoutInvariantReport { issues }
    }

    /// Bring the layout back into a valid state.
    ///
    /// The grid is clamped into range, later duplicates of an id are dropped,
    /// and every remaining entity is clamped into bounds.
    pub fn repair(&mut self) -> LayoutRepairSummary {
        let grid_changed = {
            let clamped = GridSpec::clamped(self.grid.columns, self.grid.rows);
            let changed = clamped != self.grid;
            self.grid = clamped;
            changed
        };

        let mut seen = HashSet::new();
        let before = self.tables.len();
        self.tables.retain(|t| seen.insert(t.id.clone()));
        let mut dropped_duplicates = before - self.tables.len();

        let mut seen = HashSet::new();
        let before = self.entrances.len();
        self.entrances.retain(|e| seen.insert(e.id.clone()));
        dropped_duplicates += before - self.entrances.len();

        let clamped_entities = self.clamp_entities();

        let summary = LayoutRepairSummary {
            grid_changed,
            dropped_duplicates,
            clamped_entities,
        };
        if !summary.is_noop() {
            tracing::warn!(
                target: "floorplan.layout",
                grid_changed,
                dropped_duplicates,
                clamped_entities,
                "layout repaired"
            );
        }
        summary
    }

    /// Deterministic FNV-1a hash of the layout contents.
    ///
    /// Two layouts hash equal exactly when they compare equal, modulo
    /// collisions; intended for change detection and diagnostics.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0000_0001_0000_01b3;

        fn mix_bytes(hash: &mut u64, bytes: &[u8]) {
            for byte in bytes {
                *hash ^= u64::from(*byte);
                *hash = hash.wrapping_mul(PRIME);
            }
        }

        fn mix_u16(hash: &mut u64, value: u16) {
            mix_bytes(hash, &value.to_le_bytes());
        }

        fn mix_str(hash: &mut u64, value: &str) {
            mix_bytes(hash, &(value.len() as u64).to_le_bytes());
            mix_bytes(hash, value.as_bytes());
        }

        let mut hash = OFFSET_BASIS;
        mix_u16(&mut hash, self.grid.columns);
        mix_u16(&mut hash, self.grid.rows);

        mix_bytes(&mut hash, &(self.tables.len() as u64).to_le_bytes());
        for table in &self.tables {
            mix_str(&mut hash, table.id.as_str());
            match &table.display_name {
                Some(name) => {
                    mix_bytes(&mut hash, &[1]);
                    mix_str(&mut hash, name);
                }
                None => mix_bytes(&mut hash, &[0]),
            }
            for value in [table.x, table.y, table.width, table.height] {
                mix_u16(&mut hash, value);
            }
            mix_bytes(&mut hash, &[table.shape as u8]);
            match table.capacity {
                Some(capacity) => {
                    mix_bytes(&mut hash, &[1]);
                    mix_u16(&mut hash, capacity);
                }
                None => mix_bytes(&mut hash, &[0]),
            }
        }

        mix_bytes(&mut hash, &(self.entrances.len() as u64).to_le_bytes());
        for entrance in &self.entrances {
            mix_str(&mut hash, entrance.id.as_str());
            mix_bytes(&mut hash, &[entrance.side as u8]);
            mix_u16(&mut hash, entrance.offset);
            mix_u16(&mut hash, entrance.span);
        }

        hash
    }

    fn clamp_entities(&mut self) -> usize {
        let grid = self.grid;
        let tables = self
            .tables
            .iter_mut()
            .map(|table| clamp_table_into(table, grid))
            .filter(|&changed| changed)
            .count();
        let entrances = self
            .entrances
            .iter_mut()
            .map(|entrance| clamp_entrance_into(entrance, grid))
            .filter(|&changed| changed)
            .count();
        tables + entrances
    }
}

/// Clamp a table's footprint and origin into `grid`. Returns whether it changed.
pub fn clamp_table_into(table: &mut Table, grid: GridSpec) -> bool {
    let width = table.width.clamp(1, grid.columns.max(1));
    let height = table.height.clamp(1, grid.rows.max(1));
    let (x, y) = clamp_rect(i32::from(table.x), i32::from(table.y), width, height, grid);
    let changed = (x, y, width, height) != (table.x, table.y, table.width, table.height);
    table.x = x;
    table.y = y;
    table.width = width;
    table.height = height;
    changed
}

/// Clamp an entrance's span and offset onto its edge. Returns whether it changed.
pub fn clamp_entrance_into(entrance: &mut Entrance, grid: GridSpec) -> bool {
    let edge = grid.edge_length(entrance.side).max(1);
    let span = entrance.span.clamp(1, edge);
    let offset = clamp_axis(i32::from(entrance.offset), edge - span);
    let changed = (offset, span) != (entrance.offset, entrance.span);
    entrance.offset = offset;
    entrance.span = span;
    changed
}

fn first_free(prefix: &str, taken: &HashSet<&str>) -> String {
    (1u32..)
        .map(|n| format!("{prefix}{n}"))
        .find(|candidate| !taken.contains(candidate.as_str()))
        .unwrap_or_else(|| prefix.to_owned())
}

/// Stable code for layout invariant findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutIssueCode {
    GridOutOfRange,
    DuplicateTableId,
    DuplicateEntranceId,
    TableZeroSize,
    TableOutOfBounds,
    EntranceZeroSpan,
    EntranceOutOfBounds,
}

/// One invariant finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutIssue {
    pub code: LayoutIssueCode,
    pub entity: Option<EntityId>,
    pub message: String,
}

/// Structured invariant report over a layout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LayoutInvariantReport {
    pub issues: Vec<LayoutIssue>,
}

impl LayoutInvariantReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    #[must_use]
    pub fn has(&self, code: LayoutIssueCode) -> bool {
        self.issues.iter().any(|issue| issue.code == code)
    }
}

/// What [`Layout::repair`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutRepairSummary {
    pub grid_changed: bool,
    pub dropped_duplicates: usize,
    pub clamped_entities: usize,
}

impl LayoutRepairSummary {
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        !self.grid_changed && self.dropped_duplicates == 0 && self.clamped_entities == 0
    }
}
