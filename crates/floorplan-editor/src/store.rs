#![forbid(unsafe_code)]

//! Layout persistence.
//!
//! A layout is persisted as two records, mirroring how a backend keeps
//! tables and the floor-plan shell apart:
//!
//! - `tables.json`: array of [`Table`] records (camelCase fields).
//! - `floor_plan.json`: a [`FloorPlanRecord`] with grid size and entrances.
//!
//! # Versioning
//!
//! Floor-plan records carry [`FLOOR_PLAN_SCHEMA_VERSION`]. Records without a
//! version are legacy: they may describe a single door as
//! `doorPosition: { x, width, side? }` instead of an `entrances` list, and
//! are migrated on load. Records newer than this build are rejected.
//!
//! # Partial saves
//!
//! The two writes are not atomic as a pair. When the tables write succeeds
//! and the floor-plan write fails the store returns
//! [`StoreError::PartialSave`]; saving the same layout again converges.

use std::fs;
use std::path::{Path, PathBuf};

use floorplan_core::layout::DEFAULT_ENTRANCE_SPAN;
use floorplan_core::{Entrance, GridSpec, Layout, Side, Table};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Current floor-plan record schema version.
pub const FLOOR_PLAN_SCHEMA_VERSION: u16 = 1;

pub const TABLES_FILE: &str = "tables.json";
pub const FLOOR_PLAN_FILE: &str = "floor_plan.json";

/// Backend that loads and saves whole layouts.
pub trait LayoutStore {
    fn load_layout(&mut self) -> Result<Layout, StoreError>;
    fn save_layout(&mut self, layout: &Layout) -> Result<(), StoreError>;
}

impl<S: LayoutStore + ?Sized> LayoutStore for &mut S {
    fn load_layout(&mut self) -> Result<Layout, StoreError> {
        (**self).load_layout()
    }

    fn save_layout(&mut self, layout: &Layout) -> Result<(), StoreError> {
        (**self).save_layout(layout)
    }
}

// =========================================================================
// Records
// =========================================================================

/// Door description used before entrances became a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyDoorPosition {
    pub x: u16,
    pub width: u16,
    #[serde(default)]
    pub side: Option<Side>,
}

/// Persisted floor-plan shell: grid size and entrances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorPlanRecord {
    /// Missing in legacy records, which read as version 0.
    #[serde(default)]
    pub schema_version: u16,
    #[serde(default = "default_columns")]
    pub columns: u16,
    #[serde(default = "default_rows")]
    pub rows: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrances: Option<Vec<Entrance>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub door_position: Option<LegacyDoorPosition>,
}

fn default_columns() -> u16 {
    GridSpec::default().columns
}

fn default_rows() -> u16 {
    GridSpec::default().rows
}

impl FloorPlanRecord {
    /// Current-version record for `layout`.
    #[must_use]
    pub fn from_layout(layout: &Layout) -> Self {
        Self {
            schema_version: FLOOR_PLAN_SCHEMA_VERSION,
            columns: layout.grid.columns,
            rows: layout.grid.rows,
            entrances: Some(layout.entrances.clone()),
            door_position: None,
        }
    }
}

/// Result of turning stored records into a layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationResult {
    pub layout: Layout,
    pub from_version: u16,
    pub to_version: u16,
    /// Human-readable notes about anything that was converted or repaired.
    pub warnings: Vec<String>,
}

impl MigrationResult {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.from_version == self.to_version
    }
}

/// Assemble a valid layout from a floor-plan record and its tables.
///
/// Legacy door positions become a single `entrance-1`, and the result is
/// always repaired into bounds.
pub fn migrate_floor_plan(
    record: FloorPlanRecord,
    tables: Vec<Table>,
) -> Result<MigrationResult, StoreError> {
    if record.schema_version > FLOOR_PLAN_SCHEMA_VERSION {
        return Err(StoreError::UnsupportedVersion {
            found: record.schema_version,
            supported: FLOOR_PLAN_SCHEMA_VERSION,
        });
    }

    let mut warnings = Vec::new();
    let grid = GridSpec {
        columns: record.columns,
        rows: record.rows,
    };

    let entrances = match (record.entrances, record.door_position) {
        (Some(entrances), _) => entrances,
        (None, Some(door)) => {
            let side = door.side.unwrap_or(Side::Top);
            warnings.push(format!(
                "converted legacy door position (x {}, width {}) to entrance-1 on {side}",
                door.x, door.width
            ));
            vec![Entrance::new("entrance-1", side, door.x, door.width)]
        }
        (None, None) => {
            warnings.push("record has no entrances; using a centered default".to_owned());
            Layout::with_centered_entrance(
                GridSpec::clamped(grid.columns, grid.rows),
                DEFAULT_ENTRANCE_SPAN,
            )
            .entrances
        }
    };

    let mut layout = Layout {
        grid,
        tables,
        entrances,
    };
    let report = layout.invariant_report();
    if !report.is_valid() {
        let summary = layout.repair();
        warnings.push(format!(
            "repaired {} issue(s): grid changed {}, dropped {} duplicate(s), clamped {} entit(ies)",
            report.issues.len(),
            summary.grid_changed,
            summary.dropped_duplicates,
            summary.clamped_entities
        ));
    }

    for warning in &warnings {
        tracing::warn!(
            target: "floorplan.store",
            from_version = record.schema_version,
            "{warning}"
        );
    }

    Ok(MigrationResult {
        layout,
        from_version: record.schema_version,
        to_version: FLOOR_PLAN_SCHEMA_VERSION,
        warnings,
    })
}

// =========================================================================
// In-memory store
// =========================================================================

/// Store kept in memory, with injectable failures for exercising error
/// paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryLayoutStore {
    layout: Option<Layout>,
    failing_saves: usize,
    failing_loads: usize,
    saves: usize,
}

impl MemoryLayoutStore {
    #[must_use]
    pub fn new(layout: Layout) -> Self {
        Self {
            layout: Some(layout),
            ..Self::default()
        }
    }

    /// Make the next `count` saves fail with [`StoreError::Unavailable`].
    pub fn fail_next_saves(&mut self, count: usize) {
        self.failing_saves = count;
    }

    /// Make the next `count` loads fail with [`StoreError::Unavailable`].
    pub fn fail_next_loads(&mut self, count: usize) {
        self.failing_loads = count;
    }

    /// Most recently saved (or seeded) layout.
    #[must_use]
    pub fn stored(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    /// Number of successful saves.
    #[must_use]
    pub const fn save_count(&self) -> usize {
        self.saves
    }
}

impl LayoutStore for MemoryLayoutStore {
    fn load_layout(&mut self) -> Result<Layout, StoreError> {
        if self.failing_loads > 0 {
            self.failing_loads -= 1;
            return Err(StoreError::unavailable("injected load failure"));
        }
        Ok(self.layout.clone().unwrap_or_default())
    }

    fn save_layout(&mut self, layout: &Layout) -> Result<(), StoreError> {
        if self.failing_saves > 0 {
            self.failing_saves -= 1;
            return Err(StoreError::unavailable("injected save failure"));
        }
        self.layout = Some(layout.clone());
        self.saves += 1;
        Ok(())
    }
}

// =========================================================================
// JSON directory store
// =========================================================================

/// Store backed by a directory holding `tables.json` and `floor_plan.json`.
#[derive(Debug, Clone)]
pub struct JsonDirLayoutStore {
    dir: PathBuf,
    default_layout: Layout,
}

impl JsonDirLayoutStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            default_layout: Layout::default(),
        }
    }

    /// Layout returned when the directory holds no floor-plan record yet.
    #[must_use]
    pub fn with_default_layout(mut self, layout: Layout) -> Self {
        self.default_layout = layout;
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn tables_path(&self) -> PathBuf {
        self.dir.join(TABLES_FILE)
    }

    #[must_use]
    pub fn floor_plan_path(&self) -> PathBuf {
        self.dir.join(FLOOR_PLAN_FILE)
    }

    /// Load and migrate, returning the migration details.
    pub fn load_with_report(&self) -> Result<MigrationResult, StoreError> {
        let tables: Vec<Table> = read_json(&self.tables_path(), TABLES_FILE)?.unwrap_or_default();
        let record: Option<FloorPlanRecord> = read_json(&self.floor_plan_path(), FLOOR_PLAN_FILE)?;

        let Some(record) = record else {
            let mut layout = self.default_layout.clone();
            layout.tables = tables;
            let report = layout.invariant_report();
            let mut warnings = Vec::new();
            if !report.is_valid() {
                layout.repair();
                warnings.push(format!(
                    "repaired {} issue(s) in tables without a floor plan record",
                    report.issues.len()
                ));
            }
            tracing::debug!(
                target: "floorplan.store",
                dir = %self.dir.display(),
                "no floor plan record, using default layout"
            );
            return Ok(MigrationResult {
                layout,
                from_version: FLOOR_PLAN_SCHEMA_VERSION,
                to_version: FLOOR_PLAN_SCHEMA_VERSION,
                warnings,
            });
        };

        migrate_floor_plan(record, tables)
    }
}

impl LayoutStore for JsonDirLayoutStore {
    fn load_layout(&mut self) -> Result<Layout, StoreError> {
        let result = self.load_with_report()?;
        tracing::info!(
            target: "floorplan.store",
            dir = %self.dir.display(),
            tables = result.layout.tables.len(),
            entrances = result.layout.entrances.len(),
            migrated = !result.is_clean(),
            "layout loaded"
        );
        Ok(result.layout)
    }

    fn save_layout(&mut self, layout: &Layout) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        write_json_atomic(&self.tables_path(), TABLES_FILE, &layout.tables)?;
        let record = FloorPlanRecord::from_layout(layout);
        if let Err(err) = write_json_atomic(&self.floor_plan_path(), FLOOR_PLAN_FILE, &record) {
            tracing::warn!(
                target: "floorplan.store",
                dir = %self.dir.display(),
                error = %err,
                "tables saved but floor plan record failed"
            );
            return Err(StoreError::PartialSave {
                source: Box::new(err),
            });
        }

        tracing::info!(
            target: "floorplan.store",
            dir = %self.dir.display(),
            tables = layout.tables.len(),
            entrances = layout.entrances.len(),
            "layout saved"
        );
        Ok(())
    }
}

/// Read a JSON file, treating a missing file as `None`.
fn read_json<T: DeserializeOwned>(path: &Path, what: &'static str) -> Result<Option<T>, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| StoreError::Json { what, source })
}

/// Write pretty JSON to a sibling temp file, then rename over `path`.
fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    what: &'static str,
    value: &T,
) -> Result<(), StoreError> {
    let mut content =
        serde_json::to_string_pretty(value).map_err(|source| StoreError::Json { what, source })?;
    content.push('\n');

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content).map_err(|source| StoreError::Io {
        path: tmp.clone(),
        source,
    })?;
    if let Err(source) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorplan_core::LayoutIssueCode;

    fn sample_layout() -> Layout {
        let mut layout = Layout::default();
        layout
            .tables
            .push(Table::new("T1", 1, 1, 2, 1).with_name("Window"));
        layout.tables.push(Table::new("T2", 4, 3, 1, 1));
        layout
            .entrances
            .push(Entrance::new("entrance-2", Side::Left, 3, 1));
        layout
    }

    #[test]
    fn json_dir_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = JsonDirLayoutStore::new(dir.path());
        let layout = sample_layout();
        store.save_layout(&layout).expect("save");
        assert_eq!(store.load_layout().expect("load"), layout);
        assert!(!store.dir().join("tables.json.tmp").exists());
    }

    #[test]
    fn empty_dir_loads_default_layout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = JsonDirLayoutStore::new(dir.path().join("missing"));
        assert_eq!(store.load_layout().expect("load"), Layout::default());
    }

    #[test]
    fn legacy_door_position_migrates_to_entrance() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join(FLOOR_PLAN_FILE),
            r#"{"columns":10,"rows":6,"doorPosition":{"x":3,"width":2}}"#,
        )
        .expect("write record");
        let store = JsonDirLayoutStore::new(dir.path());
        let result = store.load_with_report().expect("load");
        assert_eq!(result.from_version, 0);
        assert_eq!(result.to_version, FLOOR_PLAN_SCHEMA_VERSION);
        assert_eq!(
            result.layout.entrances,
            vec![Entrance::new("entrance-1", Side::Top, 3, 2)]
        );
        assert!(!result.is_clean());
    }

    #[test]
    fn legacy_door_is_clamped_into_grid() {
        let record = FloorPlanRecord {
            schema_version: 0,
            columns: 8,
            rows: 6,
            entrances: None,
            door_position: Some(LegacyDoorPosition {
                x: 7,
                width: 3,
                side: Some(Side::Bottom),
            }),
        };
        let result = migrate_floor_plan(record, Vec::new()).expect("migrate");
        assert_eq!(
            result.layout.entrances,
            vec![Entrance::new("entrance-1", Side::Bottom, 5, 3)]
        );
        assert!(result.layout.invariant_report().is_valid());
    }

    #[test]
    fn newer_schema_is_rejected() {
        let record = FloorPlanRecord {
            schema_version: FLOOR_PLAN_SCHEMA_VERSION + 1,
            ..FloorPlanRecord::from_layout(&Layout::default())
        };
        assert!(matches!(
            migrate_floor_plan(record, Vec::new()),
            Err(StoreError::UnsupportedVersion { found: 2, supported: 1 })
        ));
    }

    #[test]
    fn out_of_bounds_tables_are_repaired_on_load() {
        let record = FloorPlanRecord::from_layout(&Layout::default());
        let tables = vec![Table::new("T1", 11, 7, 3, 2)];
        let mut broken = Layout::default();
        broken.tables = tables.clone();
        assert!(broken.invariant_report().has(LayoutIssueCode::TableOutOfBounds));

        let result = migrate_floor_plan(record, tables).expect("migrate");
        assert!(result.layout.invariant_report().is_valid());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn malformed_tables_file_is_a_json_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join(TABLES_FILE), "[{").expect("write");
        let mut store = JsonDirLayoutStore::new(dir.path());
        assert!(matches!(
            store.load_layout(),
            Err(StoreError::Json { what: TABLES_FILE, .. })
        ));
    }

    #[test]
    fn failed_second_write_is_partial_and_retry_converges() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = JsonDirLayoutStore::new(dir.path());
        // A directory in the record's place makes the rename fail.
        let blocker = store.floor_plan_path();
        fs::create_dir(&blocker).expect("blocker dir");
        fs::write(blocker.join("keep"), "x").expect("blocker content");

        let layout = sample_layout();
        let err = store.save_layout(&layout).expect_err("second write fails");
        assert!(matches!(err, StoreError::PartialSave { .. }));
        assert!(store.tables_path().exists());

        fs::remove_dir_all(&blocker).expect("remove blocker");
        store.save_layout(&layout).expect("retry");
        assert_eq!(store.load_layout().expect("load"), layout);
    }

    #[test]
    fn memory_store_injects_failures() {
        let mut store = MemoryLayoutStore::new(sample_layout());
        store.fail_next_saves(1);
        assert!(store.save_layout(&Layout::default()).is_err());
        assert_eq!(store.stored(), Some(&sample_layout()));
        store.save_layout(&Layout::default()).expect("second save");
        assert_eq!(store.save_count(), 1);

        store.fail_next_loads(1);
        assert!(matches!(
            store.load_layout(),
            Err(StoreError::Unavailable { .. })
        ));
        assert_eq!(store.load_layout().expect("load"), Layout::default());
    }

    #[test]
    fn record_serializes_camel_case() {
        let json = serde_json::to_value(FloorPlanRecord::from_layout(&Layout::default()))
            .expect("serialize");
        assert_eq!(json["schemaVersion"], 1);
        assert!(json.get("doorPosition").is_none());
        assert_eq!(json["entrances"][0]["side"], "top");
    }
}
