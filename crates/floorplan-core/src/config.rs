#![forbid(unsafe_code)]

//! Editor tuning as data.
//!
//! [`EditorConfig`] groups every tunable of the floor-plan editor so hosts
//! can ship it as a TOML or JSON file instead of recompiling.
//!
//! ```toml
//! # floorplan.toml
//! [cell_size]
//! min_px = 24
//! max_px = 96
//!
//! [table]
//! max_width = 5
//! ```
//!
//! Every field has a default, so partial files are fine and
//! `EditorConfig::default()` matches the built-in behavior.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geometry::{CellSizeBounds, GRID_MAX, GRID_MIN, GridSpec};
use crate::layout::Layout;

/// Top-level editor configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub cell_size: CellSizeConfig,
    pub table: TableLimits,
    pub grid: GridDefaults,
    pub entrance: EntranceDefaults,
}

impl EditorConfig {
    /// Parse from a TOML string and validate.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validated()
    }

    /// Parse from a JSON string and validate.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validated()
    }

    /// Load from disk; `.json` files are read as JSON, anything else as TOML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Check every parameter, returning one message per problem.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.cell_size.min_px == 0 {
            errors.push("cell_size.min_px must be > 0".into());
        }
        if self.cell_size.min_px > self.cell_size.max_px {
            errors.push(format!(
                "cell_size.min_px ({}) must not exceed cell_size.max_px ({})",
                self.cell_size.min_px, self.cell_size.max_px
            ));
        }

        let t = &self.table;
        if t.max_width == 0 || t.max_height == 0 {
            errors.push("table.max_width and table.max_height must be > 0".into());
        }
        if t.default_width == 0 || t.default_width > t.max_width {
            errors.push(format!(
                "table.default_width must be in 1..={}, got {}",
                t.max_width, t.default_width
            ));
        }
        if t.default_height == 0 || t.default_height > t.max_height {
            errors.push(format!(
                "table.default_height must be in 1..={}, got {}",
                t.max_height, t.default_height
            ));
        }

        let g = &self.grid;
        for (name, value) in [("columns", g.default_columns), ("rows", g.default_rows)] {
            if !(GRID_MIN..=GRID_MAX).contains(&value) {
                errors.push(format!(
                    "grid.default_{name} must be in {GRID_MIN}..={GRID_MAX}, got {value}"
                ));
            }
        }

        if self.entrance.default_span == 0 {
            errors.push("entrance.default_span must be > 0".into());
        }

        errors
    }

    fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::invalid(errors.join("; ")))
        }
    }

    /// Layout used when the store has nothing yet.
    #[must_use]
    pub fn default_layout(&self) -> Layout {
        Layout::with_centered_entrance(self.grid.spec(), self.entrance.default_span)
    }
}

/// Bounds for the derived cell size, plus the canvas margin in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellSizeConfig {
    pub min_px: u32,
    pub max_px: u32,
    pub margin_px: u32,
}

impl Default for CellSizeConfig {
    fn default() -> Self {
        let bounds = CellSizeBounds::default();
        Self {
            min_px: bounds.min_px,
            max_px: bounds.max_px,
            margin_px: 16,
        }
    }
}

impl CellSizeConfig {
    #[must_use]
    pub const fn bounds(&self) -> CellSizeBounds {
        CellSizeBounds {
            min_px: self.min_px,
            max_px: self.max_px,
        }
    }
}

/// Table footprint limits and placement defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableLimits {
    /// Widest table a resize may produce.
    pub max_width: u16,
    /// Tallest table a resize may produce.
    pub max_height: u16,
    pub default_width: u16,
    pub default_height: u16,
    /// Cells kept free along the perimeter when placing new tables.
    pub placement_margin: u16,
}

impl Default for TableLimits {
    fn default() -> Self {
        Self {
            max_width: 4,
            max_height: 3,
            default_width: 2,
            default_height: 1,
            placement_margin: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridDefaults {
    pub default_columns: u16,
    pub default_rows: u16,
}

impl Default for GridDefaults {
    fn default() -> Self {
        let grid = GridSpec::default();
        Self {
            default_columns: grid.columns,
            default_rows: grid.rows,
        }
    }
}

impl GridDefaults {
    #[must_use]
    pub fn spec(&self) -> GridSpec {
        GridSpec::clamped(self.default_columns, self.default_rows)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntranceDefaults {
    pub default_span: u16,
}

impl Default for EntranceDefaults {
    fn default() -> Self {
        Self {
            default_span: crate::layout::DEFAULT_ENTRANCE_SPAN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EditorConfig::default().validate().is_empty());
        assert_eq!(EditorConfig::default().default_layout(), Layout::default());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EditorConfig::from_toml_str(
            r#"
            [table]
            max_width = 5

            [grid]
            default_columns = 16
            "#,
        )
        .expect("valid toml");
        assert_eq!(config.table.max_width, 5);
        assert_eq!(config.table.max_height, 3);
        assert_eq!(config.grid.spec(), GridSpec::new(16, 8).expect("in range"));
        assert_eq!(config.cell_size, CellSizeConfig::default());
    }

    #[test]
    fn json_is_accepted() {
        let config = EditorConfig::from_json_str(r#"{"cell_size":{"min_px":20,"max_px":60}}"#)
            .expect("valid json");
        assert_eq!(config.cell_size.bounds().min_px, 20);
        assert_eq!(config.cell_size.margin_px, 16);
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = EditorConfig::from_toml_str(
            r#"
            [cell_size]
            min_px = 200
            max_px = 100

            [grid]
            default_rows = 40
            "#,
        )
        .expect_err("inverted bounds");
        let message = err.to_string();
        assert!(message.contains("cell_size.min_px"), "{message}");
        assert!(message.contains("grid.default_rows"), "{message}");
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = EditorConfig::from_toml_str("[table\nmax_width = ").expect_err("malformed");
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn from_file_dispatches_on_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let toml_path = dir.path().join("floorplan.toml");
        std::fs::write(&toml_path, "[entrance]\ndefault_span = 3\n").expect("write toml");
        let json_path = dir.path().join("floorplan.json");
        std::fs::write(&json_path, r#"{"entrance":{"default_span":1}}"#).expect("write json");

        assert_eq!(
            EditorConfig::from_file(&toml_path)
                .expect("toml file")
                .entrance
                .default_span,
            3
        );
        assert_eq!(
            EditorConfig::from_file(&json_path)
                .expect("json file")
                .entrance
                .default_span,
            1
        );
        assert!(matches!(
            EditorConfig::from_file(dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
