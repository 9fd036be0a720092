#![forbid(unsafe_code)]

use std::io::Write;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use floorplan_core::{
    EditorConfig, Footprint, GridSpec, Layout, PlacementOutcome, TableId, TableShape,
};
use floorplan_editor::{EditSession, JsonDirLayoutStore, LayoutStore};

use crate::error::{CliError, Result};
use crate::render::{render_grid, render_legend};

#[derive(Debug, Parser)]
#[command(
    name = "floorplan",
    about = "Inspect and edit restaurant floor-plan layouts",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Directory holding tables.json and floor_plan.json.
    #[arg(long, global = true, default_value = ".")]
    pub dir: PathBuf,

    /// Editor config file (TOML, or JSON by extension).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write a fresh default layout.
    Init(InitArgs),

    /// Print the layout as a text grid.
    Show(ShowArgs),

    /// Check stored records, reporting migrations and repairs.
    Validate,

    /// Add a table at the first free position.
    #[command(name = "add-table")]
    AddTable(AddTableArgs),

    /// Add a one-cell entrance at the first free perimeter slot.
    #[command(name = "add-entrance")]
    AddEntrance,

    /// Change grid dimensions, clamping every entity into the new bounds.
    #[command(name = "resize-grid")]
    ResizeGrid(ResizeGridArgs),

    /// Set or clear a table's display name.
    #[command(name = "rename-table")]
    RenameTable(RenameTableArgs),
}

#[derive(Debug, Clone, Args)]
pub struct InitArgs {
    #[arg(long)]
    pub columns: Option<u16>,
    #[arg(long)]
    pub rows: Option<u16>,
    /// Overwrite an existing floor plan.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ShowArgs {
    /// Print the layout as JSON instead of a grid.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShapeArg {
    Square,
    Round,
}

impl From<ShapeArg> for TableShape {
    fn from(shape: ShapeArg) -> Self {
        match shape {
            ShapeArg::Square => TableShape::Square,
            ShapeArg::Round => TableShape::Round,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct AddTableArgs {
    #[arg(long)]
    pub width: Option<u16>,
    #[arg(long)]
    pub height: Option<u16>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long, value_enum)]
    pub shape: Option<ShapeArg>,
    #[arg(long)]
    pub capacity: Option<u16>,
}

#[derive(Debug, Clone, Args)]
pub struct ResizeGridArgs {
    #[arg(long)]
    pub columns: u16,
    #[arg(long)]
    pub rows: u16,
}

#[derive(Debug, Clone, Args)]
pub struct RenameTableArgs {
    pub id: String,
    /// New name; omit or pass an empty string to clear it.
    #[arg(default_value = "")]
    pub name: String,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    crate::logging::init(cli.global.log_json);
    let stdout = std::io::stdout();
    run(cli, &mut stdout.lock())
}

pub fn run(cli: Cli, out: &mut dyn Write) -> Result<()> {
    let config = match &cli.global.config {
        Some(path) => EditorConfig::from_file(path)?,
        None => EditorConfig::default(),
    };
    let mut store =
        JsonDirLayoutStore::new(&cli.global.dir).with_default_layout(config.default_layout());

    match cli.command {
        Commands::Init(args) => run_init(&args, &config, &mut store, out),
        Commands::Show(args) => run_show(&args, &mut store, out),
        Commands::Validate => run_validate(&store, out),
        Commands::AddTable(args) => run_add_table(&args, &config, &mut store, out),
        Commands::AddEntrance => edit(&config, &mut store, out, |session, out| {
            let added = session.add_entrance()?;
            let entrance = session
                .view()
                .entrance(&added.id)
                .map(|e| (e.side, e.offset));
            if let Some((side, offset)) = entrance {
                writeln!(out, "added {} on {side} at {offset}", added.id)?;
            }
            report_fallback(added.outcome, out)
        }),
        Commands::ResizeGrid(args) => edit(&config, &mut store, out, |session, out| {
            let changed = session.resize_grid(args.columns, args.rows)?;
            let grid = session.view().grid;
            writeln!(
                out,
                "grid is now {}x{} ({changed} entit(ies) moved or shrunk)",
                grid.columns, grid.rows
            )?;
            Ok(())
        }),
        Commands::RenameTable(args) => edit(&config, &mut store, out, |session, out| {
            let id = TableId::new(args.id.as_str());
            session.rename_table(&id, &args.name)?;
            let label = session.view().table(&id).map(|t| t.label().to_owned());
            writeln!(out, "{id} is now shown as {}", label.unwrap_or_default())?;
            Ok(())
        }),
    }
}

/// Load, edit in a session, and commit back to the store.
fn edit<F>(
    config: &EditorConfig,
    store: &mut JsonDirLayoutStore,
    out: &mut dyn Write,
    f: F,
) -> Result<()>
where
    F: FnOnce(&mut EditSession, &mut dyn Write) -> Result<()>,
{
    let mut session = EditSession::with_limits(store.load_layout()?, config.table);
    session.enter_edit()?;
    f(&mut session, out)?;
    session.commit_to(store)?;
    Ok(())
}

fn report_fallback(outcome: PlacementOutcome, out: &mut dyn Write) -> Result<()> {
    if outcome == PlacementOutcome::Fallback {
        writeln!(out, "warning: no free space, placed at the fallback position")?;
    }
    Ok(())
}

fn run_init(
    args: &InitArgs,
    config: &EditorConfig,
    store: &mut JsonDirLayoutStore,
    out: &mut dyn Write,
) -> Result<()> {
    let path = store.floor_plan_path();
    if path.exists() && !args.force {
        return Err(CliError::AlreadyInitialized { path });
    }
    let mut layout = config.default_layout();
    if args.columns.is_some() || args.rows.is_some() {
        let grid = GridSpec::clamped(
            args.columns.unwrap_or(layout.grid.columns),
            args.rows.unwrap_or(layout.grid.rows),
        );
        layout = Layout::with_centered_entrance(grid, config.entrance.default_span);
    }
    store.save_layout(&layout)?;
    writeln!(
        out,
        "initialized {}x{} floor plan in {}",
        layout.grid.columns,
        layout.grid.rows,
        store.dir().display()
    )?;
    Ok(())
}

fn run_show(args: &ShowArgs, store: &mut JsonDirLayoutStore, out: &mut dyn Write) -> Result<()> {
    let layout = store.load_layout()?;
    if args.json {
        serde_json::to_writer_pretty(&mut *out, &layout)?;
        writeln!(out)?;
    } else {
        write!(out, "{}", render_grid(&layout))?;
        write!(out, "{}", render_legend(&layout))?;
    }
    Ok(())
}

fn run_validate(store: &JsonDirLayoutStore, out: &mut dyn Write) -> Result<()> {
    let result = store.load_with_report()?;
    if result.is_clean() {
        writeln!(
            out,
            "ok: {} table(s), {} entrance(s)",
            result.layout.tables.len(),
            result.layout.entrances.len()
        )?;
        return Ok(());
    }
    if result.from_version != result.to_version {
        writeln!(
            out,
            "schema version {} needs migration to {}",
            result.from_version, result.to_version
        )?;
    }
    for warning in &result.warnings {
        writeln!(out, "- {warning}")?;
    }
    Err(CliError::Invalid {
        count: result.warnings.len().max(1),
    })
}

fn run_add_table(
    args: &AddTableArgs,
    config: &EditorConfig,
    store: &mut JsonDirLayoutStore,
    out: &mut dyn Write,
) -> Result<()> {
    let footprint = Footprint::new(
        args.width.unwrap_or(config.table.default_width),
        args.height.unwrap_or(config.table.default_height),
    );
    edit(config, store, out, |session, out| {
        let added = session.add_table(footprint)?;
        if let Some(name) = &args.name {
            session.rename_table(&added.id, name)?;
        }
        if let Some(shape) = args.shape {
            session.set_table_shape(&added.id, shape.into())?;
        }
        if args.capacity.is_some() {
            session.set_table_capacity(&added.id, args.capacity)?;
        }
        if let Some(table) = session.view().table(&added.id) {
            writeln!(
                out,
                "added {} at ({}, {}) size {}x{}",
                table.id, table.x, table.y, table.width, table.height
            )?;
        }
        report_fallback(added.outcome, out)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "floorplan",
            "add-table",
            "--width",
            "3",
            "--dir",
            "/tmp/plan",
            "--log-json",
        ])
        .expect("parse");
        assert_eq!(cli.global.dir, PathBuf::from("/tmp/plan"));
        assert!(cli.global.log_json);
        assert!(matches!(
            cli.command,
            Commands::AddTable(AddTableArgs { width: Some(3), .. })
        ));
    }

    #[test]
    fn invalid_exit_code_is_one() {
        assert_eq!(CliError::Invalid { count: 2 }.exit_code(), 1);
    }
}
