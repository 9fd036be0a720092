#![forbid(unsafe_code)]

//! Plain-text rendering of a layout for terminals and logs.
//!
//! ```text
//! +-----==-----+
//! |.AA.........|
//! |............:
//! +------------+
//! ```
//!
//! Tables are lettered in layout order; horizontal entrances are drawn as
//! `=` in the top/bottom wall and vertical ones as `:` in the side walls.

use std::fmt::Write as _;

use floorplan_core::{Layout, Side, TableShape};

const EMPTY: char = '.';
const OVERFLOW: char = '*';

/// Symbol used for the `index`-th table.
fn table_symbol(index: usize) -> char {
    const SYMBOLS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
    SYMBOLS.get(index).map_or(OVERFLOW, |b| char::from(*b))
}

/// Draw the grid with its walls, entrances and tables.
#[must_use]
pub fn render_grid(layout: &Layout) -> String {
    let columns = usize::from(layout.grid.columns);
    let rows = usize::from(layout.grid.rows);
    let width = columns + 2;
    let height = rows + 2;

    let mut canvas = vec![vec![EMPTY; width]; height];
    for (y, row) in canvas.iter_mut().enumerate() {
        for (x, cell) in row.iter_mut().enumerate() {
            let vertical_wall = x == 0 || x == width - 1;
            let horizontal_wall = y == 0 || y == height - 1;
            *cell = match (horizontal_wall, vertical_wall) {
                (true, true) => '+',
                (true, false) => '-',
                (false, true) => '|',
                (false, false) => EMPTY,
            };
        }
    }

    for (index, table) in layout.tables.iter().enumerate() {
        let symbol = table_symbol(index);
        let rect = table.rect();
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                if let Some(cell) = canvas
                    .get_mut(usize::from(y) + 1)
                    .and_then(|row| row.get_mut(usize::from(x) + 1))
                {
                    *cell = symbol;
                }
            }
        }
    }

    for entrance in &layout.entrances {
        for along in entrance.offset..entrance.end() {
            let along = usize::from(along) + 1;
            let (x, y, mark) = match entrance.side {
                Side::Top => (along, 0, '='),
                Side::Bottom => (along, height - 1, '='),
                Side::Left => (0, along, ':'),
                Side::Right => (width - 1, along, ':'),
            };
            if let Some(cell) = canvas.get_mut(y).and_then(|row| row.get_mut(x)) {
                *cell = mark;
            }
        }
    }

    let mut out = String::with_capacity(height * (width + 1));
    for row in canvas {
        out.extend(row);
        out.push('\n');
    }
    out
}

/// One line per table and entrance.
#[must_use]
pub fn render_legend(layout: &Layout) -> String {
    let mut out = String::new();
    for (index, table) in layout.tables.iter().enumerate() {
        let shape = match table.shape {
            TableShape::Square => "square",
            TableShape::Round => "round",
        };
        let _ = write!(
            out,
            "{}  {:<6} ({}, {}) {}x{} {shape}",
            table_symbol(index),
            table.id.as_str(),
            table.x,
            table.y,
            table.width,
            table.height
        );
        if table.label() != table.id.as_str() {
            let _ = write!(out, "  \"{}\"", table.label());
        }
        if let Some(capacity) = table.capacity {
            let _ = write!(out, "  seats {capacity}");
        }
        out.push('\n');
    }
    for entrance in &layout.entrances {
        let _ = writeln!(
            out,
            "door {} on {} at {} span {}",
            entrance.id, entrance.side, entrance.offset, entrance.span
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorplan_core::{Entrance, GridSpec, Table};

    #[test]
    fn renders_walls_tables_and_doors() {
        let mut layout = Layout::empty(GridSpec::new(5, 4).expect("grid"));
        layout.tables.push(Table::new("T1", 1, 1, 2, 1));
        layout
            .entrances
            .push(Entrance::new("entrance-1", Side::Top, 2, 2));
        layout
            .entrances
            .push(Entrance::new("entrance-2", Side::Right, 3, 1));

        let expected = "\
+--==-+
|.....|
|.AA..|
|.....|
|.....:
+-----+
";
        assert_eq!(render_grid(&layout), expected);
    }

    #[test]
    fn legend_mentions_names_and_capacity() {
        let mut layout = Layout::default();
        layout.tables.push(
            Table::new("T1", 1, 1, 2, 1)
                .with_name("Booth")
                .with_shape(TableShape::Round)
                .with_capacity(4),
        );
        let legend = render_legend(&layout);
        assert!(legend.contains("A  T1"), "{legend}");
        assert!(legend.contains("\"Booth\""), "{legend}");
        assert!(legend.contains("seats 4"), "{legend}");
        assert!(legend.contains("door entrance-1 on top at 5 span 2"), "{legend}");
    }

    #[test]
    fn symbols_run_out_gracefully() {
        assert_eq!(table_symbol(0), 'A');
        assert_eq!(table_symbol(26), 'a');
        assert_eq!(table_symbol(500), OVERFLOW);
    }
}
