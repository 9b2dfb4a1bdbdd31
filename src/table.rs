// 📋 Table Model - OCR-detected tables as received from the analysis service
// Cells arrive as a flat positioned list; TableGrid turns them into a dense grid

use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// CELL
// ============================================================================

/// Role the OCR service assigned to a cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CellKind {
    ColumnHeader,

    /// Plain content, and every other role the service may report
    /// (rowHeader, stubHead, description).
    #[default]
    #[serde(other)]
    Regular,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub row_index: usize,
    pub column_index: usize,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub kind: CellKind,
}

impl Cell {
    pub fn new(row_index: usize, column_index: usize, content: &str) -> Self {
        Cell {
            row_index,
            column_index,
            content: content.to_string(),
            kind: CellKind::Regular,
        }
    }

    /// Builder pattern: mark the cell as a column header
    pub fn header(mut self) -> Self {
        self.kind = CellKind::ColumnHeader;
        self
    }

    /// Header cells are the first row plus anything the service tagged as a header.
    pub fn is_header(&self) -> bool {
        self.row_index == 0 || self.kind == CellKind::ColumnHeader
    }
}

// ============================================================================
// TABLE
// ============================================================================

/// One OCR-detected table. Immutable once received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(default)]
    pub row_count: usize,

    #[serde(default)]
    pub column_count: usize,

    #[serde(default)]
    pub cells: Vec<Cell>,
}

impl Table {
    /// Build a table from cells, deriving the declared counts from the positions.
    pub fn from_cells(cells: Vec<Cell>) -> Self {
        let row_count = cells.iter().map(|c| c.row_index + 1).max().unwrap_or(0);
        let column_count = cells.iter().map(|c| c.column_index + 1).max().unwrap_or(0);
        Table {
            row_count,
            column_count,
            cells,
        }
    }

    pub fn header_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| c.is_header())
    }

    /// Lower-cased header text, cells joined by a space
    pub fn header_text(&self) -> String {
        join_lowercase(self.header_cells())
    }

    /// Lower-cased text of every cell, joined by a space
    pub fn full_text(&self) -> String {
        join_lowercase(self.cells.iter())
    }

    pub fn grid(&self) -> TableGrid {
        TableGrid::from_table(self)
    }
}

fn bounded_extent(declared: usize, from_cells: usize) -> usize {
    declared
        .min(from_cells + MAX_DECLARED_PADDING)
        .min(MAX_GRID_EXTENT)
        .max(from_cells)
}

fn join_lowercase<'a>(cells: impl Iterator<Item = &'a Cell>) -> String {
    cells
        .map(|c| c.content.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// TABLE GRID
// ============================================================================

/// Upper bound on either grid dimension. Cells past it are dropped.
pub const MAX_GRID_EXTENT: usize = 1000;
/// Declared counts may exceed the cells' own extent by at most this much.
const MAX_DECLARED_PADDING: usize = 16;

/// Dense (row, column) view of a table.
///
/// Every row has exactly `column_count` slots; missing cells are empty
/// strings. The grid grows past the declared counts when the service
/// reports a cell outside them, and declared counts are trusted only
/// a little past the cells actually present.
#[derive(Debug, Clone, PartialEq)]
pub struct TableGrid {
    column_count: usize,
    rows: Vec<Vec<String>>,
    header_rows: Vec<bool>,
}

impl TableGrid {
    pub fn from_table(table: &Table) -> Self {
        let cells: Vec<&Cell> = table
            .cells
            .iter()
            .filter(|c| c.row_index < MAX_GRID_EXTENT && c.column_index < MAX_GRID_EXTENT)
            .collect();
        if cells.len() < table.cells.len() {
            debug!(dropped = table.cells.len() - cells.len(), "cells outside grid bounds");
        }

        let cell_rows = cells.iter().map(|c| c.row_index + 1).max().unwrap_or(0);
        let cell_columns = cells.iter().map(|c| c.column_index + 1).max().unwrap_or(0);
        let row_count = bounded_extent(table.row_count, cell_rows);
        let column_count = bounded_extent(table.column_count, cell_columns);

        let mut rows = vec![vec![String::new(); column_count]; row_count];
        let mut header_rows = vec![false; row_count];

        for cell in cells {
            rows[cell.row_index][cell.column_index] = cell.content.clone();
            if cell.is_header() {
                header_rows[cell.row_index] = true;
            }
        }

        TableGrid {
            column_count,
            rows,
            header_rows,
        }
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
    }

    /// Rows below the header, skipping any row the service tagged as a header.
    pub fn data_rows(&self) -> impl Iterator<Item = (usize, &[String])> {
        self.rows
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(idx, _)| !self.header_rows[*idx])
            .map(|(idx, row)| (idx, row.as_slice()))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_service_table() {
        let json = r#"{
            "rowCount": 2,
            "columnCount": 2,
            "cells": [
                {"kind": "columnHeader", "rowIndex": 0, "columnIndex": 0, "content": "Partner Name"},
                {"kind": "columnHeader", "rowIndex": 0, "columnIndex": 1, "content": "Hours"},
                {"rowIndex": 1, "columnIndex": 0, "content": "Avery"},
                {"kind": "rowHeader", "rowIndex": 1, "columnIndex": 1, "content": "12.5"}
            ]
        }"#;

        let table: Table = serde_json::from_str(json).unwrap();
        assert_eq!(table.row_count, 2);
        assert_eq!(table.cells[0].kind, CellKind::ColumnHeader);
        assert_eq!(table.cells[2].kind, CellKind::Regular);
        assert_eq!(table.cells[3].kind, CellKind::Regular);
    }

    #[test]
    fn test_header_text_is_lowercased() {
        let table = Table::from_cells(vec![
            Cell::new(0, 0, "Partner Name"),
            Cell::new(0, 1, "Tippable HOURS"),
            Cell::new(1, 0, "Jordan"),
        ]);
        assert_eq!(table.header_text(), "partner name tippable hours");
        assert_eq!(table.full_text(), "partner name tippable hours jordan");
    }

    #[test]
    fn test_grid_fills_missing_cells() {
        let table = Table {
            row_count: 3,
            column_count: 3,
            cells: vec![Cell::new(0, 0, "Name"), Cell::new(2, 2, "8")],
        };
        let grid = table.grid();

        assert_eq!(grid.row_count(), 3);
        assert_eq!(grid.get(1, 1), Some(""));
        assert_eq!(grid.get(2, 2), Some("8"));
        assert_eq!(grid.get(3, 0), None);
    }

    #[test]
    fn test_grid_grows_past_declared_counts() {
        let table = Table {
            row_count: 1,
            column_count: 1,
            cells: vec![Cell::new(0, 0, "Name"), Cell::new(1, 3, "6")],
        };
        let grid = table.grid();

        assert_eq!(grid.column_count(), 4);
        assert_eq!(grid.get(1, 3), Some("6"));
    }

    #[test]
    fn test_grid_ignores_absurd_declared_counts() {
        let table = Table {
            row_count: usize::MAX,
            column_count: 1_000_000_000,
            cells: vec![
                Cell::new(0, 0, "Name"),
                Cell::new(1, 0, "Avery"),
                Cell::new(5_000_000, 0, "stray"),
            ],
        };
        let grid = table.grid();

        assert_eq!(grid.row_count(), 2 + MAX_DECLARED_PADDING);
        assert_eq!(grid.column_count(), 1 + MAX_DECLARED_PADDING);
        assert_eq!(grid.get(1, 0), Some("Avery"));
    }

    #[test]
    fn test_data_rows_skip_tagged_header_rows() {
        let table = Table::from_cells(vec![
            Cell::new(0, 0, "Store 042").header(),
            Cell::new(1, 0, "Partner Name").header(),
            Cell::new(2, 0, "Riley"),
        ]);
        let grid = table.grid();
        let rows: Vec<usize> = grid.data_rows().map(|(idx, _)| idx).collect();

        assert_eq!(rows, vec![2]);
    }
}
