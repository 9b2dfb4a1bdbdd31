// 🧭 Column Mapper - which column holds name, number and hours
// Header keyword rules with a positional fallback for unreadable headers

use crate::table::Table;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    Name,
    Number,
    Hours,
}

/// Column index per semantic field. Any field may stay unmapped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub name: Option<usize>,
    pub number: Option<usize>,
    pub hours: Option<usize>,
}

impl ColumnMapping {
    pub fn get(&self, field: Field) -> Option<usize> {
        match field {
            Field::Name => self.name,
            Field::Number => self.number,
            Field::Hours => self.hours,
        }
    }

    fn slot(&mut self, field: Field) -> &mut Option<usize> {
        match field {
            Field::Name => &mut self.name,
            Field::Number => &mut self.number,
            Field::Hours => &mut self.hours,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.number.is_none() && self.hours.is_none()
    }

    /// True when `column` already holds the name or number field
    pub fn is_identity_column(&self, column: usize) -> bool {
        self.name == Some(column) || self.number == Some(column)
    }
}

// ============================================================================
// HEADER RULES
// ============================================================================

/// A header cell maps to `field` when it contains any of `include`
/// and none of `exclude`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderRule {
    pub field: Field,
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl HeaderRule {
    pub fn new(field: Field, include: &[&str], exclude: &[&str]) -> Self {
        HeaderRule {
            field,
            include: include.iter().map(|s| s.to_string()).collect(),
            exclude: exclude.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn matches(&self, header: &str) -> bool {
        self.include.iter().any(|k| header.contains(k.as_str()))
            && !self.exclude.iter().any(|k| header.contains(k.as_str()))
    }
}

pub struct ColumnMapper {
    /// Checked in order; the first rule whose field is still free claims the cell
    rules: Vec<HeaderRule>,
}

impl ColumnMapper {
    pub fn new() -> Self {
        ColumnMapper {
            rules: vec![
                HeaderRule::new(Field::Name, &["name", "partner"], &["number"]),
                HeaderRule::new(Field::Number, &["number", "#"], &[]),
                HeaderRule::new(Field::Hours, &["hour", "tippable"], &[]),
            ],
        }
    }

    pub fn map(&self, table: &Table) -> ColumnMapping {
        let mut mapping = ColumnMapping::default();

        let mut headers: Vec<_> = table.header_cells().collect();
        headers.sort_by_key(|c| (c.row_index, c.column_index));

        for cell in &headers {
            let text = cell.content.trim().to_lowercase();
            let claimed = self
                .rules
                .iter()
                .find(|rule| mapping.get(rule.field).is_none() && rule.matches(&text));

            if let Some(rule) = claimed {
                *mapping.slot(rule.field) = Some(cell.column_index);
            }
        }

        if mapping.is_empty() && headers.len() >= 2 {
            mapping = positional_fallback(table);
            debug!(?mapping, "no header matched, using positional columns");
        }

        mapping
    }
}

impl Default for ColumnMapper {
    fn default() -> Self {
        Self::new()
    }
}

/// Column 0 = name, column 1 = number, last column = hours (3+ columns only)
fn positional_fallback(table: &Table) -> ColumnMapping {
    let columns = table
        .cells
        .iter()
        .map(|c| c.column_index + 1)
        .fold(table.column_count, usize::max);

    ColumnMapping {
        name: Some(0),
        number: Some(1),
        hours: if columns >= 3 { Some(columns - 1) } else { None },
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn header_table(header: &[&str]) -> Table {
        let mut cells: Vec<Cell> = header
            .iter()
            .enumerate()
            .map(|(col, text)| Cell::new(0, col, text))
            .collect();
        cells.push(Cell::new(1, 0, "Morgan"));
        Table::from_cells(cells)
    }

    #[test]
    fn test_maps_standard_headers() {
        let mapping = ColumnMapper::new().map(&header_table(&[
            "Partner Name",
            "Partner Number",
            "Tippable Hours",
        ]));

        assert_eq!(mapping.name, Some(0));
        assert_eq!(mapping.number, Some(1));
        assert_eq!(mapping.hours, Some(2));
    }

    #[test]
    fn test_hash_header_maps_number() {
        let mapping = ColumnMapper::new().map(&header_table(&["Name", "Partner #", "Hours"]));

        assert_eq!(mapping.name, Some(0));
        assert_eq!(mapping.number, Some(1));
        assert_eq!(mapping.hours, Some(2));
    }

    #[test]
    fn test_first_matching_column_wins() {
        let mapping = ColumnMapper::new().map(&header_table(&[
            "Hours",
            "Name",
            "Tippable Hours",
            "Nickname",
        ]));

        assert_eq!(mapping.hours, Some(0));
        assert_eq!(mapping.name, Some(1));
        assert_eq!(mapping.number, None);
    }

    #[test]
    fn test_headers_are_trimmed_and_case_insensitive() {
        let mapping = ColumnMapper::new().map(&header_table(&["  NAME ", " HOURS\n"]));

        assert_eq!(mapping.name, Some(0));
        assert_eq!(mapping.hours, Some(1));
    }

    #[test]
    fn test_positional_fallback() {
        let mapping = ColumnMapper::new().map(&header_table(&["Col A", "Col B", "Col C", "Col D"]));

        assert_eq!(mapping.name, Some(0));
        assert_eq!(mapping.number, Some(1));
        assert_eq!(mapping.hours, Some(3));
    }

    #[test]
    fn test_positional_fallback_without_hours_column() {
        let mapping = ColumnMapper::new().map(&header_table(&["Col A", "Col B"]));

        assert_eq!(mapping.name, Some(0));
        assert_eq!(mapping.number, Some(1));
        assert_eq!(mapping.hours, None);
    }

    #[test]
    fn test_single_unreadable_header_stays_unmapped() {
        let mapping = ColumnMapper::new().map(&header_table(&["???"]));
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_partial_match_skips_fallback() {
        let mapping = ColumnMapper::new().map(&header_table(&["Employee", "Hours", "Notes"]));

        assert_eq!(mapping.name, None);
        assert_eq!(mapping.number, None);
        assert_eq!(mapping.hours, Some(1));
    }
}
