// 🔍 Record Extractor - partner rows out of the ranked tables
// Reads mapped columns, repairs a missing hours column, drops noise and duplicates

use crate::mapping::{ColumnMapper, ColumnMapping};
use crate::selection::TableSelector;
use crate::table::{Table, TableGrid};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

/// A partner row read from OCR output, before the session assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerCandidate {
    pub partner_name: String,
    pub partner_number: String,
    pub tippable_hours: f64,
}

impl PartnerCandidate {
    /// (trimmed name, trimmed number, hours bits): exact duplicates only
    fn dedup_key(&self) -> (String, String, u64) {
        (
            self.partner_name.clone(),
            self.partner_number.clone(),
            self.tippable_hours.to_bits(),
        )
    }
}

/// Parse a loosely formatted number the way it appears on a tip sheet.
///
/// Everything except digits, `.` and `-` is stripped first. Failed, negative
/// or non-finite parses yield 0.
pub fn parse_hours(text: &str) -> f64 {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    match numeric_prefix(&cleaned).parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value,
        _ => 0.0,
    }
}

/// Longest leading `-?digits[.digits]` run, so "7.5." reads as 7.5 and "8-10" as 8.
fn numeric_prefix(text: &str) -> &str {
    let bytes = text.as_bytes();
    let mut end = usize::from(bytes.first() == Some(&b'-'));
    let mut seen_dot = false;

    while let Some(&b) = bytes.get(end) {
        match b {
            b'0'..=b'9' => {}
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }

    &text[..end]
}

// ============================================================================
// RECORD EXTRACTOR
// ============================================================================

pub struct RecordExtractor {
    selector: TableSelector,
    mapper: ColumnMapper,
}

impl RecordExtractor {
    pub fn new() -> Self {
        RecordExtractor {
            selector: TableSelector::new(),
            mapper: ColumnMapper::new(),
        }
    }

    pub fn with_selector(mut self, selector: TableSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Full pipeline: rank tables, map each one, merge rows best table first.
    ///
    /// Never fails: no usable table means no partners.
    pub fn extract(&self, tables: &[Table]) -> Vec<PartnerCandidate> {
        let ranked = self.selector.rank(tables);
        if ranked.is_empty() {
            info!(tables = tables.len(), "no table looks like a tip sheet");
            return Vec::new();
        }

        let mapped: Vec<(&Table, ColumnMapping)> = ranked
            .iter()
            .map(|scored| (scored.table, self.mapper.map(scored.table)))
            .collect();

        let partners = merge_tables(&mapped);
        info!(
            tables = tables.len(),
            candidates = ranked.len(),
            partners = partners.len(),
            "extracted partners"
        );
        partners
    }
}

impl Default for RecordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge rows from already-ranked tables, keeping the first copy of each record.
pub fn merge_tables(tables: &[(&Table, ColumnMapping)]) -> Vec<PartnerCandidate> {
    let mut seen = HashSet::new();
    let mut partners = Vec::new();

    for (table, mapping) in tables {
        for candidate in extract_rows(&table.grid(), mapping) {
            if seen.insert(candidate.dedup_key()) {
                partners.push(candidate);
            } else {
                debug!(name = %candidate.partner_name, "dropping duplicate row");
            }
        }
    }

    partners
}

/// Read every data row of one table through its mapping.
pub fn extract_rows(grid: &TableGrid, mapping: &ColumnMapping) -> Vec<PartnerCandidate> {
    let mut partners = Vec::new();

    for (row_index, row) in grid.data_rows() {
        let partner_name = cell_text(row, mapping.name);
        let partner_number = cell_text(row, mapping.number);

        if partner_name.is_empty() && partner_number.is_empty() {
            debug!(row = row_index, "skipping row without name or number");
            continue;
        }

        let tippable_hours = match mapping.hours {
            Some(_) => parse_hours(cell_text(row, mapping.hours)),
            None => rightmost_hours(row, mapping),
        };

        partners.push(PartnerCandidate {
            partner_name: partner_name.to_string(),
            partner_number: partner_number.to_string(),
            tippable_hours,
        });
    }

    partners
}

fn cell_text(row: &[String], column: Option<usize>) -> &str {
    column
        .and_then(|c| row.get(c))
        .map(|s| s.trim())
        .unwrap_or("")
}

/// Hours usually sit in the right-most numeric column. Name and number
/// columns are never read as hours.
fn rightmost_hours(row: &[String], mapping: &ColumnMapping) -> f64 {
    row.iter()
        .enumerate()
        .rev()
        .filter(|(column, _)| !mapping.is_identity_column(*column))
        .map(|(_, text)| parse_hours(text))
        .find(|hours| *hours > 0.0)
        .unwrap_or(0.0)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn sheet(rows: &[&[&str]]) -> Table {
        let mut cells = Vec::new();
        for (r, row) in rows.iter().enumerate() {
            for (c, text) in row.iter().enumerate() {
                let cell = Cell::new(r, c, text);
                cells.push(if r == 0 { cell.header() } else { cell });
            }
        }
        Table::from_cells(cells)
    }

    #[test]
    fn test_parse_hours_strips_noise() {
        assert_eq!(parse_hours("12.5"), 12.5);
        assert_eq!(parse_hours(" 8.25 hrs"), 8.25);
        assert_eq!(parse_hours("1,040"), 1040.0);
        assert_eq!(parse_hours("-3"), 0.0);
        assert_eq!(parse_hours(""), 0.0);
        assert_eq!(parse_hours("n/a"), 0.0);
        assert_eq!(parse_hours("1.2.3"), 1.2);
    }

    #[test]
    fn test_parse_hours_reads_leading_number() {
        assert_eq!(parse_hours("7.5 hrs."), 7.5);
        assert_eq!(parse_hours("8-10"), 8.0);
        assert_eq!(parse_hours("6."), 6.0);
        assert_eq!(parse_hours(".5"), 0.5);
        assert_eq!(parse_hours("--4"), 0.0);
        assert_eq!(parse_hours("."), 0.0);
    }

    #[test]
    fn test_extracts_mapped_rows() {
        let table = sheet(&[
            &["Partner Name", "Partner Number", "Tippable Hours"],
            &["Avery Liu", "US1234", "12.5"],
            &[" Sam Ortiz ", "US5678", "30"],
        ]);

        let partners = RecordExtractor::new().extract(&[table]);

        assert_eq!(partners.len(), 2);
        assert_eq!(partners[0].partner_name, "Avery Liu");
        assert_eq!(partners[0].tippable_hours, 12.5);
        assert_eq!(partners[1].partner_name, "Sam Ortiz");
        assert_eq!(partners[1].partner_number, "US5678");
    }

    #[test]
    fn test_noise_rows_are_dropped() {
        let table = sheet(&[
            &["Partner Name", "Partner Number", "Tippable Hours"],
            &["", "", "99"],
            &["  ", " ", ""],
            &["", "US42", "4"],
        ]);

        let partners = RecordExtractor::new().extract(&[table]);

        assert_eq!(partners.len(), 1);
        assert_eq!(partners[0].partner_number, "US42");
        assert_eq!(partners[0].partner_name, "");
    }

    #[test]
    fn test_missing_hours_column_scans_from_right() {
        let table = sheet(&[
            &["Partner Name", "Partner Number", "Store", "Shift"],
            &["Kai", "1001", "smith st", "6.5"],
            &["Noor", "1002", "7", "closed"],
            &["Lee", "1003", "", ""],
        ]);
        let mapping = ColumnMapper::new().map(&table);
        assert_eq!(mapping.hours, None);

        let partners = extract_rows(&table.grid(), &mapping);

        assert_eq!(partners[0].tippable_hours, 6.5);
        assert_eq!(partners[1].tippable_hours, 7.0);
        // the partner number column is never mistaken for hours
        assert_eq!(partners[2].tippable_hours, 0.0);
    }

    #[test]
    fn test_duplicates_across_tables_keep_best_table_copy() {
        let strong = sheet(&[
            &["Partner Name", "Partner Number", "Tippable Hours"],
            &["Avery", "1", "10"],
            &["Blake", "2", "20"],
        ]);
        let weak = sheet(&[
            &["Name", "Hours"],
            &["Blake", "20"],
            &["Casey", "5"],
        ]);

        // the weaker table comes first in the response, but ranks second
        let partners = RecordExtractor::new().extract(&[weak, strong]);
        let names: Vec<&str> = partners.iter().map(|p| p.partner_name.as_str()).collect();

        assert_eq!(names, vec!["Avery", "Blake", "Blake", "Casey"]);
        assert_eq!(partners[1].partner_number, "2");
        assert_eq!(partners[2].partner_number, "");
    }

    #[test]
    fn test_exact_duplicates_are_dropped() {
        let first = sheet(&[
            &["Partner Name", "Partner Number", "Tippable Hours"],
            &["Avery", "1", "10"],
            &["Avery", "1", "10.0"],
            &["Avery", "1", "11"],
        ]);
        let second = first.clone();

        let partners = RecordExtractor::new().extract(&[first, second]);

        assert_eq!(partners.len(), 2);
        assert_eq!(partners[0].tippable_hours, 10.0);
        assert_eq!(partners[1].tippable_hours, 11.0);
    }

    #[test]
    fn test_no_tip_sheet_gives_empty_list() {
        let table = sheet(&[&["Item", "Qty"], &["Milk", "4"]]);

        assert!(RecordExtractor::new().extract(&[table]).is_empty());
        assert!(RecordExtractor::new().extract(&[]).is_empty());
    }

    #[test]
    fn test_candidate_serializes_camel_case() {
        let candidate = PartnerCandidate {
            partner_name: "Avery".to_string(),
            partner_number: "1".to_string(),
            tippable_hours: 7.5,
        };
        let json = serde_json::to_value(&candidate).unwrap();

        assert_eq!(json["partnerName"], "Avery");
        assert_eq!(json["tippableHours"], 7.5);
    }
}
