// 🎯 Table Selector - Rules as Data
// Scores every OCR-detected table by keyword rules and ranks the candidates

use crate::table::Table;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// SCORING RULES
// ============================================================================

/// One keyword rule: award `weight` once if any keyword appears in the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRule {
    pub id: String,
    pub keywords: Vec<String>,
    pub weight: u32,
}

impl ScoringRule {
    pub fn new(id: &str, keywords: &[&str], weight: u32) -> Self {
        ScoringRule {
            id: id.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            weight,
        }
    }

    /// `text` is expected to be lower-cased already
    pub fn matches(&self, text: &str) -> bool {
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

/// Which cells contribute text to keyword scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextScope {
    /// Header row (row 0 and tagged header cells) only
    HeaderOnly,
    /// Every cell in the table
    AllCells,
}

/// Minimum shape a table needs for the structural bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralBonus {
    pub min_rows: usize,
    pub min_columns: usize,
    pub weight: u32,
}

// ============================================================================
// TABLE SELECTOR
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTable<'a> {
    /// Position of the table in the service response
    pub index: usize,
    pub table: &'a Table,
    pub score: u32,
}

pub struct TableSelector {
    rules: Vec<ScoringRule>,
    scope: TextScope,
    bonus: StructuralBonus,
}

impl TableSelector {
    /// Tip-sheet rules: header text only, bonus for at least 3×3 tables
    pub fn new() -> Self {
        TableSelector {
            rules: default_rules(),
            scope: TextScope::HeaderOnly,
            bonus: StructuralBonus {
                min_rows: 3,
                min_columns: 3,
                weight: 1,
            },
        }
    }

    pub fn with_scope(mut self, scope: TextScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_bonus(mut self, bonus: StructuralBonus) -> Self {
        self.bonus = bonus;
        self
    }

    pub fn rules(&self) -> &[ScoringRule] {
        &self.rules
    }

    /// Score a single table. Pure function of its text and shape.
    pub fn score(&self, table: &Table) -> u32 {
        if table.cells.is_empty() {
            return 0;
        }

        let text = match self.scope {
            TextScope::HeaderOnly => table.header_text(),
            TextScope::AllCells => table.full_text(),
        };

        let mut score: u32 = self
            .rules
            .iter()
            .filter(|rule| rule.matches(&text))
            .map(|rule| rule.weight)
            .sum();

        if table.row_count >= self.bonus.min_rows && table.column_count >= self.bonus.min_columns {
            score += self.bonus.weight;
        }

        score
    }

    /// Rank tables by score, best first. Zero-score tables are dropped and
    /// equal scores keep their input order.
    pub fn rank<'a>(&self, tables: &'a [Table]) -> Vec<ScoredTable<'a>> {
        let mut scored: Vec<ScoredTable<'a>> = tables
            .iter()
            .enumerate()
            .map(|(index, table)| ScoredTable {
                index,
                table,
                score: self.score(table),
            })
            .inspect(|s| debug!(table = s.index, score = s.score, "scored table"))
            .filter(|s| s.score > 0)
            .collect();

        // sort_by is stable, so ties stay in first-occurrence order
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored
    }

    pub fn best<'a>(&self, tables: &'a [Table]) -> Option<ScoredTable<'a>> {
        self.rank(tables).into_iter().next()
    }
}

impl Default for TableSelector {
    fn default() -> Self {
        Self::new()
    }
}

fn default_rules() -> Vec<ScoringRule> {
    vec![
        ScoringRule::new("partner", &["partner"], 3),
        ScoringRule::new("name", &["name"], 2),
        ScoringRule::new("number", &["number"], 2),
        ScoringRule::new("hours", &["hour", "tippable"], 3),
    ]
}

// ============================================================================
// TESTS
// ============================================================================
