//! Evidence board domain models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};

/// Reserved column that always exists and receives orphaned cards.
pub const UNCATEGORIZED_COLUMN_ID: &str = "uncategorized";

/// Display title of the reserved column.
pub const UNCATEGORIZED_COLUMN_TITLE: &str = "Uncategorized";

/// Kind of an evidence card.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EvidenceType {
    Email,
    Document,
    Statement,
    #[default]
    Other,
}

/// A single evidence card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceItem {
    /// Unique within the owning board's evidence map. Empty means "assign one".
    pub id: String,
    pub content: String,
    pub description: String,
    #[serde(rename = "type")]
    pub evidence_type: EvidenceType,
    /// Free-form date as entered by the user or reported by the source.
    pub date: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl EvidenceItem {
    /// Creates an item without an id; the board assigns one on insert.
    pub fn new(
        content: impl Into<String>,
        description: impl Into<String>,
        evidence_type: EvidenceType,
    ) -> Self {
        Self {
            id: String::new(),
            content: content.into(),
            description: description.into(),
            evidence_type,
            date: String::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// A board column holding an ordered list of card ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub evidence_ids: Vec<String>,
}

impl Column {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            evidence_ids: Vec::new(),
        }
    }

    pub fn uncategorized() -> Self {
        Self::new(UNCATEGORIZED_COLUMN_ID, UNCATEGORIZED_COLUMN_TITLE)
    }
}

/// Kanban-style organization of the case evidence.
///
/// Invariants (checked by [`crate::board::check_board`]):
/// - every id listed by a column exists in `evidence`
/// - every evidence id appears in exactly one column
/// - `column_order` is a permutation of the keys of `columns`
/// - the `uncategorized` column always exists
///
/// Maps are ordered so that serialization is byte-stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardState {
    #[serde(default)]
    pub evidence: BTreeMap<String, EvidenceItem>,
    #[serde(default)]
    pub columns: BTreeMap<String, Column>,
    #[serde(default)]
    pub column_order: Vec<String>,
}

impl Default for BoardState {
    fn default() -> Self {
        let uncategorized = Column::uncategorized();
        Self {
            evidence: BTreeMap::new(),
            columns: BTreeMap::from([(uncategorized.id.clone(), uncategorized)]),
            column_order: vec![UNCATEGORIZED_COLUMN_ID.to_string()],
        }
    }
}

impl BoardState {
    /// Creates the board produced by an analysis: `uncategorized` followed by
    /// one empty `allegation-<i>` column per allegation title.
    pub fn for_allegations<'a>(titles: impl IntoIterator<Item = &'a str>) -> Self {
        let mut board = Self::default();
        for (index, title) in titles.into_iter().enumerate() {
            let column = Column::new(allegation_column_id(index), title);
            board.column_order.push(column.id.clone());
            board.columns.insert(column.id.clone(), column);
        }
        board
    }

    /// Returns the column that currently lists `evidence_id`.
    pub fn column_of(&self, evidence_id: &str) -> Option<&Column> {
        self.column_order
            .iter()
            .filter_map(|id| self.columns.get(id))
            .find(|column| column.evidence_ids.iter().any(|e| e == evidence_id))
    }

    /// Columns in display order.
    pub fn ordered_columns(&self) -> impl Iterator<Item = &Column> {
        self.column_order.iter().filter_map(|id| self.columns.get(id))
    }

    pub fn uncategorized(&self) -> Option<&Column> {
        self.columns.get(UNCATEGORIZED_COLUMN_ID)
    }

    pub fn card_count(&self) -> usize {
        self.evidence.len()
    }
}

/// Column id used for the allegation at `index`.
pub fn allegation_column_id(index: usize) -> String {
    format!("allegation-{index}")
}
