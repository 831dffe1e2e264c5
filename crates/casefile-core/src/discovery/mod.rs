//! Discovery merge: folds externally discovered evidence into the board.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::board::{BoardState, EvidenceItem, EvidenceType, prepend_to_uncategorized};
use crate::case::Allegation;
use crate::error::Result;

pub const DISCOVERY_SERVICE: &str = "discovery";

/// Tag added to every card created by a discovery scan.
pub const DISCOVERED_TAG: &str = "discovered";

/// Criteria passed to the document scanning service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanFilter {
    #[serde(default)]
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_after: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_files: Option<usize>,
}

/// A file listed by the scanning service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredFile {
    /// Stable identifier assigned by the source.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub modified_at: String,
}

/// Relevance verdict for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub is_relevant: bool,
    #[serde(default)]
    pub relevance_type: String,
    #[serde(default)]
    pub justification: String,
    #[serde(default)]
    pub category: String,
}

/// A relevant file ready to be merged into the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredItem {
    pub external_id: String,
    pub name: String,
    pub content: String,
    pub category: String,
    pub relevance_type: String,
    pub justification: String,
    pub date: String,
}

impl DiscoveredItem {
    pub fn from_classification(file: &DiscoveredFile, content: String, c: Classification) -> Self {
        Self {
            external_id: file.id.clone(),
            name: file.name.clone(),
            content,
            category: c.category,
            relevance_type: c.relevance_type,
            justification: c.justification,
            date: file.modified_at.clone(),
        }
    }
}

/// Remote document scanning service.
#[async_trait]
pub trait DiscoveryService: Send + Sync {
    async fn scan(&self, filter: &ScanFilter) -> Result<Vec<DiscoveredFile>>;

    async fn fetch(&self, file: &DiscoveredFile) -> Result<String>;

    /// Returns `None` when the service has no opinion on the file.
    async fn classify(
        &self,
        content: &str,
        allegations: &[Allegation],
    ) -> Result<Option<Classification>>;
}

/// Board evidence id derived from a source identifier.
pub fn derived_evidence_id(external_id: &str) -> String {
    format!("ext-{external_id}")
}

/// Maps a free-form category string onto an evidence type.
pub fn classify_category(category: &str) -> EvidenceType {
    const EMAIL: &[&str] = &["email", "mail", "message"];
    const STATEMENT: &[&str] = &["statement", "testimony", "witness", "declaration"];
    const DOCUMENT: &[&str] = &[
        "document", "contract", "policy", "handbook", "record", "pdf", "memo", "report",
    ];

    let category = category.to_lowercase();
    let matches = |keywords: &[&str]| keywords.iter().any(|k| category.contains(k));
    if matches(EMAIL) {
        EvidenceType::Email
    } else if matches(STATEMENT) {
        EvidenceType::Statement
    } else if matches(DOCUMENT) {
        EvidenceType::Document
    } else {
        EvidenceType::Other
    }
}

/// Merges one discovered item, prepending it to `uncategorized`.
///
/// Returns the board unchanged when the derived id is already present, so
/// scanning the same source twice never duplicates a card.
pub fn merge_discovered(board: &BoardState, item: &DiscoveredItem) -> BoardState {
    let id = derived_evidence_id(&item.external_id);
    if board.evidence.contains_key(&id) {
        tracing::debug!(evidence_id = %id, "Discovered item already on board");
        return board.clone();
    }

    let mut tags = Vec::with_capacity(2);
    if !item.relevance_type.trim().is_empty() {
        tags.push(item.relevance_type.trim().to_string());
    }
    tags.push(DISCOVERED_TAG.to_string());

    let description = if item.justification.is_empty() {
        item.name.clone()
    } else {
        format!("{}: {}", item.name, item.justification)
    };
    let card = EvidenceItem::new(item.content.clone(), description, classify_category(&item.category))
        .with_id(id)
        .with_date(item.date.clone())
        .with_tags(tags);

    prepend_to_uncategorized(board, card)
}
