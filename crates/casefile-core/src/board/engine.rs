//! Board mutations.
//!
//! Every operation takes the current board by reference and returns the next
//! board; the input snapshot is never modified.

use uuid::Uuid;

use super::invariants::check_board;
use super::model::{BoardState, Column, EvidenceItem, UNCATEGORIZED_COLUMN_ID};
use crate::error::{CaseError, Result};

/// Moves a card between (or within) columns.
///
/// Returns the input unchanged when source and destination coincide. The
/// card lands exactly at `to_index` in the resulting list (clamped to its
/// length); later items shift right. The evidence map is untouched.
pub fn move_card(
    board: &BoardState,
    card_id: &str,
    from_column_id: &str,
    from_index: usize,
    to_column_id: &str,
    to_index: usize,
) -> Result<BoardState> {
    if from_column_id == to_column_id && from_index == to_index {
        return Ok(board.clone());
    }
    if !board.columns.contains_key(to_column_id) {
        return Err(CaseError::not_found("column", to_column_id));
    }

    let mut next = board.clone();

    let source = next
        .columns
        .get_mut(from_column_id)
        .ok_or_else(|| CaseError::not_found("column", from_column_id))?;
    let position = resolve_position(source, card_id, from_index)?;
    let moved = source.evidence_ids.remove(position);

    let destination = next
        .columns
        .get_mut(to_column_id)
        .ok_or_else(|| CaseError::not_found("column", to_column_id))?;
    let insert_at = to_index.min(destination.evidence_ids.len());
    destination.evidence_ids.insert(insert_at, moved);

    tracing::debug!(
        evidence_id = card_id,
        from = from_column_id,
        to = to_column_id,
        index = insert_at,
        "Moved card"
    );
    debug_check(&next);
    Ok(next)
}

/// Finds the card in the source column, preferring the reported index.
fn resolve_position(column: &Column, card_id: &str, from_index: usize) -> Result<usize> {
    if column.evidence_ids.get(from_index).map(String::as_str) == Some(card_id) {
        return Ok(from_index);
    }
    let position = column
        .evidence_ids
        .iter()
        .position(|id| id == card_id)
        .ok_or_else(|| CaseError::not_found("evidence", card_id))?;
    tracing::warn!(
        evidence_id = card_id,
        column_id = %column.id,
        reported = from_index,
        actual = position,
        "Stale source index for card move"
    );
    Ok(position)
}

/// Inserts a card and appends its id to the target column.
///
/// `target_column_id` defaults to `uncategorized`. An empty `item.id` gets a
/// freshly generated id. Returns the next board and the id of the new card.
pub fn add_evidence(
    board: &BoardState,
    mut item: EvidenceItem,
    target_column_id: Option<&str>,
) -> Result<(BoardState, String)> {
    let target = target_column_id.unwrap_or(UNCATEGORIZED_COLUMN_ID);
    if !board.columns.contains_key(target) {
        return Err(CaseError::not_found("column", target));
    }

    if item.id.trim().is_empty() {
        item.id = new_evidence_id();
    }
    if board.evidence.contains_key(&item.id) {
        return Err(CaseError::validation(
            format!("board.evidence.{}", item.id),
            "evidence id already exists",
        ));
    }

    let id = item.id.clone();
    let mut next = board.clone();
    next.evidence.insert(id.clone(), item);
    if let Some(column) = next.columns.get_mut(target) {
        column.evidence_ids.push(id.clone());
    }

    debug_check(&next);
    Ok((next, id))
}

/// Deletes a card from the evidence map and every column.
///
/// Cross-references held outside the board (strategies, timeline) are
/// scrubbed by [`crate::case::CaseData::remove_evidence`].
pub fn remove_evidence(board: &BoardState, card_id: &str) -> Result<BoardState> {
    if !board.evidence.contains_key(card_id) {
        return Err(CaseError::not_found("evidence", card_id));
    }

    let mut next = board.clone();
    next.evidence.remove(card_id);
    for column in next.columns.values_mut() {
        column.evidence_ids.retain(|id| id != card_id);
    }

    debug_check(&next);
    Ok(next)
}

/// Appends a new empty column. Returns the next board and the column id.
pub fn add_column(board: &BoardState, title: &str) -> Result<(BoardState, String)> {
    let title = require_title(title)?;
    let id = format!("column-{}", Uuid::new_v4().simple());

    let mut next = board.clone();
    next.columns.insert(id.clone(), Column::new(id.clone(), title));
    next.column_order.push(id.clone());

    debug_check(&next);
    Ok((next, id))
}

pub fn rename_column(board: &BoardState, column_id: &str, title: &str) -> Result<BoardState> {
    let title = require_title(title)?;
    let mut next = board.clone();
    let column = next
        .columns
        .get_mut(column_id)
        .ok_or_else(|| CaseError::not_found("column", column_id))?;
    column.title = title;
    Ok(next)
}

/// Deletes a column, moving its cards to the end of `uncategorized`.
///
/// The reserved column itself is rejected with [`CaseError::ReservedColumn`].
pub fn delete_column(board: &BoardState, column_id: &str) -> Result<BoardState> {
    if column_id == UNCATEGORIZED_COLUMN_ID {
        return Err(CaseError::ReservedColumn(column_id.to_string()));
    }

    let mut next = board.clone();
    let removed = next
        .columns
        .remove(column_id)
        .ok_or_else(|| CaseError::not_found("column", column_id))?;
    next.column_order.retain(|id| id != column_id);

    let uncategorized = next
        .columns
        .entry(UNCATEGORIZED_COLUMN_ID.to_string())
        .or_insert_with(Column::uncategorized);
    let moved = removed.evidence_ids.len();
    uncategorized.evidence_ids.extend(removed.evidence_ids);
    if !next.column_order.iter().any(|id| id == UNCATEGORIZED_COLUMN_ID) {
        next.column_order.insert(0, UNCATEGORIZED_COLUMN_ID.to_string());
    }

    tracing::debug!(column_id, moved, "Deleted column");
    debug_check(&next);
    Ok(next)
}

/// Inserts a card at the front of `uncategorized`.
pub(crate) fn prepend_to_uncategorized(board: &BoardState, item: EvidenceItem) -> BoardState {
    let mut next = board.clone();
    let id = item.id.clone();
    next.evidence.insert(id.clone(), item);
    let uncategorized = next
        .columns
        .entry(UNCATEGORIZED_COLUMN_ID.to_string())
        .or_insert_with(Column::uncategorized);
    uncategorized.evidence_ids.insert(0, id);
    if !next.column_order.iter().any(|c| c == UNCATEGORIZED_COLUMN_ID) {
        next.column_order.insert(0, UNCATEGORIZED_COLUMN_ID.to_string());
    }
    debug_check(&next);
    next
}

/// Moves every card of `previous` onto `fresh`.
///
/// A card stays in its column when `fresh` has a column with the same id and
/// lands at the end of `uncategorized` otherwise. Column order within each
/// column is preserved.
pub fn carry_evidence(previous: &BoardState, fresh: &BoardState) -> BoardState {
    let mut next = fresh.clone();
    if !next.column_order.iter().any(|c| c == UNCATEGORIZED_COLUMN_ID) {
        next.column_order.insert(0, UNCATEGORIZED_COLUMN_ID.to_string());
    }
    next.columns
        .entry(UNCATEGORIZED_COLUMN_ID.to_string())
        .or_insert_with(Column::uncategorized);

    let placed = previous
        .ordered_columns()
        .flat_map(|column| column.evidence_ids.iter().map(move |id| (Some(column.id.as_str()), id)));
    let orphans = previous
        .evidence
        .keys()
        .filter(|id| previous.column_of(id).is_none())
        .map(|id| (None, id));

    let mut moved = 0usize;
    for (column_id, evidence_id) in placed.chain(orphans) {
        let Some(item) = previous.evidence.get(evidence_id) else {
            continue;
        };
        if next.evidence.contains_key(evidence_id) {
            continue;
        }
        let target = column_id
            .filter(|id| next.columns.contains_key(*id))
            .unwrap_or(UNCATEGORIZED_COLUMN_ID)
            .to_string();
        if target == UNCATEGORIZED_COLUMN_ID && column_id != Some(UNCATEGORIZED_COLUMN_ID) {
            moved += 1;
        }
        next.evidence.insert(evidence_id.clone(), item.clone());
        if let Some(column) = next.columns.get_mut(&target) {
            column.evidence_ids.push(evidence_id.clone());
        }
    }

    if moved > 0 {
        tracing::info!(moved, "Re-homed evidence from removed columns to uncategorized");
    }
    debug_check(&next);
    next
}

pub fn new_evidence_id() -> String {
    format!("ev-{}", Uuid::new_v4())
}

fn require_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CaseError::validation("column.title", "must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn debug_check(board: &BoardState) {
    if cfg!(debug_assertions) {
        let issues = check_board(board, "board");
        debug_assert!(issues.is_empty(), "board invariants broken: {issues:?}");
    }
}
