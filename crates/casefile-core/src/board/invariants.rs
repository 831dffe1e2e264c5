//! Board invariant checking and repair.

use std::collections::HashSet;

use super::model::{BoardState, Column, UNCATEGORIZED_COLUMN_ID};
use crate::error::ValidationIssue;

/// Collects every invariant violation of `board`.
///
/// `prefix` is prepended to issue paths so callers can distinguish the live
/// board from the one embedded in an analysis result.
pub fn check_board(board: &BoardState, prefix: &str) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if !board.columns.contains_key(UNCATEGORIZED_COLUMN_ID) {
        issues.push(ValidationIssue::new(
            format!("{prefix}.columns"),
            format!("reserved column '{UNCATEGORIZED_COLUMN_ID}' is missing"),
        ));
    }

    let mut seen_order = HashSet::new();
    for id in &board.column_order {
        if !seen_order.insert(id.as_str()) {
            issues.push(ValidationIssue::new(
                format!("{prefix}.columnOrder"),
                format!("duplicate column id '{id}'"),
            ));
        }
        if !board.columns.contains_key(id) {
            issues.push(ValidationIssue::new(
                format!("{prefix}.columnOrder"),
                format!("unknown column id '{id}'"),
            ));
        }
    }
    for id in board.columns.keys() {
        if !seen_order.contains(id.as_str()) {
            issues.push(ValidationIssue::new(
                format!("{prefix}.columnOrder"),
                format!("column '{id}' is missing from the order"),
            ));
        }
    }

    for (key, column) in &board.columns {
        if &column.id != key {
            issues.push(ValidationIssue::new(
                format!("{prefix}.columns.{key}.id"),
                format!("column id '{}' does not match its key", column.id),
            ));
        }
    }

    let mut placed: HashSet<&str> = HashSet::new();
    for (key, column) in &board.columns {
        for (index, evidence_id) in column.evidence_ids.iter().enumerate() {
            let path = format!("{prefix}.columns.{key}.evidenceIds[{index}]");
            if !board.evidence.contains_key(evidence_id) {
                issues.push(ValidationIssue::new(
                    path.clone(),
                    format!("dangling evidence id '{evidence_id}'"),
                ));
            }
            if !placed.insert(evidence_id.as_str()) {
                issues.push(ValidationIssue::new(
                    path,
                    format!("evidence id '{evidence_id}' appears in more than one place"),
                ));
            }
        }
    }

    for (key, item) in &board.evidence {
        if &item.id != key {
            issues.push(ValidationIssue::new(
                format!("{prefix}.evidence.{key}.id"),
                format!("evidence id '{}' does not match its key", item.id),
            ));
        }
        if !placed.contains(key.as_str()) {
            issues.push(ValidationIssue::new(
                format!("{prefix}.evidence.{key}"),
                "evidence is not listed in any column",
            ));
        }
    }

    issues
}

/// Restores every board invariant, returning the repaired board and a
/// description of each repair performed.
///
/// Evidence is never dropped: cards missing from every column are appended to
/// `uncategorized`. Only references are removed (dangling ids, second
/// memberships, unknown column ids in the order).
pub fn repair_board(mut board: BoardState) -> (BoardState, Vec<String>) {
    let mut repairs = Vec::new();

    for (key, item) in board.evidence.iter_mut() {
        if &item.id != key {
            repairs.push(format!("evidence '{}' re-keyed to '{key}'", item.id));
            item.id = key.clone();
        }
    }
    for (key, column) in board.columns.iter_mut() {
        if &column.id != key {
            repairs.push(format!("column '{}' re-keyed to '{key}'", column.id));
            column.id = key.clone();
        }
    }

    if !board.columns.contains_key(UNCATEGORIZED_COLUMN_ID) {
        repairs.push(format!("restored reserved column '{UNCATEGORIZED_COLUMN_ID}'"));
        board
            .columns
            .insert(UNCATEGORIZED_COLUMN_ID.to_string(), Column::uncategorized());
    }

    let mut order = Vec::with_capacity(board.columns.len());
    let mut seen = HashSet::new();
    for id in board.column_order.drain(..) {
        if !board.columns.contains_key(&id) {
            repairs.push(format!("dropped unknown column '{id}' from order"));
        } else if !seen.insert(id.clone()) {
            repairs.push(format!("dropped duplicate column '{id}' from order"));
        } else {
            order.push(id);
        }
    }
    for id in board.columns.keys() {
        if !seen.contains(id) {
            repairs.push(format!("appended column '{id}' to order"));
            if id == UNCATEGORIZED_COLUMN_ID {
                order.insert(0, id.clone());
            } else {
                order.push(id.clone());
            }
        }
    }
    board.column_order = order;

    let mut placed = HashSet::new();
    for column_id in board.column_order.clone() {
        let Some(column) = board.columns.get_mut(&column_id) else {
            continue;
        };
        let evidence = &board.evidence;
        column.evidence_ids.retain(|evidence_id| {
            if !evidence.contains_key(evidence_id) {
                repairs.push(format!(
                    "dropped dangling evidence '{evidence_id}' from column '{column_id}'"
                ));
                false
            } else if !placed.insert(evidence_id.clone()) {
                repairs.push(format!(
                    "dropped second membership of '{evidence_id}' in column '{column_id}'"
                ));
                false
            } else {
                true
            }
        });
    }

    let orphans: Vec<String> = board
        .evidence
        .keys()
        .filter(|id| !placed.contains(*id))
        .cloned()
        .collect();
    if !orphans.is_empty() {
        if let Some(uncategorized) = board.columns.get_mut(UNCATEGORIZED_COLUMN_ID) {
            for id in orphans {
                repairs.push(format!("placed orphaned evidence '{id}' in uncategorized"));
                uncategorized.evidence_ids.push(id);
            }
        }
    }

    (board, repairs)
}
