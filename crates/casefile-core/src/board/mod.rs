//! Evidence board: columns, cards and the move/reorder algorithm.

mod engine;
mod invariants;
mod model;

pub(crate) use engine::prepend_to_uncategorized;
pub use engine::{
    add_column, add_evidence, carry_evidence, delete_column, move_card, new_evidence_id,
    remove_evidence, rename_column,
};
pub use invariants::{check_board, repair_board};
pub use model::{
    BoardState, Column, EvidenceItem, EvidenceType, UNCATEGORIZED_COLUMN_ID,
    UNCATEGORIZED_COLUMN_TITLE, allegation_column_id,
};
