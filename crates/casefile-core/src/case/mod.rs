//! Case entity model.
//!
//! `CaseData` is the single unit of persistence. Mutations return a new
//! `CaseData` derived from the previous snapshot.

mod analysis;
mod model;
mod validation;

pub use analysis::{
    ANALYSIS_SERVICE, Allegation, AnalysisResult, ResponseStrategy, UnstatedClaim,
    parse_analysis_response,
};
pub use model::{
    ArbitrationAnalysis, CaseData, CharacterEvidence, Comparator, ComparatorAnalysis, DamageItem,
    DamagesModule, IntakeFields, MOOD_RATING_RANGE, Message, MessageRole, MoodEntry,
    TimelineEvent, UploadedEvidence,
};
pub use validation::{collect_issues, repair_case_data, validate_case_data};
