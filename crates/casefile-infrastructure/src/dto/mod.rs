//! Versioned persisted DTOs.

pub mod case_file;

pub use case_file::{
    CASE_FILE_ENTITY, CaseFileV1_0_0, CaseFileV1_1_0, CaseFileV2_0_0, create_case_file_migrator,
};
