//! Serialization of the whole workspace to and from a versioned JSON blob.

use serde_json::Value;
use version_migrate::Migrator;

use casefile_core::CaseError;
use casefile_core::case::repair_case_data;
use casefile_core::error::Result;
use casefile_core::repository::PersistedCase;

use crate::dto::{CASE_FILE_ENTITY, create_case_file_migrator};

/// Version assumed for blobs written before versioning existed.
const LEGACY_VERSION: &str = "1.0.0";
const VERSION_KEY: &str = "version";

/// Encodes and decodes case blobs through the migration chain.
pub struct CaseFileCodec {
    migrator: Migrator,
}

impl CaseFileCodec {
    pub fn new() -> Result<Self> {
        Ok(Self {
            migrator: create_case_file_migrator()?,
        })
    }

    /// Serializes at the latest schema version.
    pub fn encode(&self, persisted: &PersistedCase) -> Result<String> {
        self.migrator
            .save_domain_flat(CASE_FILE_ENTITY, persisted.clone())
            .map_err(|e| CaseError::Serialization {
                format: "JSON".to_string(),
                message: format!("Failed to serialize case file: {e}"),
            })
    }

    /// Migrates a blob of any known version without repairing it.
    pub fn decode_unrepaired(&self, blob: &str) -> Result<PersistedCase> {
        let mut value: Value = serde_json::from_str(blob)?;
        let object = value.as_object_mut().ok_or_else(|| CaseError::Serialization {
            format: "JSON".to_string(),
            message: "case file blob is not a JSON object".to_string(),
        })?;
        if !object.contains_key(VERSION_KEY) {
            tracing::info!(version = LEGACY_VERSION, "Case file has no version, assuming legacy");
            object.insert(
                VERSION_KEY.to_string(),
                Value::String(LEGACY_VERSION.to_string()),
            );
        }

        let persisted: PersistedCase = self
            .migrator
            .load_flat_from(CASE_FILE_ENTITY, value)
            .map_err(|e| CaseError::migration(format!("Failed to migrate case file: {e}")))?;
        Ok(persisted)
    }

    /// Migrates a blob and repairs any broken invariants.
    pub fn decode(&self, blob: &str) -> Result<PersistedCase> {
        let PersistedCase { case, stage } = self.decode_unrepaired(blob)?;
        let (case, repairs) = repair_case_data(case);
        if !repairs.is_empty() {
            tracing::warn!(repairs = repairs.len(), "Loaded case file needed repairs");
        }
        Ok(PersistedCase { case, stage })
    }
}
