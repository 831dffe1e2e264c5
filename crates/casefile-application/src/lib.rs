//! Application layer for the case file workspace.
//!
//! This crate provides the use case that owns the working copy of a case and
//! coordinates the domain layer with persistence and the external services.

pub mod discovery_scan;
pub mod persistence;
pub mod workspace;

pub use discovery_scan::{DiscoveryScanner, ScanFailure, ScanProgress, ScanReport};
pub use persistence::{LoadSource, LoadedCase, PersistenceCoordinator};
pub use workspace::{CaseWorkspace, SuggestionRequest};
