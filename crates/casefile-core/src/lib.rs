//! Domain layer of the case file workspace engine.
//!
//! Pure state-transition functions over [`case::CaseData`] and
//! [`board::BoardState`], the stage machine, and the traits implemented by
//! the infrastructure layer. No I/O happens here.

pub mod board;
pub mod case;
pub mod config;
pub mod discovery;
pub mod error;
pub mod export;
pub mod repository;
pub mod service;
pub mod stage;
pub mod suggestion;

// Re-export common error type
pub use error::{CaseError, Result, ValidationIssue};
