//! Infrastructure layer: versioned persistence format, local and remote
//! backends, paths and configuration.

pub mod codec;
pub mod config_service;
pub mod dto;
pub mod local_cache;
pub mod paths;
pub mod remote_store;

pub use codec::CaseFileCodec;
pub use config_service::ConfigService;
pub use local_cache::FileLocalCaseCache;
pub use paths::CaseFilePaths;
pub use remote_store::HttpRemoteCaseStore;
