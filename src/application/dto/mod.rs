//! Data Transfer Objects

mod engine_config;
mod identification_report;

pub use engine_config::{
    ENV_DB_PATH, ENV_LOCAL_DIR, ENV_SYSTEM_DIR, ENV_USER_DIR, EngineConfig,
    database_paths_from, default_database_paths,
};
pub use identification_report::{CandidateSummary, IdentificationReport};
