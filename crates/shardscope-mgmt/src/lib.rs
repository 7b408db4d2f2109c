//! shardscope front end: configuration, advisory table cache, CLI and the read-only data API.

pub mod advisory_cache;
pub mod api;
pub mod cli;
pub mod config;

pub use advisory_cache::{AdvisoryCache, AdvisoryCacheError, LoadedAdvisories};
pub use api::{ApiError, DataApi};
pub use config::MgmtConfig;
