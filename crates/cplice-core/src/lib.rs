//! # cplice-core
//!
//! Core library for cplice providing:
//! - Registry credential lookup from the Docker credential file
//! - Runtime configuration (network, retry policies, cache limits)
//! - Retry execution engine with policy-based configuration
//! - Shared error types

pub mod auth;
pub mod config;
pub mod error;
pub mod retry;
pub mod types;
pub mod utils;

pub use auth::{CredentialProvider, DockerConfig, StaticCredentials};
pub use config::RuntimeConfigLoader;
pub use error::{Error, Result};
pub use types::RuntimeConfig;
pub use utils::get_home_dir;
