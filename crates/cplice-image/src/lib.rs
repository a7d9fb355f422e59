//! OCI registry client and image splicing for cplice
//!
//! This crate provides functionality for:
//! - Reading manifests, config blobs and layer probes from OCI-distribution registries
//! - Uploading blobs and publishing manifests
//! - Sharing one memoizing client per registry host
//! - Splicing a data image's layers onto a base image
//!
//! # Example
//!
//! ```no_run
//! use cplice_core::{DockerConfig, RuntimeConfig};
//! use cplice_image::{RegistryPool, SpliceEngine};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = RegistryPool::new(Arc::new(DockerConfig::load()?), RuntimeConfig::default());
//!
//!     let engine = SpliceEngine::resolve(
//!         &pool,
//!         "registry.example.com/org/base:v1",
//!         "registry.example.com/org/data:v1",
//!         "registry.example.com/org/combined:v1",
//!         true,
//!     )?;
//!     let outcome = engine.run().await?;
//!
//!     println!("Published {} with config {}", outcome.tag, outcome.config_descriptor.digest);
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod digest;
pub mod error;
pub mod image;
pub mod pool;
pub mod reference;
pub mod registry;
pub mod splice;
pub mod types;

// Re-export main types for convenience
pub use error::{RegistryError, Result};
pub use image::{LayerProbe, RemoteImage};
pub use pool::RegistryPool;
pub use reference::ImageReference;
pub use registry::{ClientSettings, PublishReceipt, RegistryClient};
pub use splice::{
    merge, ImageRole, NoOpSpliceObserver, SourceImage, SpliceEngine, SpliceObserver,
    SpliceOptions, SpliceOutcome,
};
pub use types::{Descriptor, HistoryEntry, ImageConfig, Manifest, RootFs};

/// Version of the cplice-image crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
