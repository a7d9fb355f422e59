//! An image reference bound to its registry client

use crate::error::{RegistryError, Result};
use crate::pool::RegistryPool;
use crate::reference::ImageReference;
use crate::registry::{PublishReceipt, RegistryClient};
use crate::types::{Descriptor, ImageConfig, Manifest};
use reqwest::StatusCode;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

/// Result of probing one layer blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerProbe {
    pub digest: String,
    pub status: StatusCode,
}

impl LayerProbe {
    pub fn exists(&self) -> bool {
        self.status.is_success()
    }
}

/// A parsed `host/path:tag` resolved against a pooled [`RegistryClient`]
pub struct RemoteImage {
    reference: ImageReference,
    client: Arc<RegistryClient>,
    config: OnceCell<ImageConfig>,
}

impl RemoteImage {
    /// Parse `reference` and bind it to the pool's client for its host
    pub fn resolve(reference: &str, pool: &RegistryPool, verify_tls: bool) -> Result<Self> {
        let reference = ImageReference::parse(reference)?;
        let client = pool.get(&reference.host, verify_tls)?;
        debug!("Resolved {}", reference);
        Ok(Self {
            reference,
            client,
            config: OnceCell::new(),
        })
    }

    pub fn reference(&self) -> &ImageReference {
        &self.reference
    }

    pub fn client(&self) -> &Arc<RegistryClient> {
        &self.client
    }

    pub async fn manifest(&self) -> Result<Manifest> {
        self.client
            .get_manifest(&self.reference.path, &self.reference.tag)
            .await
    }

    pub async fn config(&self) -> Result<ImageConfig> {
        self.config
            .get_or_try_init(|| {
                self.client
                    .get_config(&self.reference.path, &self.reference.tag)
            })
            .await
            .cloned()
    }

    /// Upload `config` as JSON, returning a descriptor with its digest and size
    pub async fn store_config(&self, config: &ImageConfig) -> Result<Descriptor> {
        let data = serde_json::to_vec(config).map_err(|source| RegistryError::Encode {
            what: "image config",
            source,
        })?;
        let size = data.len() as u64;
        let digest = self.client.store_blob(&self.reference.path, data).await?;
        Ok(Descriptor {
            size: Some(size),
            ..Descriptor::new(digest)
        })
    }

    /// Publish `manifest` in this image's repository under `tag`
    pub async fn store_manifest(&self, manifest: &Manifest, tag: &str) -> Result<PublishReceipt> {
        self.client
            .store_manifest(&self.reference.path, tag, manifest)
            .await
    }

    /// HEAD each digest in this image's repository
    pub async fn probe_layers(&self, digests: &[String]) -> Result<Vec<LayerProbe>> {
        let mut probes = Vec::with_capacity(digests.len());
        for digest in digests {
            let (status, _) = self.client.head_blob(&self.reference.path, digest).await?;
            probes.push(LayerProbe {
                digest: digest.clone(),
                status,
            });
        }
        Ok(probes)
    }
}
