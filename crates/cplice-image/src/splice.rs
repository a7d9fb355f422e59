//! Splicing a base image and a data image into a new image
//!
//! The run is four sequential stages with no retry at this level:
//!
//! 1. **Resolve** the three references through a [`RegistryPool`]
//! 2. **Read** base manifest, base config, data manifest, data config
//! 3. **Merge** layers, `rootfs.diff_ids` and history, base first
//! 4. **Publish** the merged config blob, then the manifest pointing at it
//!
//! A failure after the config blob is stored leaves that blob orphaned in
//! the destination repository; reclaiming it is left to registry garbage
//! collection.

use crate::error::{RegistryError, Result};
use crate::image::{LayerProbe, RemoteImage};
use crate::pool::RegistryPool;
use crate::registry::PublishReceipt;
use crate::types::{Descriptor, ImageConfig, Manifest, OCI_MANIFEST_MEDIA_TYPE};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Which of the three images an event concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRole {
    Base,
    Data,
    New,
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageRole::Base => "base",
            ImageRole::Data => "data",
            ImageRole::New => "new",
        };
        f.write_str(name)
    }
}

/// Progress callbacks; every method defaults to doing nothing
pub trait SpliceObserver: Send + Sync {
    fn on_manifest(&self, role: ImageRole, manifest: &Manifest) {
        let _ = (role, manifest);
    }

    fn on_config(&self, role: ImageRole, config: &ImageConfig) {
        let _ = (role, config);
    }

    fn on_layer_probe(&self, probe: &LayerProbe) {
        let _ = probe;
    }

    fn on_config_stored(&self, descriptor: &Descriptor) {
        let _ = descriptor;
    }

    fn on_manifest_ready(&self, manifest: &Manifest, config: &ImageConfig) {
        let _ = (manifest, config);
    }

    fn on_published(&self, tag: &str, receipt: &PublishReceipt) {
        let _ = (tag, receipt);
    }
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSpliceObserver;

impl SpliceObserver for NoOpSpliceObserver {}

impl<T: SpliceObserver + ?Sized> SpliceObserver for Arc<T> {
    fn on_manifest(&self, role: ImageRole, manifest: &Manifest) {
        (**self).on_manifest(role, manifest)
    }

    fn on_config(&self, role: ImageRole, config: &ImageConfig) {
        (**self).on_config(role, config)
    }

    fn on_layer_probe(&self, probe: &LayerProbe) {
        (**self).on_layer_probe(probe)
    }

    fn on_config_stored(&self, descriptor: &Descriptor) {
        (**self).on_config_stored(descriptor)
    }

    fn on_manifest_ready(&self, manifest: &Manifest, config: &ImageConfig) {
        (**self).on_manifest_ready(manifest, config)
    }

    fn on_published(&self, tag: &str, receipt: &PublishReceipt) {
        (**self).on_published(tag, receipt)
    }
}

/// Manifest and config of one source image
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    pub manifest: Manifest,
    pub config: ImageConfig,
}

impl SourceImage {
    fn check_alignment(&self, role: ImageRole) -> Result<()> {
        let layers = self.manifest.layers.len();
        let diff_ids = self.config.rootfs.diff_ids.len();
        if layers != diff_ids {
            return Err(RegistryError::LayerMismatch {
                image: role.to_string(),
                layers,
                diff_ids,
            });
        }
        Ok(())
    }
}

/// Concatenate `data` onto `base`
///
/// Layers, `rootfs.diff_ids` and history keep their relative order, base
/// entries first. The manifest media type becomes the OCI manifest type
/// whatever the base used. The config descriptor still points at the base
/// config until the merged config is published.
pub fn merge(base: &SourceImage, data: &SourceImage) -> Result<(Manifest, ImageConfig)> {
    base.check_alignment(ImageRole::Base)?;
    data.check_alignment(ImageRole::Data)?;

    let mut manifest = base.manifest.clone();
    manifest
        .layers
        .extend(data.manifest.layers.iter().cloned());
    manifest.media_type = Some(OCI_MANIFEST_MEDIA_TYPE.to_string());

    let mut config = base.config.clone();
    config.history.extend(data.config.history.iter().cloned());
    config
        .rootfs
        .diff_ids
        .extend(data.config.rootfs.diff_ids.iter().cloned());

    Ok((manifest, config))
}

/// Options for a splice run
#[derive(Debug, Clone, Default)]
pub struct SpliceOptions {
    /// Tag to publish under instead of the new reference's own tag
    pub destination_tag: Option<String>,
    /// HEAD every merged layer in the destination repository before publishing
    pub check_layers: bool,
}

/// Everything a successful run produced
#[derive(Debug, Clone)]
pub struct SpliceOutcome {
    pub config_descriptor: Descriptor,
    pub manifest: Manifest,
    pub config: ImageConfig,
    pub tag: String,
    pub receipt: PublishReceipt,
}

pub struct SpliceEngine<O = NoOpSpliceObserver> {
    base: RemoteImage,
    data: RemoteImage,
    new: RemoteImage,
    options: SpliceOptions,
    observer: O,
}

impl SpliceEngine<NoOpSpliceObserver> {
    /// Resolve the three references; all share `verify_tls`
    pub fn resolve(
        pool: &RegistryPool,
        base: &str,
        data: &str,
        new: &str,
        verify_tls: bool,
    ) -> Result<Self> {
        Ok(Self {
            base: RemoteImage::resolve(base, pool, verify_tls)?,
            data: RemoteImage::resolve(data, pool, verify_tls)?,
            new: RemoteImage::resolve(new, pool, verify_tls)?,
            options: SpliceOptions::default(),
            observer: NoOpSpliceObserver,
        })
    }
}

impl<O> SpliceEngine<O> {
    pub fn with_options(mut self, options: SpliceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_observer<O2>(self, observer: O2) -> SpliceEngine<O2> {
        SpliceEngine {
            base: self.base,
            data: self.data,
            new: self.new,
            options: self.options,
            observer,
        }
    }

    pub fn base(&self) -> &RemoteImage {
        &self.base
    }

    pub fn data(&self) -> &RemoteImage {
        &self.data
    }

    pub fn new_image(&self) -> &RemoteImage {
        &self.new
    }

    /// Tag the merged manifest is published under
    pub fn destination_tag(&self) -> &str {
        self.options
            .destination_tag
            .as_deref()
            .unwrap_or(&self.new.reference().tag)
    }

    fn checked_destination_tag(&self) -> Result<&str> {
        let tag = self.destination_tag();
        if tag.is_empty() {
            let reference = self.new.reference();
            return Err(RegistryError::malformed_reference(
                format!("{}/{}:", reference.host, reference.path),
                "empty tag",
            ));
        }
        Ok(tag)
    }
}

impl<O: SpliceObserver> SpliceEngine<O> {
    /// Read, merge and publish
    pub async fn run(&self) -> Result<SpliceOutcome> {
        self.checked_destination_tag()?;
        let (base, data) = self.read().await?;

        let (manifest, config) = merge(&base, &data)?;
        info!(
            "Merged {} base + {} data layer(s)",
            base.manifest.layers.len(),
            data.manifest.layers.len()
        );

        if self.options.check_layers {
            self.check_layers(&manifest).await?;
        }

        self.publish(manifest, config).await
    }

    /// Fetch base manifest, base config, data manifest, data config, in that order
    pub async fn read(&self) -> Result<(SourceImage, SourceImage)> {
        let base = self.read_source(ImageRole::Base, &self.base).await?;
        let data = self.read_source(ImageRole::Data, &self.data).await?;
        Ok((base, data))
    }

    async fn read_source(&self, role: ImageRole, image: &RemoteImage) -> Result<SourceImage> {
        info!("Reading {} image {}", role, image.reference());

        let manifest = image.manifest().await?;
        self.observer.on_manifest(role, &manifest);

        let config = image.config().await?;
        self.observer.on_config(role, &config);

        Ok(SourceImage { manifest, config })
    }

    async fn check_layers(&self, manifest: &Manifest) -> Result<()> {
        let digests: Vec<String> = manifest.layers.iter().map(|l| l.digest.clone()).collect();
        for probe in self.new.probe_layers(&digests).await? {
            if !probe.exists() {
                warn!(
                    "Layer {} not found in {} ({})",
                    probe.digest,
                    self.new.reference(),
                    probe.status
                );
            }
            self.observer.on_layer_probe(&probe);
        }
        Ok(())
    }

    /// Store `config`, point `manifest` at it and publish the manifest
    pub async fn publish(&self, mut manifest: Manifest, config: ImageConfig) -> Result<SpliceOutcome> {
        let tag = self.checked_destination_tag()?.to_string();

        let stored = self.new.store_config(&config).await?;
        self.observer.on_config_stored(&stored);

        manifest.config.digest = stored.digest.clone();
        manifest.config.size = stored.size;
        self.observer.on_manifest_ready(&manifest, &config);

        let receipt = self.new.store_manifest(&manifest, &tag).await?;
        self.observer.on_published(&tag, &receipt);

        Ok(SpliceOutcome {
            config_descriptor: stored,
            manifest,
            config,
            tag,
            receipt,
        })
    }
}
