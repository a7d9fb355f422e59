//! OCI manifest and image config documents
//!
//! Only the fields the splice touches are modelled explicitly. Everything
//! else is kept in `extra` so a document survives a decode/encode cycle
//! without losing annotations, platform data or runtime config.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// OCI image manifest media type
pub const OCI_MANIFEST_MEDIA_TYPE: &str = "application/vnd.oci.image.manifest.v1+json";

/// Docker v2 schema 2 manifest media type
pub const DOCKER_MANIFEST_MEDIA_TYPE: &str =
    "application/vnd.docker.distribution.manifest.v2+json";

/// Media types offered in the `Accept` header of manifest requests
pub const MANIFEST_ACCEPT: &str =
    "application/vnd.oci.image.manifest.v1+json,application/vnd.docker.distribution.manifest.v2+json";

/// Reference to a blob by digest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    pub digest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Descriptor {
    pub fn new(digest: impl Into<String>) -> Self {
        Self {
            media_type: None,
            digest: digest.into(),
            size: None,
            extra: Map::new(),
        }
    }
}

/// Image manifest; `layers[0]` is applied first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    pub config: Descriptor,
    #[serde(default)]
    pub layers: Vec<Descriptor>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Image config blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    pub rootfs: RootFs,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Uncompressed layer digests, index-aligned with `Manifest::layers`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootFs {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub fs_type: Option<String>,
    #[serde(default)]
    pub diff_ids: Vec<String>,
}

/// One build step record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_layer: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HistoryEntry {
    /// Whether this entry describes a step that produced no layer
    pub fn is_empty_layer(&self) -> bool {
        self.empty_layer.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_manifest_preserves_unknown_fields() {
        let raw = json!({
            "schemaVersion": 2,
            "mediaType": DOCKER_MANIFEST_MEDIA_TYPE,
            "config": {
                "mediaType": "application/vnd.docker.container.image.v1+json",
                "digest": "sha256:cfg",
                "size": 1234
            },
            "layers": [
                {
                    "mediaType": "application/vnd.docker.image.rootfs.diff.tar.gzip",
                    "digest": "sha256:aaa",
                    "size": 10,
                    "urls": ["https://example.com/layer"]
                }
            ],
            "annotations": { "org.opencontainers.image.title": "base" }
        });

        let manifest: Manifest = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(manifest.schema_version, Some(2));
        assert_eq!(manifest.layers[0].size, Some(10));
        assert!(manifest.extra.contains_key("annotations"));
        assert_eq!(serde_json::to_value(&manifest).unwrap(), raw);
    }

    #[test]
    fn test_minimal_descriptor_round_trip() {
        let raw = json!({ "digest": "sha256:bbb" });
        let descriptor: Descriptor = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(descriptor, Descriptor::new("sha256:bbb"));
        assert_eq!(serde_json::to_value(&descriptor).unwrap(), raw);
    }

    #[test]
    fn test_config_preserves_unknown_fields() {
        let raw = json!({
            "architecture": "amd64",
            "os": "linux",
            "config": { "Env": ["PATH=/usr/bin"] },
            "history": [
                { "created": "t1", "created_by": "ADD file" },
                { "created": "t2", "empty_layer": true }
            ],
            "rootfs": { "type": "layers", "diff_ids": ["sha256:ddd1"] }
        });

        let config: ImageConfig = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(config.rootfs.diff_ids, vec!["sha256:ddd1"]);
        assert!(!config.history[0].is_empty_layer());
        assert!(config.history[1].is_empty_layer());
        assert_eq!(serde_json::to_value(&config).unwrap(), raw);
    }

    #[test]
    fn test_config_keeps_empty_history() {
        let raw = json!({
            "history": [],
            "rootfs": { "type": "layers", "diff_ids": [] }
        });
        let config: ImageConfig = serde_json::from_value(raw.clone()).unwrap();
        assert!(config.history.is_empty());
        assert_eq!(serde_json::to_value(&config).unwrap(), raw);
    }

    #[test]
    fn test_config_without_rootfs_is_rejected() {
        let raw = json!({ "errors": [{ "code": "MANIFEST_UNKNOWN" }] });
        assert!(serde_json::from_value::<ImageConfig>(raw).is_err());
    }
}
