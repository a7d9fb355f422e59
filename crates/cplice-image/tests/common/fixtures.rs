//! JSON builders for manifests and image configs

use cplice_image::types::{DOCKER_MANIFEST_MEDIA_TYPE, OCI_MANIFEST_MEDIA_TYPE};
use serde_json::{json, Value};

/// Image config with the given diff_ids and one history entry per `created` value
pub fn config_json(diff_ids: &[&str], history: &[&str]) -> Value {
    let history: Vec<Value> = history
        .iter()
        .map(|created| json!({ "created": created, "created_by": format!("RUN step {}", created) }))
        .collect();
    json!({
        "architecture": "amd64",
        "os": "linux",
        "config": { "Env": ["PATH=/usr/bin"] },
        "history": history,
        "rootfs": { "type": "layers", "diff_ids": diff_ids }
    })
}

/// Manifest pointing at `config_digest` with the given layer digests
pub fn manifest_json(
    media_type: &str,
    config_digest: &str,
    config_size: u64,
    layers: &[&str],
) -> Value {
    let layers: Vec<Value> = layers
        .iter()
        .map(|digest| {
            json!({
                "mediaType": "application/vnd.oci.image.layer.v1.tar+gzip",
                "digest": digest,
                "size": 1024
            })
        })
        .collect();
    json!({
        "schemaVersion": 2,
        "mediaType": media_type,
        "config": {
            "mediaType": "application/vnd.oci.image.config.v1+json",
            "digest": config_digest,
            "size": config_size
        },
        "layers": layers
    })
}

pub fn docker_manifest_json(config_digest: &str, config_size: u64, layers: &[&str]) -> Value {
    manifest_json(DOCKER_MANIFEST_MEDIA_TYPE, config_digest, config_size, layers)
}

pub fn oci_manifest_json(config_digest: &str, config_size: u64, layers: &[&str]) -> Value {
    manifest_json(OCI_MANIFEST_MEDIA_TYPE, config_digest, config_size, layers)
}
