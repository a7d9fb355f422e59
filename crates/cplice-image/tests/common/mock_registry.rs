//! Mock registry helpers
//!
//! Every helper mounts one OCI-distribution endpoint on a wiremock server.
//! The server's `host:port` is registered as an insecure registry so the
//! client under test talks plain HTTP to it.

use super::constants::*;
use super::fixtures::*;
use cplice_core::types::{RetryPolicy, RetryStrategy, RuntimeConfig, REGISTRY_READ_OPERATION};
use cplice_core::StaticCredentials;
use cplice_image::digest::sha256_digest;
use cplice_image::{ClientSettings, RegistryClient, RegistryPool};
use serde_json::Value;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// `host:port` of a mock server, as used in image references
pub fn registry_host(server: &MockServer) -> String {
    server.address().to_string()
}

/// Image reference on the mock server
pub fn image_ref(server: &MockServer, repo: &str, tag: &str) -> String {
    format!("{}/{}:{}", registry_host(server), repo, tag)
}

/// Read retry policy with millisecond delays
pub fn fast_read_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        strategy: RetryStrategy::FixedDelay,
        backoff_multiplier: 1.0,
        initial_delay_ms: 5,
        max_delay_ms: 5,
    }
}

/// Runtime config that reaches `server` over plain HTTP with fast retries
pub fn runtime_for(server: &MockServer) -> RuntimeConfig {
    let mut runtime = RuntimeConfig::default();
    runtime
        .network
        .insecure_registries
        .push(registry_host(server));
    runtime
        .retry_policies
        .operations
        .insert(REGISTRY_READ_OPERATION.to_string(), fast_read_policy(3));
    runtime
}

pub fn credentials_for(server: &MockServer) -> Arc<StaticCredentials> {
    Arc::new(StaticCredentials::new().with_basic(registry_host(server), USERNAME, PASSWORD))
}

pub fn pool_for(server: &MockServer) -> RegistryPool {
    RegistryPool::new(credentials_for(server), runtime_for(server))
}

pub fn client_for(server: &MockServer) -> RegistryClient {
    let host = registry_host(server);
    let settings = ClientSettings::from_runtime(&runtime_for(server), &host, true);
    RegistryClient::new(host, credentials_for(server), settings).expect("client builds")
}

/// Serve `manifest` at `/v2/{repo}/manifests/{tag}`
pub async fn mock_manifest(server: &MockServer, repo: &str, tag: &str, manifest: &Value) {
    Mock::given(method("GET"))
        .and(path(format!("/v2/{}/manifests/{}", repo, tag)))
        .respond_with(ResponseTemplate::new(200).set_body_json(manifest))
        .mount(server)
        .await;
}

/// Serve `content` under its real digest, returning that digest
pub async fn mock_blob(server: &MockServer, repo: &str, content: &[u8]) -> String {
    let digest = sha256_digest(content);
    Mock::given(method("GET"))
        .and(path(format!("/v2/{}/blobs/{}", repo, digest)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content))
        .mount(server)
        .await;
    digest
}

/// Serve a config blob and a manifest pointing at it
pub async fn mock_image(
    server: &MockServer,
    repo: &str,
    tag: &str,
    media_type: &str,
    layers: &[&str],
    config: &Value,
) -> String {
    let bytes = serde_json::to_vec(config).expect("config serializes");
    let digest = mock_blob(server, repo, &bytes).await;
    let manifest = manifest_json(media_type, &digest, bytes.len() as u64, layers);
    mock_manifest(server, repo, tag, &manifest).await;
    digest
}

/// Accept monolithic uploads to `repo`, expecting exactly `times` of them
pub async fn mock_upload(server: &MockServer, repo: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path(format!("/v2/{}/blobs/uploads/", repo)))
        .respond_with(ResponseTemplate::new(201))
        .expect(times)
        .mount(server)
        .await;
}

/// Answer manifest PUTs to `repo:tag` with `status` and `body`
pub async fn mock_publish(
    server: &MockServer,
    repo: &str,
    tag: &str,
    status: u16,
    body: &str,
    times: u64,
) {
    Mock::given(method("PUT"))
        .and(path(format!("/v2/{}/manifests/{}", repo, tag)))
        .respond_with(
            ResponseTemplate::new(status)
                .insert_header("Location", format!("/v2/{}/manifests/{}", repo, tag).as_str())
                .set_body_string(body),
        )
        .expect(times)
        .mount(server)
        .await;
}

/// Requests received so far with the given method
pub async fn requests_with_method(server: &MockServer, wanted: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == wanted)
        .collect()
}

/// `METHOD /path` for every request received, in arrival order
pub async fn request_log(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| format!("{} {}", r.method, r.url.path()))
        .collect()
}
