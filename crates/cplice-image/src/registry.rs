use crate::cache::MemoCache;
use crate::digest::{self, sha256_digest};
use crate::error::{RegistryError, Result};
use crate::types::{ImageConfig, Manifest, MANIFEST_ACCEPT, OCI_MANIFEST_MEDIA_TYPE};
use bytes::Bytes;
use cplice_core::auth::CredentialProvider;
use cplice_core::retry::{ClosurePredicate, RetryExecutor, TracingObserver};
use cplice_core::types::{RetryPolicy, RuntimeConfig, REGISTRY_READ_OPERATION};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, LOCATION};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace};

type RepoKey = (String, String);

/// Settings a [`RegistryClient`] is built with
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Verify TLS certificates
    pub verify_tls: bool,
    /// Talk plain HTTP instead of HTTPS
    pub plain_http: bool,
    pub user_agent: String,
    pub timeout: Duration,
    /// Retry policy for idempotent reads
    pub read_retry: RetryPolicy,
    /// Maximum keys retained per memo cache
    pub cache_capacity: usize,
}

impl ClientSettings {
    /// Derive settings for `host` from the runtime configuration
    pub fn from_runtime(runtime: &RuntimeConfig, host: &str, verify_tls: bool) -> Self {
        Self {
            verify_tls,
            plain_http: runtime.is_insecure_registry(host),
            user_agent: runtime.network.user_agent.clone(),
            timeout: Duration::from_secs(runtime.network.http_timeout_secs),
            read_retry: runtime.retry_policy(REGISTRY_READ_OPERATION),
            cache_capacity: runtime.cache.max_entries,
        }
    }
}

/// Outcome of a successful manifest publish
#[derive(Debug, Clone)]
pub struct PublishReceipt {
    pub status: u16,
    /// `Location` header, if the registry sent one
    pub location: Option<String>,
    /// `Docker-Content-Digest` header, if the registry sent one
    pub digest: Option<String>,
    /// Raw response body
    pub body: String,
}

/// Client for one OCI-distribution registry host
///
/// Reads are status-checked, retried on transient failures and memoized for
/// the life of the client. Writes are sent exactly once.
pub struct RegistryClient {
    client: reqwest::Client,
    host: String,
    base_url: String,
    verify_tls: bool,
    credentials: Arc<dyn CredentialProvider>,
    read_retry: RetryPolicy,
    manifests: MemoCache<RepoKey, Manifest>,
    blobs: MemoCache<RepoKey, Bytes>,
    configs: MemoCache<RepoKey, ImageConfig>,
}

impl RegistryClient {
    /// Create a new registry client
    pub fn new(
        host: impl Into<String>,
        credentials: Arc<dyn CredentialProvider>,
        settings: ClientSettings,
    ) -> Result<Self> {
        let host = host.into();

        // No cookie store: registries must authenticate every request on its own
        let client = reqwest::Client::builder()
            .user_agent(&settings.user_agent)
            .timeout(settings.timeout)
            .danger_accept_invalid_certs(!settings.verify_tls)
            .build()
            .map_err(|source| RegistryError::ClientBuild {
                host: host.clone(),
                source,
            })?;

        let scheme = if settings.plain_http { "http" } else { "https" };
        let base_url = format!("{}://{}", scheme, host);
        debug!(
            "Created registry client for {} (verify_tls={})",
            base_url, settings.verify_tls
        );

        Ok(Self {
            client,
            base_url,
            verify_tls: settings.verify_tls,
            credentials,
            read_retry: settings.read_retry,
            manifests: MemoCache::new("manifests", settings.cache_capacity),
            blobs: MemoCache::new("blobs", settings.cache_capacity),
            configs: MemoCache::new("configs", settings.cache_capacity),
            host,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn verify_tls(&self) -> bool {
        self.verify_tls
    }

    /// Fetch the manifest for `image` at `reference` (tag or digest)
    pub async fn get_manifest(&self, image: &str, reference: &str) -> Result<Manifest> {
        let key = (image.to_string(), reference.to_string());
        self.manifests
            .get_or_try_init(key, || async {
                let url = format!("{}/v2/{}/manifests/{}", self.base_url, image, reference);
                debug!("Fetching manifest from: {}", url);

                let body = self.read(&url, Some(MANIFEST_ACCEPT)).await?;
                serde_json::from_slice::<Manifest>(&body)
                    .map_err(|e| RegistryError::parse("manifest", &url, e))
            })
            .await
    }

    /// Fetch a blob and check it against its digest
    pub async fn get_blob(&self, image: &str, digest: &str) -> Result<Bytes> {
        let key = (image.to_string(), digest.to_string());
        self.blobs
            .get_or_try_init(key, || async {
                let url = format!("{}/v2/{}/blobs/{}", self.base_url, image, digest);
                debug!("Fetching blob from: {}", url);

                let body = self.read(&url, None).await?;
                if let Some(actual) = digest::verify(digest, &body) {
                    return Err(RegistryError::DigestMismatch {
                        expected: digest.to_string(),
                        actual,
                    });
                }
                trace!("Blob {} verified ({} bytes)", digest, body.len());
                Ok(body)
            })
            .await
    }

    /// Fetch and decode the config blob referenced by the manifest at `tag`
    pub async fn get_config(&self, image: &str, tag: &str) -> Result<ImageConfig> {
        let key = (image.to_string(), tag.to_string());
        self.configs
            .get_or_try_init(key, || async {
                let manifest = self.get_manifest(image, tag).await?;
                let digest = &manifest.config.digest;
                let data = self.get_blob(image, digest).await?;
                serde_json::from_slice::<ImageConfig>(&data).map_err(|e| {
                    RegistryError::parse(
                        "image config",
                        format!("{}/v2/{}/blobs/{}", self.base_url, image, digest),
                        e,
                    )
                })
            })
            .await
    }

    /// Probe a blob with HEAD; the status is returned, not checked
    pub async fn head_blob(&self, image: &str, digest: &str) -> Result<(StatusCode, HeaderMap)> {
        let url = format!("{}/v2/{}/blobs/{}", self.base_url, image, digest);
        debug!("Probing blob at: {}", url);

        let response = self
            .request(Method::HEAD, &url)?
            .send()
            .await
            .map_err(|e| RegistryError::http(&url, e))?;
        Ok((response.status(), response.headers().clone()))
    }

    /// Upload `data` as a blob in one request and return its digest
    ///
    /// The digest is computed here over exactly the bytes sent, never taken
    /// from the registry's response.
    pub async fn store_blob(&self, image: &str, data: impl Into<Bytes>) -> Result<String> {
        let data: Bytes = data.into();
        let digest = sha256_digest(&data);
        let url = format!("{}/v2/{}/blobs/uploads/", self.base_url, image);
        debug!("Uploading blob {} ({} bytes) to: {}", digest, data.len(), url);

        let response = self
            .request(Method::POST, &url)?
            .query(&[("digest", digest.as_str())])
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(data)
            .send()
            .await
            .map_err(|e| RegistryError::http(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::UploadFailed {
                status: status.as_u16(),
                body,
            });
        }

        info!("Stored blob {} in {}/{}", digest, self.host, image);
        Ok(digest)
    }

    /// Publish `manifest` under `reference`
    pub async fn store_manifest(
        &self,
        image: &str,
        reference: &str,
        manifest: &Manifest,
    ) -> Result<PublishReceipt> {
        let url = format!("{}/v2/{}/manifests/{}", self.base_url, image, reference);
        let data = serde_json::to_vec(manifest).map_err(|source| RegistryError::Encode {
            what: "manifest",
            source,
        })?;
        debug!("Publishing manifest ({} bytes) to: {}", data.len(), url);

        let response = self
            .request(Method::PUT, &url)?
            .header(CONTENT_TYPE, OCI_MANIFEST_MEDIA_TYPE)
            .body(data)
            .send()
            .await
            .map_err(|e| RegistryError::http(&url, e))?;

        let status = response.status();
        let location = header_string(response.headers(), LOCATION.as_str());
        let digest = header_string(response.headers(), "docker-content-digest");
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(RegistryError::PublishFailed {
                status: status.as_u16(),
                body,
            });
        }

        info!("Published {}/{}:{}", self.host, image, reference);
        Ok(PublishReceipt {
            status: status.as_u16(),
            location,
            digest,
            body,
        })
    }

    /// Whether a manifest for `(image, reference)` is already memoized
    pub async fn has_cached_manifest(&self, image: &str, reference: &str) -> bool {
        self.manifests
            .contains(&(image.to_string(), reference.to_string()))
            .await
    }

    fn request(&self, method: Method, url: &str) -> Result<RequestBuilder> {
        let auth = self.credentials.get_auth(&self.host)?;
        let mut value = HeaderValue::from_str(&format!("Basic {}", auth)).map_err(|_| {
            cplice_core::Error::invalid_config(format!(
                "Credential for {} is not a valid header value",
                self.host
            ))
        })?;
        value.set_sensitive(true);
        Ok(self
            .client
            .request(method, url)
            .header(AUTHORIZATION, value))
    }

    /// GET `url` with retries, returning the body of a 2xx response
    async fn read(&self, url: &str, accept: Option<&'static str>) -> Result<Bytes> {
        let executor = RetryExecutor::new(self.read_retry.clone())
            .with_predicate(ClosurePredicate::new(RegistryError::is_transient))
            .with_observer(TracingObserver::new(format!("GET {}", url)));

        executor
            .execute(|| async move {
                let mut request = self.request(Method::GET, url)?;
                if let Some(accept) = accept {
                    request = request.header(ACCEPT, accept);
                }
                let response = request
                    .send()
                    .await
                    .map_err(|e| RegistryError::http(url, e))?;
                let response = check_status(response, url).await?;
                response
                    .bytes()
                    .await
                    .map_err(|e| RegistryError::http(url, e))
            })
            .await
            .map_err(|e| e.into_source())
    }
}

async fn check_status(response: Response, url: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RegistryError::Status {
        status: status.as_u16(),
        url: url.to_string(),
        body,
    })
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}
