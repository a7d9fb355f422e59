//! One shared [`RegistryClient`] per registry host

use crate::error::{RegistryError, Result};
use crate::registry::{ClientSettings, RegistryClient};
use cplice_core::auth::CredentialProvider;
use cplice_core::types::RuntimeConfig;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Hands out one client per host so references to the same registry share
/// its session and memo caches
///
/// The pool is the context object for a run: it owns the credential source
/// and runtime configuration, and dropping it drops every cache.
pub struct RegistryPool {
    credentials: Arc<dyn CredentialProvider>,
    runtime: RuntimeConfig,
    clients: Mutex<HashMap<String, Arc<RegistryClient>>>,
}

impl RegistryPool {
    pub fn new(credentials: Arc<dyn CredentialProvider>, runtime: RuntimeConfig) -> Self {
        Self {
            credentials,
            runtime,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Client for `host`, created on first use
    ///
    /// Asking for a host already pooled with the other TLS verification
    /// setting fails with [`RegistryError::ConflictingTlsPolicy`].
    pub fn get(&self, host: &str, verify_tls: bool) -> Result<Arc<RegistryClient>> {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(client) = clients.get(host) {
            if client.verify_tls() != verify_tls {
                return Err(RegistryError::ConflictingTlsPolicy {
                    host: host.to_string(),
                    existing: client.verify_tls(),
                    requested: verify_tls,
                });
            }
            return Ok(client.clone());
        }

        debug!("Registering registry client for {}", host);
        let settings = ClientSettings::from_runtime(&self.runtime, host, verify_tls);
        let client = Arc::new(RegistryClient::new(host, self.credentials.clone(), settings)?);
        clients.insert(host.to_string(), client.clone());
        Ok(client)
    }

    /// Number of distinct hosts with a client
    pub fn len(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn runtime(&self) -> &RuntimeConfig {
        &self.runtime
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cplice_core::StaticCredentials;

    fn pool() -> RegistryPool {
        RegistryPool::new(
            Arc::new(StaticCredentials::new().with_auth("a.example.com", "x")),
            RuntimeConfig::default(),
        )
    }

    #[test]
    fn test_same_host_returns_same_client() {
        let pool = pool();
        let first = pool.get("a.example.com", true).unwrap();
        let second = pool.get("a.example.com", true).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_distinct_hosts_get_distinct_clients() {
        let pool = pool();
        let a = pool.get("a.example.com", true).unwrap();
        let b = pool.get("b.example.com", true).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_conflicting_tls_policy_is_rejected() {
        let pool = pool();
        pool.get("a.example.com", true).unwrap();
        let err = pool.get("a.example.com", false).err().unwrap();
        assert!(matches!(
            err,
            RegistryError::ConflictingTlsPolicy {
                existing: true,
                requested: false,
                ..
            }
        ));
    }
}
