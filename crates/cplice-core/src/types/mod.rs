//! Configuration types shared across cplice crates

mod runtime_config;

pub use runtime_config::{
    CacheConfig, NetworkConfig, RetryPoliciesConfig, RetryPolicy, RetryStrategy, RuntimeConfig,
    REGISTRY_READ_OPERATION,
};
