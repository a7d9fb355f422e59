//! Policy-based retry execution
//!
//! Registry reads are idempotent, so transient failures (connection resets,
//! 429 and 5xx responses) are retried according to a [`RetryPolicy`] loaded
//! from the runtime configuration. Writes never go through this module.
//!
//! ```rust,no_run
//! use cplice_core::retry::{RetryError, RetryExecutor, TracingObserver};
//! use cplice_core::types::RetryPolicy;
//!
//! async fn example() -> Result<String, RetryError<std::io::Error>> {
//!     RetryExecutor::new(RetryPolicy::default())
//!         .with_observer(TracingObserver::new("fetch manifest"))
//!         .execute(|| async { Ok("manifest".to_string()) })
//!         .await
//! }
//! ```
//!
//! [`RetryPolicy`]: crate::types::RetryPolicy

mod error;
mod executor;
mod observer;
mod strategies;

pub use error::RetryError;
pub use executor::RetryExecutor;
pub use observer::{NoOpObserver, RetryObserver, StatsObserver, TracingObserver};
pub use strategies::{
    calculate_delay, AlwaysRetry, ClosurePredicate, HttpStatusError, HttpStatusPredicate,
    RetryPredicate,
};
