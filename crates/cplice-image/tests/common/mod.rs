//! Common test infrastructure for cplice-image integration tests
//!
//! # Usage
//!
//! In your test file, add:
//! ```ignore
//! mod common;
//! use common::*;
//! ```
//!
//! # Modules
//!
//! - `constants`: Repository names, tags, credentials
//! - `fixtures`: Manifest and image config JSON builders
//! - `mock_registry`: Wiremock setup helpers for registry endpoints
//! - `observer`: A splice observer that records every event

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod constants;
pub mod fixtures;
pub mod mock_registry;
pub mod observer;

pub use constants::*;
pub use fixtures::*;
pub use mock_registry::*;
pub use observer::*;
