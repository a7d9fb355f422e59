//! Shared constants for registry tests

pub const USERNAME: &str = "user";
pub const PASSWORD: &str = "pass";
/// base64("user:pass")
pub const BASIC_AUTH: &str = "Basic dXNlcjpwYXNz";

pub const BASE_REPO: &str = "org/base";
pub const DATA_REPO: &str = "org/data";
pub const NEW_REPO: &str = "org/new";

pub const SOURCE_TAG: &str = "v1";
pub const NEW_TAG: &str = "v2";

pub const BASE_LAYERS: &[&str] = &["sha256:L1", "sha256:L2"];
pub const DATA_LAYERS: &[&str] = &["sha256:L3"];
pub const BASE_DIFF_IDS: &[&str] = &["sha256:D1", "sha256:D2"];
pub const DATA_DIFF_IDS: &[&str] = &["sha256:D3"];
pub const BASE_HISTORY: &[&str] = &["H1", "H2"];
pub const DATA_HISTORY: &[&str] = &["H3"];
