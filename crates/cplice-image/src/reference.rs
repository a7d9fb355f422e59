use crate::error::{RegistryError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Image reference of the form `host/path:tag`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageReference {
    /// Registry hostname, optionally with port (e.g. "registry.example.com", "localhost:5000")
    pub host: String,
    /// Repository path (e.g. "org/repo")
    pub path: String,
    /// Tag (e.g. "v1")
    pub tag: String,
}

impl ImageReference {
    /// Parse `"registry.example.com/org/repo:v1"`
    ///
    /// The host ends at the first `/`; the path ends at the first `:` after it.
    pub fn parse(s: &str) -> Result<Self> {
        let (host, path_tag) = s
            .split_once('/')
            .ok_or_else(|| RegistryError::malformed_reference(s, "missing '/' after host"))?;
        let (path, tag) = path_tag
            .split_once(':')
            .ok_or_else(|| RegistryError::malformed_reference(s, "missing ':' before tag"))?;

        if host.is_empty() {
            return Err(RegistryError::malformed_reference(s, "empty host"));
        }
        if path.is_empty() {
            return Err(RegistryError::malformed_reference(s, "empty repository path"));
        }
        if tag.is_empty() {
            return Err(RegistryError::malformed_reference(s, "empty tag"));
        }
        if path.contains('@') {
            return Err(RegistryError::malformed_reference(
                s,
                "digest references are not supported",
            ));
        }

        Ok(Self {
            host: host.to_string(),
            path: path.to_string(),
            tag: tag.to_string(),
        })
    }
}

impl FromStr for ImageReference {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.host, self.path, self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_image_reference() {
        let cases = vec![
            (
                "registry.example.com/org/repo:v1",
                ("registry.example.com", "org/repo", "v1"),
            ),
            ("localhost:5000/model:latest", ("localhost:5000", "model", "latest")),
            (
                "ghcr.io/a/b/c:1.0-rc:extra",
                ("ghcr.io", "a/b/c", "1.0-rc:extra"),
            ),
        ];

        for (input, (host, path, tag)) in cases {
            let reference = ImageReference::parse(input)
                .unwrap_or_else(|e| panic!("Failed to parse {}: {}", input, e));
            assert_eq!(reference.host, host, "Host mismatch for {}", input);
            assert_eq!(reference.path, path, "Path mismatch for {}", input);
            assert_eq!(reference.tag, tag, "Tag mismatch for {}", input);
        }
    }

    #[test]
    fn test_malformed_references() {
        for input in [
            "repo:v1",
            "registry.example.com/org/repo",
            "/org/repo:v1",
            "registry.example.com/:v1",
            "registry.example.com/org/repo:",
            "registry.example.com/org/repo@sha256:abc",
        ] {
            let err = ImageReference::parse(input).unwrap_err();
            assert!(
                matches!(err, RegistryError::MalformedReference { ref reference, .. } if reference == input),
                "Expected MalformedReference for {}, got {}",
                input,
                err
            );
        }
    }

    #[test]
    fn test_display_round_trip() {
        let reference: ImageReference = "registry.example.com/org/repo:v1".parse().unwrap();
        assert_eq!(reference.to_string(), "registry.example.com/org/repo:v1");
    }
}
