//! Resolution of caller-supplied paths and source descriptors into locators.

use crate::error::{WaveformError, WaveformResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Structured audio source as handed over by a host application
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub uri: String,
    /// Request headers, only used for http(s) sources
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl SourceDescriptor {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            headers: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

/// Where the audio for a session lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Local(PathBuf),
    Remote {
        url: String,
        headers: Vec<(String, String)>,
    },
}

impl Locator {
    pub fn is_remote(&self) -> bool {
        matches!(self, Locator::Remote { .. })
    }

    /// Parse a single path or URL. `file://` URLs become local paths.
    pub fn parse(input: &str) -> WaveformResult<Self> {
        Self::parse_with_headers(input, Vec::new())
    }

    fn parse_with_headers(input: &str, headers: Vec<(String, String)>) -> WaveformResult<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(unresolvable());
        }

        match input.split_once("://") {
            Some((scheme, rest)) => match scheme.to_ascii_lowercase().as_str() {
                "http" | "https" => {
                    if rest.is_empty() {
                        return Err(unresolvable());
                    }
                    Ok(Locator::Remote {
                        url: input.to_string(),
                        headers,
                    })
                }
                "file" if rest.is_empty() => Err(unresolvable()),
                "file" => Ok(Locator::Local(PathBuf::from(rest))),
                _ => Err(WaveformError::Locator(format!(
                    "Unsupported audio source scheme: {scheme}"
                ))),
            },
            None => Ok(Locator::Local(PathBuf::from(input))),
        }
    }
}

fn unresolvable() -> WaveformError {
    WaveformError::Locator(
        "Failed to initialise URL from provided audio source. If path contains `file://` try removing it"
            .to_string(),
    )
}

/// Resolve a bare path or a descriptor into a locator.
///
/// A descriptor with a non-empty `uri` takes precedence over `path`; headers
/// are only carried for remote sources.
pub fn resolve(path: Option<&str>, source: Option<&SourceDescriptor>) -> WaveformResult<Locator> {
    if let Some(descriptor) = source.filter(|d| !d.uri.trim().is_empty()) {
        let headers = descriptor
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        return Locator::parse_with_headers(&descriptor.uri, headers);
    }

    match path.map(str::trim).filter(|p| !p.is_empty()) {
        Some(path) => Locator::parse(path),
        None => Err(unresolvable()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_path_is_local() {
        let locator = Locator::parse("/music/take1.wav").unwrap();
        assert_eq!(locator, Locator::Local(PathBuf::from("/music/take1.wav")));
        assert!(!locator.is_remote());
    }

    #[test]
    fn test_file_url_is_local() {
        let locator = Locator::parse("file:///music/take1.wav").unwrap();
        assert_eq!(locator, Locator::Local(PathBuf::from("/music/take1.wav")));
    }

    #[test]
    fn test_bare_file_scheme_is_unresolvable() {
        let err = Locator::parse("file://").unwrap_err();
        assert_eq!(err.code(), "LOCATOR_ERROR");
        assert!(err.to_string().contains("try removing it"));
    }

    #[test]
    fn test_https_is_remote() {
        let locator = Locator::parse("HTTPS://cdn.example.com/a.wav").unwrap();
        assert!(locator.is_remote());
    }

    #[test]
    fn test_unknown_scheme_rejected() {
        let err = Locator::parse("ftp://example.com/a.wav").unwrap_err();
        assert_eq!(err.code(), "LOCATOR_ERROR");
    }

    #[test]
    fn test_descriptor_wins_over_path() {
        let descriptor =
            SourceDescriptor::new("https://cdn.example.com/a.flac").with_header("Authorization", "x");
        let locator = resolve(Some("/local.wav"), Some(&descriptor)).unwrap();

        match locator {
            Locator::Remote { url, headers } => {
                assert_eq!(url, "https://cdn.example.com/a.flac");
                assert_eq!(headers, vec![("Authorization".to_string(), "x".to_string())]);
            }
            other => panic!("expected remote locator, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_descriptor_falls_back_to_path() {
        let descriptor = SourceDescriptor::new("  ");
        let locator = resolve(Some("/local.wav"), Some(&descriptor)).unwrap();
        assert_eq!(locator, Locator::Local(PathBuf::from("/local.wav")));
    }

    #[test]
    fn test_nothing_to_resolve() {
        let err = resolve(None, None).unwrap_err();
        assert_eq!(err.code(), "LOCATOR_ERROR");
        assert!(err.to_string().contains("file://"));

        assert!(resolve(Some(""), None).is_err());
    }

    #[test]
    fn test_descriptor_from_json() {
        let descriptor: SourceDescriptor = serde_json::from_str(
            r#"{"uri":"https://a.example/x.wav","headers":{"X-Token":"abc"}}"#,
        )
        .unwrap();
        assert_eq!(descriptor.headers.get("X-Token").map(String::as_str), Some("abc"));
    }
}
