//! Remote tool endpoint configuration
//!
//! Endpoints are declared in a JSON file:
//!
//! ```json
//! { "endpoints": { "market-data": { "url": "https://…/rpc" } } }
//! ```
//!
//! A missing or malformed file falls back to the single well-known default
//! endpoint so the registry can always be constructed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// Name used for the fallback endpoint
pub const DEFAULT_ENDPOINT_NAME: &str = "default";

/// Well-known fallback endpoint used when no configuration is present
pub const DEFAULT_ENDPOINT_URL: &str = "https://data-api.investoday.net/data/mcp";

/// One configured remote tool endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Short identifier, used in collision renames and failover logs
    pub name: String,
    /// HTTP URL of the JSON-RPC endpoint
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct EndpointsFile {
    // BTreeMap keeps declaration handling deterministic across loads.
    #[serde(default)]
    endpoints: BTreeMap<String, EndpointEntry>,
}

#[derive(Debug, Deserialize)]
struct EndpointEntry {
    url: Option<String>,
}

fn fallback() -> Vec<EndpointConfig> {
    vec![EndpointConfig {
        name: DEFAULT_ENDPOINT_NAME.to_string(),
        url: DEFAULT_ENDPOINT_URL.to_string(),
    }]
}

/// Load endpoint configurations from a JSON file.
///
/// Entries without a usable `url` are skipped. Any error (missing file,
/// invalid JSON, zero usable entries) yields the default endpoint list.
pub async fn load_endpoints<P: AsRef<Path>>(path: P) -> Vec<EndpointConfig> {
    let path = path.as_ref();

    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            warn!(
                "Failed to read endpoint config {}: {}; using default endpoint",
                path.display(),
                e
            );
            return fallback();
        }
    };

    let parsed: EndpointsFile = match serde_json::from_str(&content) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(
                "Invalid endpoint config {}: {}; using default endpoint",
                path.display(),
                e
            );
            return fallback();
        }
    };

    let endpoints: Vec<EndpointConfig> = parsed
        .endpoints
        .into_iter()
        .filter_map(|(name, entry)| {
            let url = entry.url.filter(|u| !u.is_empty())?;
            if let Err(e) = url::Url::parse(&url) {
                warn!("Skipping endpoint '{}' with invalid URL {}: {}", name, url, e);
                return None;
            }
            Some(EndpointConfig { name, url })
        })
        .collect();

    if endpoints.is_empty() {
        warn!(
            "Endpoint config {} declares no usable endpoints; using default endpoint",
            path.display()
        );
        return fallback();
    }

    endpoints
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_endpoints_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("endpoints.json");
        let content = r#"{
            "endpoints": {
                "alpha": { "url": "http://localhost:9001/rpc" },
                "beta": { "url": "http://localhost:9002/rpc" }
            }
        }"#;
        tokio::fs::write(&path, content).await.unwrap();

        let endpoints = load_endpoints(&path).await;
        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[0].name, "alpha");
        assert_eq!(endpoints[1].url, "http://localhost:9002/rpc");
    }

    #[tokio::test]
    async fn test_missing_file_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let endpoints = load_endpoints(dir.path().join("nope.json")).await;
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].name, DEFAULT_ENDPOINT_NAME);
        assert_eq!(endpoints[0].url, DEFAULT_ENDPOINT_URL);
    }

    #[tokio::test]
    async fn test_invalid_json_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("endpoints.json");
        tokio::fs::write(&path, "not json at all").await.unwrap();

        let endpoints = load_endpoints(&path).await;
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].name, DEFAULT_ENDPOINT_NAME);
    }

    #[tokio::test]
    async fn test_entries_without_url_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("endpoints.json");
        let content = r#"{
            "endpoints": {
                "alpha": { "url": "http://localhost:9001/rpc" },
                "broken": {},
                "garbled": { "url": "not a url" }
            }
        }"#;
        tokio::fs::write(&path, content).await.unwrap();

        let endpoints = load_endpoints(&path).await;
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].name, "alpha");
    }
}
