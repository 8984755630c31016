//! Byte-level fetching of local and remote sources.

use reqwest::header::CONTENT_TYPE;

use crate::error::{IngestError, Result};
use crate::location::SourceLocation;

/// User agent string for remote requests.
const USER_AGENT_VALUE: &str = concat!("twmap/", env!("CARGO_PKG_VERSION"));

/// Raw payload of one fetched source.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub location: SourceLocation,
    pub bytes: Vec<u8>,
    /// `Content-Type` header for remote sources; inferred from the extension
    /// for local files.
    pub content_type: Option<String>,
}

/// Fetches sources from disk or over HTTP.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT_VALUE)
            .build()
            .map_err(|e| IngestError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    /// Fetch the full payload. Non-success HTTP statuses are errors.
    pub async fn fetch(&self, location: &SourceLocation) -> Result<Fetched> {
        match location {
            SourceLocation::Path(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|e| {
                    IngestError::SourceUnavailable {
                        location: location.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                tracing::debug!(location = %location, bytes = bytes.len(), "read local source");
                Ok(Fetched {
                    location: location.clone(),
                    bytes,
                    content_type: infer_content_type(location),
                })
            }
            SourceLocation::Url(url) => self.fetch_url(location, url).await,
        }
    }

    async fn fetch_url(&self, location: &SourceLocation, url: &str) -> Result<Fetched> {
        let unavailable = |e: reqwest::Error| IngestError::SourceUnavailable {
            location: location.to_string(),
            reason: e.to_string(),
        };

        tracing::debug!("Fetching {}", url);

        let response = self.client.get(url).send().await.map_err(unavailable)?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::HttpStatus {
                location: location.to_string(),
                status: status.as_u16(),
            });
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(unavailable)?;
        Ok(Fetched {
            location: location.clone(),
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

fn infer_content_type(location: &SourceLocation) -> Option<String> {
    let content_type = match location.extension()?.as_str() {
        "json" | "geojson" | "topojson" => "application/json",
        "csv" => "text/csv",
        "tsv" => "text/tab-separated-values",
        "txt" => "text/plain",
        _ => return None,
    };
    Some(content_type.to_string())
}
