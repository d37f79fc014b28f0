use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::domain::TaxonId;
use crate::error::PathogenError;

pub const DEFAULT_UNIPROT_BASE: &str = "https://rest.uniprot.org";

/// One ancestor from a UniProt taxonomy lineage, root first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineageEntry {
    pub scientific_name: String,
    pub rank: Option<String>,
}

pub trait TaxonomyClient: Send + Sync {
    /// Scientific name for `taxon`; empty when UniProt has none.
    fn scientific_name(&self, taxon: &TaxonId) -> Result<String, PathogenError>;

    /// Lineage of the best free-text match for `name`; empty when nothing
    /// matches.
    fn lineage(&self, name: &str) -> Result<Vec<LineageEntry>, PathogenError>;
}

#[derive(Clone)]
pub struct UniprotHttpClient {
    client: Client,
    base_url: String,
}

impl UniprotHttpClient {
    pub fn new() -> Result<Self, PathogenError> {
        Self::with_base_url(DEFAULT_UNIPROT_BASE)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, PathogenError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("pathogen-rdf/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| PathogenError::UniprotHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| PathogenError::UniprotHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, PathogenError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "UniProt request failed".to_string());
        Err(PathogenError::UniprotStatus { status, message })
    }

    fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, PathogenError> {
        debug!(%url, "uniprot.get");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(|err| PathogenError::UniprotHttp(err.to_string()))?;
        let response = Self::handle_status(response)?;
        response
            .json()
            .map_err(|err| PathogenError::UniprotHttp(err.to_string()))
    }
}

impl TaxonomyClient for UniprotHttpClient {
    fn scientific_name(&self, taxon: &TaxonId) -> Result<String, PathogenError> {
        let url = format!("{}/taxonomy/{}", self.base_url, taxon.as_str());
        let raw = self.get_json(&url, &[])?;
        Ok(extract_scientific_name(&raw))
    }

    fn lineage(&self, name: &str) -> Result<Vec<LineageEntry>, PathogenError> {
        let url = format!("{}/taxonomy/search", self.base_url);
        let raw = self.get_json(&url, &[("query", name), ("format", "json")])?;
        Ok(extract_lineage(&raw))
    }
}

pub fn extract_scientific_name(raw: &Value) -> String {
    raw.get("scientificName")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

/// `results[0].lineage` of a taxonomy search response.
pub fn extract_lineage(raw: &Value) -> Vec<LineageEntry> {
    raw.get("results")
        .and_then(|v| v.as_array())
        .and_then(|results| results.first())
        .and_then(|first| first.get("lineage"))
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let scientific_name = item.get("scientificName").and_then(|v| v.as_str())?;
                    Some(LineageEntry {
                        scientific_name: scientific_name.to_string(),
                        rank: item
                            .get("rank")
                            .and_then(|v| v.as_str())
                            .map(|v| v.to_string()),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}
