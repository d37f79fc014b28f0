//! EBI Search export: one TSV per query, rows from every category.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::PathogenError;

pub const DEFAULT_SEARCH_BASE: &str = "https://www.ebi.ac.uk/ebisearch/ws/rest";
pub const SEARCH_FIELDS: &str = "acc,description,name";
pub const PAGE_SIZE: usize = 100;

pub const CATEGORIES: [&str; 27] = [
    "genome_assembly",
    "embl",
    "emblstandard",
    "emblcon",
    "wgs_masters",
    "tsa_masters",
    "tls_masters",
    "coding",
    "coding_con",
    "coding_std",
    "coding_wgs",
    "coding_tsa",
    "coding_tls",
    "non-coding",
    "non-coding_con",
    "non-coding_std",
    "non-coding_wgs",
    "non-coding_tsa",
    "non-coding_tls",
    "sra-experiment",
    "sra-run",
    "sra-analysis",
    "sra-study",
    "project",
    "taxonomy",
    "sra-sample",
    "sra-submission",
];

pub const DEFAULT_QUERIES: [&str; 7] = [
    "MPox",
    "covid",
    "Antimicrobial Resistance",
    "Influenza and Respiratory Viruses",
    "Human clinical metadata",
    "Salmonella",
    "E. coli",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRow {
    pub category: String,
    pub acc: String,
    pub description: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchExport {
    pub query: String,
    pub path: PathBuf,
    pub rows: usize,
    pub failed_categories: Vec<String>,
}

pub trait SearchClient: Send + Sync {
    fn search(&self, category: &str, query: &str) -> Result<Value, PathogenError>;
}

#[derive(Clone)]
pub struct EbiSearchHttpClient {
    client: Client,
    base_url: String,
}

impl EbiSearchHttpClient {
    pub fn new() -> Result<Self, PathogenError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("pathogen-rdf/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| PathogenError::SearchHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| PathogenError::SearchHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: DEFAULT_SEARCH_BASE.to_string(),
        })
    }
}

impl SearchClient for EbiSearchHttpClient {
    fn search(&self, category: &str, query: &str) -> Result<Value, PathogenError> {
        let url = format!("{}/{category}", self.base_url);
        let size = PAGE_SIZE.to_string();
        debug!(%url, query, "search.get");
        let response = self
            .client
            .get(&url)
            .query(&[
                ("query", query),
                ("fields", SEARCH_FIELDS),
                ("size", size.as_str()),
                ("format", "json"),
            ])
            .send()
            .map_err(|err| PathogenError::SearchHttp(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(PathogenError::SearchHttp(format!(
                "{category}: status {}",
                status.as_u16()
            )));
        }
        response
            .json()
            .map_err(|err| PathogenError::SearchHttp(err.to_string()))
    }
}

/// Flattens `entries[].fields` of one category response.
///
/// List-valued fields contribute their first element; absent or empty
/// fields become the empty string.
pub fn flatten_entries(category: &str, response: &Value) -> Vec<SearchRow> {
    let Some(entries) = response.get("entries").and_then(|v| v.as_array()) else {
        return Vec::new();
    };
    entries
        .iter()
        .map(|entry| {
            let fields = entry.get("fields");
            let field = |name: &str| {
                fields
                    .and_then(|fields| fields.get(name))
                    .map(field_text)
                    .unwrap_or_default()
            };
            SearchRow {
                category: category.to_string(),
                acc: field("acc"),
                description: field("description"),
                name: field("name"),
            }
        })
        .collect()
}

fn field_text(value: &Value) -> String {
    match value {
        Value::Array(items) => items.first().map(field_text).unwrap_or_default(),
        Value::String(text) => text.clone(),
        Value::Null | Value::Bool(false) => String::new(),
        other => other.to_string(),
    }
}

/// Queries every category for `query` and writes `<dir>/<query>.tsv`.
///
/// A category whose request fails is logged and contributes no rows.
pub fn export_query<S>(client: &S, query: &str, dir: &Path) -> Result<SearchExport, PathogenError>
where
    S: SearchClient + ?Sized,
{
    let mut rows = Vec::new();
    let mut failed_categories = Vec::new();
    for category in CATEGORIES {
        match client.search(category, query) {
            Ok(response) => {
                let found = flatten_entries(category, &response);
                debug!(category, rows = found.len(), "search.category");
                rows.extend(found);
            }
            Err(err) => {
                warn!(category, query, error = %err, "search.category_failed");
                failed_categories.push(category.to_string());
            }
        }
    }

    let path = dir.join(format!("{}.tsv", query.replace(['/', '\\'], "_")));
    write_rows(&path, &rows)?;
    info!(query, rows = rows.len(), path = %path.display(), "search.export");
    Ok(SearchExport {
        query: query.to_string(),
        path,
        rows: rows.len(),
        failed_categories,
    })
}

pub fn write_rows(path: &Path, rows: &[SearchRow]) -> Result<(), PathogenError> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|err| PathogenError::Filesystem(err.to_string()))?;
    let temp =
        NamedTempFile::new_in(parent).map_err(|err| PathogenError::Filesystem(err.to_string()))?;
    {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(temp.as_file());
        writer
            .write_record(["category", "acc", "description", "name"])
            .map_err(|err| PathogenError::Filesystem(err.to_string()))?;
        for row in rows {
            writer
                .write_record([&row.category, &row.acc, &row.description, &row.name])
                .map_err(|err| PathogenError::Filesystem(err.to_string()))?;
        }
        writer
            .flush()
            .map_err(|err| PathogenError::Filesystem(err.to_string()))?;
    }
    temp.persist(path)
        .map_err(|err| PathogenError::Filesystem(err.to_string()))?;
    Ok(())
}
