use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::domain::{RunRecord, TaxonId};
use crate::error::PathogenError;

pub const DEFAULT_ENA_BASE: &str = "https://www.ebi.ac.uk/ena/portal/api";

/// Cells read as missing, as a dataframe reader does by default. `None` is
/// ordinary text.
pub const NA_TOKENS: [&str; 18] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "n/a", "nan", "null",
];

pub trait EnaClient: Send + Sync {
    fn fetch_runs(&self, taxon: &TaxonId, limit: usize) -> Result<Vec<RunRecord>, PathogenError>;
}

#[derive(Clone)]
pub struct EnaHttpClient {
    client: Client,
    base_url: String,
}

impl EnaHttpClient {
    pub fn new() -> Result<Self, PathogenError> {
        Self::with_base_url(DEFAULT_ENA_BASE)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, PathogenError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("pathogen-rdf/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| PathogenError::EnaHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| PathogenError::EnaHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url)
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
            .unwrap_or_else(|_| "ENA request failed".to_string());
        Err(PathogenError::EnaStatus { status, message })
    }
}

impl EnaClient for EnaHttpClient {
    fn fetch_runs(&self, taxon: &TaxonId, limit: usize) -> Result<Vec<RunRecord>, PathogenError> {
        let url = self.search_url();
        let query = format!("tax_eq({taxon})");
        let fields = RunRecord::COLUMNS.join(",");
        let limit = limit.to_string();
        debug!(%url, %query, "ena.search");

        let response = self
            .client
            .post(&url)
            .form(&[
                ("result", "read_run"),
                ("query", query.as_str()),
                ("fields", fields.as_str()),
                ("format", "tsv"),
                ("limit", limit.as_str()),
            ])
            .send()
            .map_err(|err| PathogenError::EnaHttp(err.to_string()))?;
        let response = Self::handle_status(response)?;
        let body = response
            .text()
            .map_err(|err| PathogenError::EnaHttp(err.to_string()))?;
        parse_read_runs(taxon, &body)
    }
}

/// Parses a `read_run` TSV body.
///
/// The header must name every column in [`RunRecord::COLUMNS`]; extra columns
/// are ignored. Empty cells and [`NA_TOKENS`] become `None`. An empty body
/// yields no rows.
pub fn parse_read_runs(taxon: &TaxonId, body: &str) -> Result<Vec<RunRecord>, PathogenError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|err| PathogenError::TsvParse(err.to_string()))?
        .clone();
    let mut positions = [0usize; 5];
    for (slot, column) in RunRecord::COLUMNS.iter().enumerate() {
        positions[slot] = headers
            .iter()
            .position(|header| header.trim() == *column)
            .ok_or_else(|| PathogenError::MissingColumn {
                taxon: taxon.to_string(),
                column: column.to_string(),
            })?;
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|err| PathogenError::TsvParse(err.to_string()))?;
        let cell = |slot: usize| {
            row.get(positions[slot])
                .filter(|text| !NA_TOKENS.contains(text))
                .map(str::to_string)
        };
        records.push(RunRecord {
            run_accession: cell(0),
            experiment_title: cell(1),
            tax_id: cell(2),
            country: cell(3),
            description: cell(4),
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn taxon() -> TaxonId {
        TaxonId::from(10244)
    }

    #[test]
    fn parses_rows_and_empty_cells() {
        let body = "run_accession\texperiment_title\ttax_id\tcountry\tdescription\n\
                    ERR1\tStudy X\t10244\tUnited Kingdom\tnone\n\
                    ERR2\t\t10244\t\t\n";
        let rows = parse_read_runs(&taxon(), body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].run_accession.as_deref(), Some("ERR1"));
        assert_eq!(rows[0].country.as_deref(), Some("United Kingdom"));
        assert_eq!(rows[0].description.as_deref(), Some("none"));
        assert_eq!(rows[1].experiment_title, None);
        assert_eq!(rows[1].description, None);
    }

    #[test]
    fn na_tokens_are_missing_but_none_is_text() {
        let body = "run_accession\texperiment_title\ttax_id\tcountry\tdescription\n\
                    ERR1\tN/A\tNA\t#N/A\tNone\n\
                    ERR2\tNULL\tnan\t<NA>\tn/a\n";
        let rows = parse_read_runs(&taxon(), body).unwrap();
        assert_eq!(rows[0].experiment_title, None);
        assert_eq!(rows[0].tax_id, None);
        assert_eq!(rows[0].country, None);
        assert_eq!(rows[0].description.as_deref(), Some("None"));
        assert_eq!(rows[1].experiment_title, None);
        assert_eq!(rows[1].tax_id, None);
        assert_eq!(rows[1].country, None);
        assert_eq!(rows[1].description, None);
    }

    #[test]
    fn column_order_follows_header() {
        let body = "tax_id\tdescription\tcountry\trun_accession\texperiment_title\n\
                    10244\td\tKenya\tSRR9\tt\n";
        let rows = parse_read_runs(&taxon(), body).unwrap();
        assert_eq!(rows[0].run_accession.as_deref(), Some("SRR9"));
        assert_eq!(rows[0].country.as_deref(), Some("Kenya"));
    }

    #[test]
    fn missing_column_is_shape_error() {
        let body = "run_accession\texperiment_title\ttax_id\tdescription\nERR1\tx\t1\td\n";
        let err = parse_read_runs(&taxon(), body).unwrap_err();
        assert_matches!(err, PathogenError::MissingColumn { column, .. } if column == "country");
    }

    #[test]
    fn empty_body_has_no_rows() {
        assert!(parse_read_runs(&taxon(), "").unwrap().is_empty());
    }
}
