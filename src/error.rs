use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PathogenError {
    #[error("invalid taxon id: {0}")]
    InvalidTaxonId(String),

    #[error("missing config file pathogen-rdf.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("failed to read schema template at {0}")]
    TemplateRead(PathBuf),

    #[error("schema template does not match the pathogen shape: {0}")]
    TemplateShape(String),

    #[error("ENA request failed: {0}")]
    EnaHttp(String),

    #[error("ENA returned status {status}: {message}")]
    EnaStatus { status: u16, message: String },

    #[error("ENA response is missing column `{column}` (taxon {taxon})")]
    MissingColumn { taxon: String, column: String },

    #[error("failed to parse ENA TSV: {0}")]
    TsvParse(String),

    #[error("uniprot request failed: {0}")]
    UniprotHttp(String),

    #[error("uniprot returned status {status}: {message}")]
    UniprotStatus { status: u16, message: String },

    #[error("classification request failed: {0}")]
    OracleHttp(String),

    #[error("classification endpoint returned status {status}: {message}")]
    OracleStatus { status: u16, message: String },

    #[error("unexpected classification response: {0}")]
    OracleResponse(String),

    #[error("EBI search request failed: {0}")]
    SearchHttp(String),

    #[error("JSON-LD conversion failed: {0}")]
    JsonLd(String),

    #[error("invalid N-Quads at line {line}: {message}")]
    NQuadsParse { line: usize, message: String },

    #[error("row {index} of taxon {taxon} has no usable run_accession")]
    MissingRunAccession { taxon: String, index: usize },

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
