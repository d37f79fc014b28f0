use std::path::PathBuf;

use assert_matches::assert_matches;

use pathogen_rdf::config::{ConfigLoader, DEFAULT_OUTPUT_DIR, Overrides};
use pathogen_rdf::domain::TaxonId;
use pathogen_rdf::error::PathogenError;

fn write_config(content: &str) -> (tempfile::TempDir, String) {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("pathogen-rdf.json");
    std::fs::write(&path, content).unwrap();
    let path = path.to_str().unwrap().to_string();
    (temp, path)
}

#[test]
fn resolve_mixed_taxa_and_oracle() {
    let (_temp, path) = write_config(
        r#"{
            "taxa": [10244, "2697049"],
            "row_limit": 25,
            "skolem_authority": "https://pathogen.example.org",
            "oracle": { "model": "gpt-4.1-mini", "api_key_env": "PATHOGEN_ORACLE_KEY" }
        }"#,
    );

    let resolved = ConfigLoader::resolve(Some(path.as_str()), Overrides::default()).unwrap();
    assert_eq!(
        resolved.taxa,
        vec![TaxonId::from(10244), TaxonId::from(2697049)]
    );
    assert_eq!(resolved.row_limit, 25);
    assert_eq!(resolved.skolem_authority, "https://pathogen.example.org");
    assert_eq!(resolved.oracle.model, "gpt-4.1-mini");
    assert_eq!(resolved.oracle.api_key_env, "PATHOGEN_ORACLE_KEY");
    assert_eq!(resolved.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
}

#[test]
fn invalid_taxon_in_config() {
    let (_temp, path) = write_config(r#"{ "taxa": ["txid10244"] }"#);
    let err = ConfigLoader::resolve(Some(path.as_str()), Overrides::default()).unwrap_err();
    assert_matches!(err, PathogenError::InvalidTaxonId(_));
}

#[test]
fn malformed_json_is_parse_error() {
    let (_temp, path) = write_config("{ taxa: ");
    let err = ConfigLoader::resolve(Some(path.as_str()), Overrides::default()).unwrap_err();
    assert_matches!(err, PathogenError::ConfigParse(_));
}

#[test]
fn explicit_missing_path_is_read_error() {
    let err = ConfigLoader::resolve(Some("/nonexistent/pathogen-rdf.json"), Overrides::default())
        .unwrap_err();
    assert_matches!(err, PathogenError::ConfigRead(_));
}

#[test]
fn zero_row_limit_rejected() {
    let (_temp, path) = write_config(r#"{ "taxa": [1], "row_limit": 0 }"#);
    let err = ConfigLoader::resolve(Some(path.as_str()), Overrides::default()).unwrap_err();
    assert_matches!(err, PathogenError::ConfigParse(_));
}
