use std::path::Path;

use assert_matches::assert_matches;

use pathogen_rdf::domain::TaxonId;
use pathogen_rdf::ena::parse_read_runs;
use pathogen_rdf::error::PathogenError;

#[test]
fn parse_fixture() {
    let body = std::fs::read_to_string(
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/ena_10244.tsv"),
    )
    .unwrap();
    let rows = parse_read_runs(&TaxonId::from(10244), &body).unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].experiment_title.as_deref(), Some("Study X"));
    assert_eq!(rows[1].country.as_deref(), Some("NONE"));
    assert_eq!(rows[1].description, None);
    assert_eq!(rows[2].experiment_title, None);
    assert_eq!(rows[2].tax_id, None);
}

#[test]
fn header_only_body_has_no_rows() {
    let body = "run_accession\texperiment_title\ttax_id\tcountry\tdescription\n";
    assert!(parse_read_runs(&TaxonId::from(1), body).unwrap().is_empty());
}

#[test]
fn missing_column_names_taxon() {
    let body = "run_accession\ttax_id\n\"ERR1\"\t1\n";
    let err = parse_read_runs(&TaxonId::from(10244), body).unwrap_err();
    assert_matches!(
        err,
        PathogenError::MissingColumn { taxon, column }
            if taxon == "10244" && column == "experiment_title"
    );
}
