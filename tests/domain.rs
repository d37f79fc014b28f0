use assert_matches::assert_matches;

use pathogen_rdf::domain::{PathogenClass, TaxonId};
use pathogen_rdf::error::PathogenError;

#[test]
fn taxon_id_parsing() {
    assert_eq!("10244".parse::<TaxonId>().unwrap(), TaxonId::from(10244));
    assert_matches!("-1".parse::<TaxonId>(), Err(PathogenError::InvalidTaxonId(_)));
}

#[test]
fn class_labels_round_trip_through_display() {
    for label in PathogenClass::LABELS {
        let class: PathogenClass = label.parse().unwrap();
        assert!(class.is_closed_label());
        assert_eq!(class.to_string(), label);
    }
}
