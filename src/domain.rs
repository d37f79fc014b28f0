use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PathogenError;
use crate::slug::normalize;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaxonId(String);

impl TaxonId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaxonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaxonId {
    type Err = PathogenError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        let is_valid = !normalized.is_empty() && normalized.chars().all(|ch| ch.is_ascii_digit());
        if !is_valid {
            return Err(PathogenError::InvalidTaxonId(value.to_string()));
        }
        Ok(Self(normalized.to_string()))
    }
}

impl From<u64> for TaxonId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

/// Infectious-agent class as reported by the classification oracle.
///
/// Anything outside the closed label set is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathogenClass {
    Virus,
    Fungus,
    Helminth,
    Bacteria,
    Prion,
    Protozoa,
    Other(String),
}

impl PathogenClass {
    pub const LABELS: [&'static str; 6] =
        ["Virus", "Fungus", "Helminth", "Bacteria", "Prion", "Protozoa"];

    pub fn as_label(&self) -> &str {
        match self {
            PathogenClass::Virus => "Virus",
            PathogenClass::Fungus => "Fungus",
            PathogenClass::Helminth => "Helminth",
            PathogenClass::Bacteria => "Bacteria",
            PathogenClass::Prion => "Prion",
            PathogenClass::Protozoa => "Protozoa",
            PathogenClass::Other(text) => text,
        }
    }

    pub fn is_closed_label(&self) -> bool {
        !matches!(self, PathogenClass::Other(_))
    }
}

impl fmt::Display for PathogenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_label())
    }
}

impl FromStr for PathogenClass {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let candidate = trimmed.trim_end_matches('.').trim();
        let class = match candidate.to_ascii_lowercase().as_str() {
            "virus" => PathogenClass::Virus,
            "fungus" => PathogenClass::Fungus,
            "helminth" => PathogenClass::Helminth,
            "bacteria" | "bacterium" => PathogenClass::Bacteria,
            "prion" => PathogenClass::Prion,
            "protozoa" | "protozoan" => PathogenClass::Protozoa,
            _ => PathogenClass::Other(trimmed.to_string()),
        };
        Ok(class)
    }
}

/// Per-taxon values shared read-only by every row of that taxon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonContext {
    pub taxon_id: TaxonId,
    pub pathogen_name: String,
    pub pathogen_class: PathogenClass,
    pub normalized_name: String,
}

impl TaxonContext {
    pub fn new(taxon_id: TaxonId, pathogen_name: String, pathogen_class: PathogenClass) -> Self {
        let normalized_name = normalize(&pathogen_name);
        Self {
            taxon_id,
            pathogen_name,
            pathogen_class,
            normalized_name,
        }
    }
}

/// One `read_run` record. `None` marks a missing cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_accession: Option<String>,
    pub experiment_title: Option<String>,
    pub tax_id: Option<String>,
    pub country: Option<String>,
    pub description: Option<String>,
}

impl RunRecord {
    pub const COLUMNS: [&'static str; 5] = [
        "run_accession",
        "experiment_title",
        "tax_id",
        "country",
        "description",
    ];
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_taxon_id_valid() {
        let id: TaxonId = " 10244 ".parse().unwrap();
        assert_eq!(id.as_str(), "10244");
    }

    #[test]
    fn parse_taxon_id_invalid() {
        let err = "txid10244".parse::<TaxonId>().unwrap_err();
        assert_matches!(err, PathogenError::InvalidTaxonId(_));
        assert!("".parse::<TaxonId>().is_err());
    }

    #[test]
    fn pathogen_class_closed_set() {
        let class: PathogenClass = "virus.".parse().unwrap();
        assert_eq!(class, PathogenClass::Virus);
        assert!(class.is_closed_label());
        assert_eq!(class.as_label(), "Virus");
    }

    #[test]
    fn pathogen_class_free_text() {
        let class: PathogenClass = "  Probably a bacteriophage ".parse().unwrap();
        assert_eq!(
            class,
            PathogenClass::Other("Probably a bacteriophage".to_string())
        );
        assert_eq!(class.to_string(), "Probably a bacteriophage");
    }

    #[test]
    fn taxon_context_normalizes_name() {
        let context = TaxonContext::new(
            "10244".parse().unwrap(),
            "Monkeypox virus".to_string(),
            PathogenClass::Virus,
        );
        assert_eq!(context.normalized_name, "monkeypoxvirus");
    }
}
