//! Typed view of the pathogen JSON-LD schema and per-row population.
//!
//! The template is a two-node `@graph`: the disease entity first, the taxon
//! entity second. Every substitution point is a named `Option` field that is
//! skipped on serialization when empty, so a pruned key is absent from the
//! output rather than null. Keys the template carries beyond those are kept
//! verbatim in the `extra` maps.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{RunRecord, TaxonContext};
use crate::error::PathogenError;
use crate::validity::{is_valid_text, valid_value};

pub const DEFAULT_DISEASE_BASE: &str = "https://example.com/diseases/";
pub const TAXONOMY_BASE: &str = "https://purl.uniprot.org/taxonomy/";
pub const TAXON_IDENTIFIER_PREFIX: &str = "NCBI:txid";

const RUN_ACCESSION_SLOT: usize = 0;
const EXPERIMENT_TITLE_SLOT: usize = 1;
const DESCRIPTION_SLOT: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathogenDocument {
    #[serde(rename = "@context")]
    pub context: Value,
    #[serde(rename = "@graph")]
    pub graph: (DiseaseNode, TaxonNode),
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseNode {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "infectiousAgentClass")]
    pub infectious_agent_class: LabelNode,
    #[serde(rename = "additionalProperty")]
    pub additional_property: Vec<PropertySlot>,
    #[serde(rename = "spatialCoverage")]
    pub spatial_coverage: PlaceNode,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySlot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceNode {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonNode {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(rename = "associatedDisease")]
    pub associated_disease: NodeReference,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeReference {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PathogenDocument {
    pub fn disease(&self) -> &DiseaseNode {
        &self.graph.0
    }

    pub fn taxon(&self) -> &TaxonNode {
        &self.graph.1
    }

    pub fn to_json(&self) -> Result<Value, PathogenError> {
        serde_json::to_value(self).map_err(|err| PathogenError::JsonLd(err.to_string()))
    }
}

/// Immutable schema loaded once per run; rows populate clones of it.
#[derive(Debug, Clone)]
pub struct SchemaTemplate {
    document: PathogenDocument,
    disease_base: String,
}

impl SchemaTemplate {
    pub fn load(path: &Path) -> Result<Self, PathogenError> {
        let content = fs::read_to_string(path)
            .map_err(|_| PathogenError::TemplateRead(path.to_path_buf()))?;
        let value: Value = serde_json::from_str(&content)
            .map_err(|err| PathogenError::TemplateShape(err.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, PathogenError> {
        let document: PathogenDocument = serde_json::from_value(value)
            .map_err(|err| PathogenError::TemplateShape(err.to_string()))?;
        let slots = document.disease().additional_property.len();
        if slots <= DESCRIPTION_SLOT {
            return Err(PathogenError::TemplateShape(format!(
                "additionalProperty needs at least {} slots, found {slots}",
                DESCRIPTION_SLOT + 1
            )));
        }
        if !document.context.is_object() && !document.context.is_array() {
            return Err(PathogenError::TemplateShape(
                "@context must be an object or an array".to_string(),
            ));
        }
        Ok(Self {
            document,
            disease_base: DEFAULT_DISEASE_BASE.to_string(),
        })
    }

    pub fn with_disease_base(mut self, disease_base: impl Into<String>) -> Self {
        self.disease_base = disease_base.into();
        self
    }

    pub fn document(&self) -> &PathogenDocument {
        &self.document
    }

    pub fn disease_id(&self, context: &TaxonContext) -> String {
        format!("{}{}", self.disease_base, context.normalized_name)
    }
}

/// Fills a clone of `template` with taxon-level and row-level values.
///
/// Every substituted key is either set to a valid value or removed. The
/// disease id is a structural link and is always set, even when the slug
/// is empty.
pub fn populate(
    template: &SchemaTemplate,
    context: &TaxonContext,
    row: &RunRecord,
) -> PathogenDocument {
    let mut document = template.document.clone();
    let disease_id = template.disease_id(context);
    let (disease, taxon) = &mut document.graph;

    disease.id = Some(disease_id.clone());
    taxon.associated_disease.id = Some(disease_id);

    disease.name = is_valid_text(&context.pathogen_name).then(|| context.pathogen_name.clone());

    let label = context.pathogen_class.as_label();
    disease.infectious_agent_class.name = is_valid_text(label).then(|| label.to_string());

    let tax_id = valid_value(row.tax_id.as_deref()).map(str::trim);
    taxon.id = tax_id.map(|id| format!("{TAXONOMY_BASE}{id}"));
    taxon.name = tax_id.map(|id| format!("{TAXONOMY_BASE}{id}"));
    taxon.identifier = tax_id.map(|id| format!("{TAXON_IDENTIFIER_PREFIX}{id}"));

    let slots = &mut disease.additional_property;
    slots[RUN_ACCESSION_SLOT].value = cell(&row.run_accession);
    slots[EXPERIMENT_TITLE_SLOT].value = cell(&row.experiment_title);
    slots[DESCRIPTION_SLOT].value = cell(&row.description);

    let country = cell(&row.country);
    disease.spatial_coverage.id = country.clone();
    disease.spatial_coverage.name = country;

    document
}

fn cell(value: &Option<String>) -> Option<String> {
    valid_value(value.as_deref()).map(str::to_string)
}
