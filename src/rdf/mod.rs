pub mod graph;
pub mod nquads;
pub mod term;

use serde_json::Value;
use tracing::debug;

pub use graph::Graph;
pub use term::{Literal, Quad, Term, Triple};

use crate::error::PathogenError;
use crate::jsonld;

pub const DEFAULT_SKOLEM_AUTHORITY: &str = "https://example.com";

/// JSON-LD document to skolemized, canonical N-Triples.
#[derive(Debug, Clone)]
pub struct Converter {
    skolem_authority: String,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(DEFAULT_SKOLEM_AUTHORITY)
    }
}

impl Converter {
    pub fn new(skolem_authority: impl Into<String>) -> Self {
        Self {
            skolem_authority: skolem_authority.into(),
        }
    }

    pub fn skolem_authority(&self) -> &str {
        &self.skolem_authority
    }

    /// Converts `document` into a graph with no blank nodes.
    ///
    /// `scope` identifies the document (a run accession) and is part of every
    /// skolem IRI, so separately converted documents can be merged.
    pub fn to_graph(&self, document: &Value, scope: &str) -> Result<Graph, PathogenError> {
        let quads = jsonld::to_rdf(document)?;
        debug!(quads = quads.len(), scope, "jsonld.to_rdf");
        let graph = Graph::from_quads(quads);
        Ok(graph.skolemize(&self.skolem_authority, scope))
    }

    pub fn convert(&self, document: &Value, scope: &str) -> Result<String, PathogenError> {
        Ok(self.to_graph(document, scope)?.to_ntriples())
    }
}
