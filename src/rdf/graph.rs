use std::collections::BTreeSet;

use crate::rdf::term::{Quad, Term, Triple};

/// Set of triples ordered subject, predicate, object.
///
/// Iteration order is the canonical serialization order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    triples: BTreeSet<Triple>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects quads, merging every named graph into the default graph.
    pub fn from_quads<I>(quads: I) -> Self
    where
        I: IntoIterator<Item = Quad>,
    {
        let triples = quads.into_iter().map(|quad| quad.triple).collect();
        Self { triples }
    }

    pub fn insert(&mut self, triple: Triple) -> bool {
        self.triples.insert(triple)
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    pub fn has_blank_nodes(&self) -> bool {
        self.triples
            .iter()
            .any(|triple| triple.subject.is_blank() || triple.object.is_blank())
    }

    /// Triples whose predicate is `predicate`.
    pub fn with_predicate<'a>(&'a self, predicate: &'a str) -> impl Iterator<Item = &'a Triple> {
        self.triples
            .iter()
            .filter(move |triple| triple.predicate.as_iri() == Some(predicate))
    }

    /// Replaces every blank node with
    /// `<authority>/.well-known/genid/<scope>/<label>`.
    ///
    /// `scope` names the document, so graphs converted under different scopes
    /// never share a skolem IRI. The IRI depends only on scope and label, so
    /// equal input graphs map to equal output graphs. An empty scope is
    /// omitted from the path.
    pub fn skolemize(&self, authority: &str, scope: &str) -> Graph {
        let authority = authority.trim_end_matches('/');
        let prefix = if scope.is_empty() {
            format!("{authority}/.well-known/genid/")
        } else {
            format!("{authority}/.well-known/genid/{}/", path_segment(scope))
        };
        let skolem = |term: &Term| match term {
            Term::Blank(label) => Term::Iri(format!("{prefix}{label}")),
            other => other.clone(),
        };
        let triples = self
            .triples
            .iter()
            .map(|triple| {
                Triple::new(
                    skolem(&triple.subject),
                    triple.predicate.clone(),
                    skolem(&triple.object),
                )
            })
            .collect();
        Graph { triples }
    }

    /// Canonical N-Triples: one sorted statement per line.
    pub fn to_ntriples(&self) -> String {
        let mut output = String::new();
        for triple in &self.triples {
            output.push_str(&triple.to_string());
            output.push('\n');
        }
        output
    }
}

/// Percent-encodes everything outside the RFC 3986 unreserved set.
fn path_segment(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

impl FromIterator<Triple> for Graph {
    fn from_iter<T: IntoIterator<Item = Triple>>(iter: T) -> Self {
        Self {
            triples: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::term::Literal;

    fn sample() -> Graph {
        Graph::from_iter([
            Triple::new(
                Term::blank("b1"),
                Term::iri("http://ex/name"),
                Term::string("x"),
            ),
            Triple::new(
                Term::iri("http://ex/a"),
                Term::iri("http://ex/p"),
                Term::blank("b1"),
            ),
        ])
    }

    #[test]
    fn skolemize_removes_blank_nodes() {
        let graph = sample().skolemize("https://example.com/", "ERR1");
        assert!(!graph.has_blank_nodes());
        assert!(graph.contains(&Triple::new(
            Term::iri("http://ex/a"),
            Term::iri("http://ex/p"),
            Term::iri("https://example.com/.well-known/genid/ERR1/b1"),
        )));
    }

    #[test]
    fn scopes_keep_skolem_iris_apart() {
        let first = sample().skolemize("https://example.com", "ERR1");
        let second = sample().skolemize("https://example.com", "ERR2");
        let genids = |graph: &Graph| -> BTreeSet<Term> {
            graph
                .iter()
                .flat_map(|triple| [triple.subject.clone(), triple.object.clone()])
                .filter(|term| term.as_iri().is_some_and(|iri| iri.contains("/genid/")))
                .collect()
        };
        assert_eq!(genids(&first).len(), 1);
        assert!(genids(&first).is_disjoint(&genids(&second)));
        assert_eq!(first, sample().skolemize("https://example.com", "ERR1"));
    }

    #[test]
    fn scope_is_percent_encoded() {
        let graph = sample().skolemize("https://example.com", "a b/c");
        assert!(graph.iter().any(|triple| {
            triple.subject == Term::iri("https://example.com/.well-known/genid/a%20b%2Fc/b1")
        }));
        let unscoped = sample().skolemize("https://example.com", "");
        assert!(unscoped.iter().any(|triple| {
            triple.subject == Term::iri("https://example.com/.well-known/genid/b1")
        }));
    }

    #[test]
    fn ntriples_output_is_sorted() {
        let graph = sample().skolemize("https://example.com", "ERR1");
        let text = graph.to_ntriples();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("<http://ex/a>"));
        assert!(lines[1].starts_with("<https://example.com/.well-known/genid/ERR1/b1>"));
    }

    #[test]
    fn from_quads_merges_graphs() {
        let triple = Triple::new(
            Term::iri("http://ex/s"),
            Term::iri("http://ex/p"),
            Term::Literal(Literal::string("o")),
        );
        let graph = Graph::from_quads([
            Quad {
                triple: triple.clone(),
                graph: None,
            },
            Quad {
                triple,
                graph: Some(Term::iri("http://ex/g")),
            },
        ]);
        assert_eq!(graph.len(), 1);
    }
}
