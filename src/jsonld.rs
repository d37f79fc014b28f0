//! JSON-LD to RDF for self-contained documents.
//!
//! Supports inline contexts (`@vocab`, `@base`, `@language`, prefixes and
//! expanded term definitions with `@id`, `@type` coercion and `@list`
//! containers), `@graph`, nested node objects, value objects and lists.
//! Remote contexts, `@reverse`, `@included`, `@nest` and scoped contexts are
//! rejected. Blank nodes are labelled `b0`, `b1`, ... in document order.
//! Statements whose subject, predicate or object is an ill-formed IRI are
//! skipped, as JSON-LD 1.1 prescribes.

use std::borrow::Cow;
use std::collections::HashMap;

use serde_json::{Map, Number, Value};
use tracing::{debug, warn};

use crate::error::PathogenError;
use crate::rdf::term::{
    Literal, Quad, RDF_FIRST, RDF_NIL, RDF_REST, RDF_TYPE, Term, Triple, XSD_BOOLEAN, XSD_DOUBLE,
    XSD_INTEGER, is_forbidden_iri_char,
};

const MAX_IRI_DEPTH: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermDefinition {
    pub id: Option<String>,
    pub coercion: Option<String>,
    pub list_container: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ActiveContext {
    vocab: Option<String>,
    base: Option<String>,
    language: Option<String>,
    /// `None` marks a term explicitly mapped to null.
    terms: HashMap<String, Option<TermDefinition>>,
}

impl ActiveContext {
    pub fn parse(value: &Value) -> Result<Self, PathogenError> {
        let mut context = Self::default();
        context.merge(value)?;
        Ok(context)
    }

    pub fn vocab(&self) -> Option<&str> {
        self.vocab.as_deref()
    }

    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    fn with_local<'a>(&'a self, local: Option<&Value>) -> Result<Cow<'a, Self>, PathogenError> {
        match local {
            Some(value) => {
                let mut context = self.clone();
                context.merge(value)?;
                Ok(Cow::Owned(context))
            }
            None => Ok(Cow::Borrowed(self)),
        }
    }

    fn merge(&mut self, value: &Value) -> Result<(), PathogenError> {
        match value {
            Value::Null => {
                *self = Self::default();
                Ok(())
            }
            Value::Array(items) => items.iter().try_for_each(|item| self.merge(item)),
            Value::Object(map) => self.merge_object(map),
            Value::String(url) => Err(error(format!("remote context `{url}` is not supported"))),
            other => Err(error(format!("invalid @context value: {other}"))),
        }
    }

    fn merge_object(&mut self, map: &Map<String, Value>) -> Result<(), PathogenError> {
        for (key, entry) in map {
            match key.as_str() {
                "@vocab" => {
                    self.vocab = match entry {
                        Value::Null => None,
                        Value::String(vocab) => Some(vocab.clone()),
                        other => return Err(error(format!("invalid @vocab: {other}"))),
                    }
                }
                "@base" => {
                    self.base = match entry {
                        Value::Null => None,
                        Value::String(base) if is_absolute(base) => Some(base.clone()),
                        Value::String(base) => match &self.base {
                            Some(current) => Some(resolve(current, base)),
                            None => return Err(error(format!("relative @base `{base}`"))),
                        },
                        other => return Err(error(format!("invalid @base: {other}"))),
                    }
                }
                "@language" => {
                    self.language = match entry {
                        Value::Null => None,
                        Value::String(language) => Some(language.to_ascii_lowercase()),
                        other => return Err(error(format!("invalid @language: {other}"))),
                    }
                }
                "@version" | "@protected" | "@propagate" => {}
                keyword if keyword.starts_with('@') => {
                    return Err(error(format!("unsupported context keyword `{keyword}`")));
                }
                term => {
                    let definition = parse_term_definition(term, entry)?;
                    self.terms.insert(term.to_string(), definition);
                }
            }
        }
        Ok(())
    }

    fn definition(&self, term: &str) -> Option<&TermDefinition> {
        self.terms.get(term).and_then(Option::as_ref)
    }

    /// Expands a term, compact IRI or relative reference.
    ///
    /// `vocab` selects `@vocab` (properties, types) over `@base` (node ids).
    /// Returns `None` when the value cannot be made absolute.
    pub fn expand_iri(&self, value: &str, vocab: bool) -> Result<Option<String>, PathogenError> {
        self.expand_iri_at(value, vocab, 0)
    }

    fn expand_iri_at(
        &self,
        value: &str,
        vocab: bool,
        depth: usize,
    ) -> Result<Option<String>, PathogenError> {
        if depth > MAX_IRI_DEPTH {
            return Err(error(format!("cyclic IRI mapping involving `{value}`")));
        }
        if value.starts_with('@') {
            return Ok(Some(value.to_string()));
        }
        if vocab {
            match self.terms.get(value) {
                Some(None) => return Ok(None),
                Some(Some(TermDefinition { id: Some(id), .. })) if id != value => {
                    return self.expand_iri_at(id, true, depth + 1);
                }
                _ => {}
            }
        }
        if let Some((prefix, suffix)) = parse_prefix(value) {
            if prefix == "_" {
                return Ok(Some(value.to_string()));
            }
            if let Some(TermDefinition { id: Some(id), .. }) = self.definition(prefix) {
                if let Some(namespace) = self.expand_iri_at(id, true, depth + 1)? {
                    return Ok(Some(format!("{namespace}{suffix}")));
                }
            }
        }
        if is_absolute(value) {
            if is_well_formed(value) {
                return Ok(Some(value.to_string()));
            }
            // `Country: region` parses as a scheme but is not IRI-shaped; as a
            // node reference it is a relative path under @base.
            if !vocab {
                if let Some(base) = &self.base {
                    return Ok(Some(resolve(base, &format!("./{value}"))));
                }
                return Ok(Some(value.to_string()));
            }
        }
        if vocab {
            return Ok(self.vocab.as_ref().map(|vocab| format!("{vocab}{value}")));
        }
        Ok(self.base.as_ref().map(|base| resolve(base, value)))
    }
}

fn parse_term_definition(
    term: &str,
    entry: &Value,
) -> Result<Option<TermDefinition>, PathogenError> {
    match entry {
        Value::Null => Ok(None),
        Value::String(id) => Ok(Some(TermDefinition {
            id: Some(id.clone()),
            ..TermDefinition::default()
        })),
        Value::Object(map) => {
            let mut definition = TermDefinition::default();
            for (key, value) in map {
                match (key.as_str(), value) {
                    ("@id", Value::Null) => return Ok(None),
                    ("@id", Value::String(id)) => definition.id = Some(id.clone()),
                    ("@type", Value::String(coercion)) => {
                        if coercion == "@json" {
                            return Err(error(format!("`{term}`: @json literals are not supported")));
                        }
                        definition.coercion = Some(coercion.clone());
                    }
                    ("@container", Value::String(container)) => match container.as_str() {
                        "@list" => definition.list_container = true,
                        "@set" => {}
                        other => {
                            return Err(error(format!("`{term}`: unsupported container {other}")));
                        }
                    },
                    (key, _) => {
                        return Err(error(format!(
                            "`{term}`: unsupported term definition entry `{key}`"
                        )));
                    }
                }
            }
            Ok(Some(definition))
        }
        other => Err(error(format!("`{term}`: invalid term definition {other}"))),
    }
}

/// Interprets `document` as JSON-LD and returns its quads.
pub fn to_rdf(document: &Value) -> Result<Vec<Quad>, PathogenError> {
    let mut state = ToRdf::default();
    state.top_level(document, &ActiveContext::default())?;
    Ok(state.quads)
}

#[derive(Default)]
struct ToRdf {
    quads: Vec<Quad>,
    blank_counter: usize,
    blank_labels: HashMap<String, Term>,
}

impl ToRdf {
    fn fresh_blank(&mut self) -> Term {
        let term = Term::Blank(format!("b{}", self.blank_counter));
        self.blank_counter += 1;
        term
    }

    fn labeled_blank(&mut self, label: &str) -> Term {
        if let Some(term) = self.blank_labels.get(label) {
            return term.clone();
        }
        let term = self.fresh_blank();
        self.blank_labels.insert(label.to_string(), term.clone());
        term
    }

    fn emit(&mut self, subject: &Term, predicate: &str, object: Term, graph: Option<&Term>) {
        self.quads.push(Quad {
            triple: Triple::new(subject.clone(), Term::Iri(predicate.to_string()), object),
            graph: graph.cloned(),
        });
    }

    fn top_level(&mut self, value: &Value, context: &ActiveContext) -> Result<(), PathogenError> {
        match value {
            Value::Null => Ok(()),
            Value::Array(items) => items
                .iter()
                .try_for_each(|item| self.top_level(item, context)),
            Value::Object(map) => {
                let context = context.with_local(map.get("@context"))?;
                let graph_only = map.contains_key("@graph")
                    && map.keys().all(|key| key == "@context" || key == "@graph");
                if graph_only {
                    for item in as_items(&map["@graph"]) {
                        self.node(item, &context, None)?;
                    }
                } else {
                    self.node_map(map, &context, None)?;
                }
                Ok(())
            }
            other => Err(error(format!(
                "top-level value must be an object or array, found {other}"
            ))),
        }
    }

    fn node(
        &mut self,
        value: &Value,
        context: &ActiveContext,
        graph: Option<&Term>,
    ) -> Result<(), PathogenError> {
        match value {
            Value::Object(map) => self.node_map(map, context, graph).map(drop),
            Value::Null => Ok(()),
            other => Err(error(format!("expected a node object, found {other}"))),
        }
    }

    /// Returns the node's subject, or `None` when its `@id` is ill-formed.
    /// Nested nodes are still visited in that case.
    fn node_map(
        &mut self,
        map: &Map<String, Value>,
        context: &ActiveContext,
        graph: Option<&Term>,
    ) -> Result<Option<Term>, PathogenError> {
        let context = context.with_local(map.get("@context"))?;
        if map.contains_key("@value") || map.contains_key("@list") {
            return Err(error("value object found where a node was expected".to_string()));
        }

        let subject = match map.get("@id") {
            None | Some(Value::Null) => Some(self.fresh_blank()),
            Some(Value::String(id)) => self.reference(id, &context, false)?,
            Some(other) => return Err(error(format!("@id must be a string, found {other}"))),
        };

        for (key, value) in map {
            match key.as_str() {
                "@context" | "@id" => {}
                "@type" => {
                    for item in as_items(value) {
                        let Value::String(name) = item else {
                            return Err(error(format!("@type must be a string, found {item}")));
                        };
                        if let (Some(subject), Some(class)) =
                            (&subject, self.reference(name, &context, true)?)
                        {
                            self.emit(subject, RDF_TYPE, class, graph);
                        }
                    }
                }
                "@graph" => {
                    for item in as_items(value) {
                        self.node(item, &context, subject.as_ref())?;
                    }
                }
                "@reverse" | "@included" | "@nest" => {
                    return Err(error(format!("`{key}` is not supported")));
                }
                keyword if keyword.starts_with('@') => {
                    debug!(keyword, "jsonld.skip_keyword");
                }
                property => {
                    let predicate = match context.expand_iri(property, true)? {
                        Some(iri) if is_absolute(&iri) && !iri.starts_with("_:") => iri,
                        _ => {
                            debug!(property, "jsonld.drop_property");
                            continue;
                        }
                    };
                    let definition = context.definition(property).cloned();
                    let objects = self.objects(value, definition.as_ref(), &context, graph)?;
                    if !is_well_formed(&predicate) {
                        warn!(property, iri = %predicate, "jsonld.ill_formed_predicate");
                        continue;
                    }
                    if let Some(subject) = &subject {
                        for object in objects {
                            self.emit(subject, &predicate, object, graph);
                        }
                    }
                }
            }
        }

        Ok(subject)
    }

    fn objects(
        &mut self,
        value: &Value,
        definition: Option<&TermDefinition>,
        context: &ActiveContext,
        graph: Option<&Term>,
    ) -> Result<Vec<Term>, PathogenError> {
        let coercion = definition.and_then(|definition| definition.coercion.as_deref());
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) if definition.is_some_and(|definition| definition.list_container) => {
                let member_definition = definition.map(|definition| TermDefinition {
                    list_container: false,
                    ..definition.clone()
                });
                Ok(vec![self.list(items, member_definition.as_ref(), context, graph)?])
            }
            Value::Array(items) => {
                let mut terms = Vec::new();
                for item in items {
                    terms.extend(self.objects(item, definition, context, graph)?);
                }
                Ok(terms)
            }
            Value::String(text) => {
                let term = match coercion {
                    Some("@id") => match self.reference(text, context, false)? {
                        Some(term) => term,
                        None => return Ok(Vec::new()),
                    },
                    Some("@vocab") => match self.reference(text, context, true)? {
                        Some(term) => term,
                        None => return Ok(Vec::new()),
                    },
                    Some(datatype) => {
                        Term::Literal(Literal::typed(text.clone(), datatype_iri(datatype, context)?))
                    }
                    None => match &context.language {
                        Some(language) => Term::Literal(Literal::lang(text.clone(), language.clone())),
                        None => Term::string(text.clone()),
                    },
                };
                Ok(vec![term])
            }
            Value::Number(number) => {
                let (lexical, natural) = number_lexical(number);
                let datatype = match coercion {
                    Some(datatype) if !datatype.starts_with('@') => datatype_iri(datatype, context)?,
                    _ => natural.to_string(),
                };
                Ok(vec![Term::Literal(Literal::typed(lexical, datatype))])
            }
            Value::Bool(flag) => {
                let datatype = match coercion {
                    Some(datatype) if !datatype.starts_with('@') => datatype_iri(datatype, context)?,
                    _ => XSD_BOOLEAN.to_string(),
                };
                Ok(vec![Term::Literal(Literal::typed(flag.to_string(), datatype))])
            }
            Value::Object(map) => {
                if map.contains_key("@value") {
                    Ok(self.value_object(map, context)?.into_iter().collect())
                } else if let Some(list) = map.get("@list") {
                    let items: Vec<Value> = as_items(list).cloned().collect();
                    Ok(vec![self.list(&items, definition, context, graph)?])
                } else if let Some(set) = map.get("@set") {
                    self.objects(set, definition, context, graph)
                } else {
                    Ok(self.node_map(map, context, graph)?.into_iter().collect())
                }
            }
        }
    }

    fn value_object(
        &mut self,
        map: &Map<String, Value>,
        context: &ActiveContext,
    ) -> Result<Option<Term>, PathogenError> {
        let language = match map.get("@language") {
            None | Some(Value::Null) => None,
            Some(Value::String(language)) => Some(language.to_ascii_lowercase()),
            Some(other) => return Err(error(format!("invalid @language: {other}"))),
        };
        let datatype = match map.get("@type") {
            None | Some(Value::Null) => None,
            Some(Value::String(datatype)) => Some(datatype_iri(datatype, context)?),
            Some(other) => return Err(error(format!("invalid @type in value object: {other}"))),
        };
        if language.is_some() && datatype.is_some() {
            return Err(error("value object has both @language and @type".to_string()));
        }

        let (lexical, natural) = match &map["@value"] {
            Value::Null => return Ok(None),
            Value::String(text) => (text.clone(), None),
            Value::Number(number) => {
                let (lexical, natural) = number_lexical(number);
                (lexical, Some(natural))
            }
            Value::Bool(flag) => (flag.to_string(), Some(XSD_BOOLEAN)),
            other => return Err(error(format!("invalid @value: {other}"))),
        };

        let literal = match (language, datatype, natural) {
            (Some(language), _, None) => Literal::lang(lexical, language),
            (Some(_), _, Some(_)) => {
                return Err(error("@language on a non-string @value".to_string()));
            }
            (None, Some(datatype), _) => Literal::typed(lexical, datatype),
            (None, None, Some(natural)) => Literal::typed(lexical, natural),
            (None, None, None) => Literal::string(lexical),
        };
        Ok(Some(Term::Literal(literal)))
    }

    fn list(
        &mut self,
        items: &[Value],
        definition: Option<&TermDefinition>,
        context: &ActiveContext,
        graph: Option<&Term>,
    ) -> Result<Term, PathogenError> {
        let mut members = Vec::new();
        for item in items {
            members.extend(self.objects(item, definition, context, graph)?);
        }
        if members.is_empty() {
            return Ok(Term::iri(RDF_NIL));
        }
        let cells: Vec<Term> = members.iter().map(|_| self.fresh_blank()).collect();
        for (index, member) in members.into_iter().enumerate() {
            let rest = cells
                .get(index + 1)
                .cloned()
                .unwrap_or_else(|| Term::iri(RDF_NIL));
            self.emit(&cells[index], RDF_FIRST, member, graph);
            self.emit(&cells[index], RDF_REST, rest, graph);
        }
        Ok(cells[0].clone())
    }

    /// Node reference: blank label, or an IRI resolved against `@base`
    /// (`vocab == false`) or `@vocab`. `None` for an ill-formed IRI.
    fn reference(
        &mut self,
        value: &str,
        context: &ActiveContext,
        vocab: bool,
    ) -> Result<Option<Term>, PathogenError> {
        if let Some(label) = value.strip_prefix("_:") {
            return Ok(Some(self.labeled_blank(label)));
        }
        match context.expand_iri(value, vocab)? {
            Some(iri) if is_absolute(&iri) => {
                if is_well_formed(&iri) {
                    Ok(Some(Term::Iri(iri)))
                } else {
                    warn!(value, iri = %iri, "jsonld.ill_formed_iri");
                    Ok(None)
                }
            }
            _ => Err(error(format!("`{value}` does not resolve to an absolute IRI"))),
        }
    }
}

fn datatype_iri(datatype: &str, context: &ActiveContext) -> Result<String, PathogenError> {
    match context.expand_iri(datatype, true)? {
        Some(iri) if is_absolute(&iri) => checked_iri(iri),
        _ => Err(error(format!("datatype `{datatype}` is not an absolute IRI"))),
    }
}

/// Lexical form and natural datatype of a JSON number.
///
/// Integral values below 10^21 are `xsd:integer`; the rest are
/// `xsd:double` in canonical `d.dddE±n` form.
fn number_lexical(number: &Number) -> (String, &'static str) {
    if let Some(value) = number.as_i64() {
        return (value.to_string(), XSD_INTEGER);
    }
    if let Some(value) = number.as_u64() {
        return (value.to_string(), XSD_INTEGER);
    }
    let value = number.as_f64().unwrap_or(f64::NAN);
    if value.fract() == 0.0 && value.abs() < 1e21 {
        return (format!("{}", value as i128), XSD_INTEGER);
    }
    (canonical_double(value), XSD_DOUBLE)
}

fn canonical_double(value: f64) -> String {
    let formatted = format!("{value:E}");
    match formatted.split_once('E') {
        Some((mantissa, exponent)) if !mantissa.contains('.') => {
            format!("{mantissa}.0E{exponent}")
        }
        _ => formatted,
    }
}

fn is_well_formed(iri: &str) -> bool {
    !iri.chars().any(is_forbidden_iri_char)
}

fn checked_iri(iri: String) -> Result<String, PathogenError> {
    if !is_well_formed(&iri) {
        return Err(error(format!("invalid IRI `{iri}`")));
    }
    Ok(iri)
}

fn as_items(value: &Value) -> impl Iterator<Item = &Value> {
    match value {
        Value::Array(items) => items.iter().collect::<Vec<_>>().into_iter(),
        other => vec![other].into_iter(),
    }
}

fn error(message: String) -> PathogenError {
    PathogenError::JsonLd(message)
}

/// Splits a compact IRI `prefix:suffix`. Absolute IRIs (`scheme://...`) and
/// empty prefixes are not compact.
pub fn parse_prefix(value: &str) -> Option<(&str, &str)> {
    let (prefix, suffix) = value.split_once(':')?;
    if prefix.is_empty() || prefix.contains('/') || suffix.starts_with("//") {
        return None;
    }
    Some((prefix, suffix))
}

/// True when `iri` starts with an RFC 3986 scheme.
pub fn is_absolute(iri: &str) -> bool {
    match iri.split_once(':') {
        Some((scheme, _)) => {
            let mut bytes = scheme.bytes();
            bytes.next().is_some_and(|first| first.is_ascii_alphabetic())
                && bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'))
        }
        None => false,
    }
}

/// Resolves `relative` against `base`, percent-encoding characters that are
/// not allowed in an IRI.
pub fn resolve(base: &str, relative: &str) -> String {
    let relative = percent_encode(relative);
    if relative.is_empty() {
        return base.to_string();
    }
    if is_absolute(&relative) {
        return relative;
    }
    let without_fragment = base.split('#').next().unwrap_or(base);
    if relative.starts_with('#') {
        return format!("{without_fragment}{relative}");
    }
    let without_query = without_fragment.split('?').next().unwrap_or(without_fragment);
    if relative.starts_with('?') {
        return format!("{without_query}{relative}");
    }
    let authority_start = without_query.find("://").map(|index| index + 3);
    if let Some(rest) = relative.strip_prefix("//") {
        let scheme = base.split(':').next().unwrap_or("https");
        return format!("{scheme}://{rest}");
    }
    if relative.starts_with('/') {
        let root_end = authority_start
            .and_then(|start| without_query[start..].find('/').map(|index| start + index))
            .unwrap_or(without_query.len());
        return format!("{}{relative}", &without_query[..root_end]);
    }
    let directory = match without_query.rfind('/') {
        Some(index) if authority_start.is_none_or(|start| index >= start) => {
            &without_query[..=index]
        }
        _ => without_query,
    };
    let relative = relative.trim_start_matches("./");
    if directory.ends_with('/') {
        format!("{directory}{relative}")
    } else {
        format!("{directory}/{relative}")
    }
}

fn percent_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for ch in value.chars() {
        if is_forbidden_iri_char(ch) {
            let mut buffer = [0u8; 4];
            for byte in ch.encode_utf8(&mut buffer).bytes() {
                encoded.push_str(&format!("%{byte:02X}"));
            }
        } else {
            encoded.push(ch);
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::rdf::term::XSD_STRING;

    fn triples(document: Value) -> Vec<String> {
        let mut lines: Vec<String> = to_rdf(&document)
            .unwrap()
            .into_iter()
            .map(|quad| quad.to_string())
            .collect();
        lines.sort();
        lines
    }

    #[test]
    fn vocab_and_prefix_expansion() {
        let context = ActiveContext::parse(&json!({
            "@vocab": "https://schema.org/",
            "dct": "http://purl.org/dc/terms/",
            "title": "dct:title"
        }))
        .unwrap();
        assert_eq!(
            context.expand_iri("name", true).unwrap().as_deref(),
            Some("https://schema.org/name")
        );
        assert_eq!(
            context.expand_iri("title", true).unwrap().as_deref(),
            Some("http://purl.org/dc/terms/title")
        );
        assert_eq!(
            context.expand_iri("dct:creator", true).unwrap().as_deref(),
            Some("http://purl.org/dc/terms/creator")
        );
        assert_eq!(context.expand_iri("relative", false).unwrap(), None);
    }

    #[test]
    fn cyclic_mapping_fails() {
        let context = ActiveContext::parse(&json!({ "a": "b:x", "b": "a:y" })).unwrap();
        let err = context.expand_iri("a", true).unwrap_err();
        assert!(matches!(err, PathogenError::JsonLd(_)));
    }

    #[test]
    fn remote_context_rejected() {
        let err = to_rdf(&json!({ "@context": "https://schema.org/", "name": "x" })).unwrap_err();
        assert!(matches!(err, PathogenError::JsonLd(_)));
    }

    #[test]
    fn nested_nodes_become_blank_nodes() {
        let lines = triples(json!({
            "@context": { "@vocab": "https://schema.org/" },
            "@id": "https://example.com/a",
            "spatialCoverage": { "@type": "Place", "name": "Kenya" }
        }));
        assert_eq!(
            lines,
            vec![
                "<https://example.com/a> <https://schema.org/spatialCoverage> _:b0 .",
                "_:b0 <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <https://schema.org/Place> .",
                "_:b0 <https://schema.org/name> \"Kenya\" .",
            ]
        );
    }

    #[test]
    fn relative_id_resolved_against_base() {
        let lines = triples(json!({
            "@context": { "@vocab": "https://schema.org/", "@base": "https://example.com/places/" },
            "@id": "United Kingdom",
            "name": "United Kingdom"
        }));
        assert_eq!(
            lines,
            vec![
                "<https://example.com/places/United%20Kingdom> <https://schema.org/name> \"United Kingdom\" ."
            ]
        );
    }

    #[test]
    fn relative_id_without_base_fails() {
        let err = to_rdf(&json!({
            "@context": { "@vocab": "https://schema.org/" },
            "@id": "United Kingdom",
            "name": "x"
        }))
        .unwrap_err();
        assert!(matches!(err, PathogenError::JsonLd(_)));
    }

    #[test]
    fn scheme_like_id_resolves_against_base() {
        let lines = triples(json!({
            "@context": { "@vocab": "https://schema.org/", "@base": "https://example.com/places/" },
            "@id": "https://example.com/a",
            "name": "A",
            "spatialCoverage": { "@id": "USA: California", "name": "USA: California" }
        }));
        assert_eq!(
            lines,
            vec![
                "<https://example.com/a> <https://schema.org/name> \"A\" .",
                "<https://example.com/a> <https://schema.org/spatialCoverage> <https://example.com/places/USA:%20California> .",
                "<https://example.com/places/USA:%20California> <https://schema.org/name> \"USA: California\" .",
            ]
        );
    }

    #[test]
    fn scheme_like_id_without_base_is_skipped() {
        let lines = triples(json!({
            "@context": { "@vocab": "https://schema.org/" },
            "@id": "https://example.com/a",
            "name": "A",
            "spatialCoverage": { "@id": "USA: California", "name": "California" }
        }));
        assert_eq!(lines, vec!["<https://example.com/a> <https://schema.org/name> \"A\" ."]);
    }

    #[test]
    fn ill_formed_property_is_skipped() {
        let lines = triples(json!({
            "@context": { "@vocab": "https://schema.org/" },
            "@id": "https://example.com/a",
            "name": "A",
            "has space": "x"
        }));
        assert_eq!(lines, vec!["<https://example.com/a> <https://schema.org/name> \"A\" ."]);
    }

    #[test]
    fn native_values_and_coercion() {
        let quads = to_rdf(&json!({
            "@context": {
                "@vocab": "https://schema.org/",
                "sameAs": { "@type": "@id" }
            },
            "@id": "https://example.com/a",
            "count": 3,
            "ratio": 0.5,
            "active": true,
            "sameAs": "https://example.org/b",
            "label": { "@value": "chat", "@language": "FR" },
            "dropped": null
        }))
        .unwrap();
        let objects: Vec<&Term> = quads.iter().map(|quad| &quad.triple.object).collect();
        assert!(objects.contains(&&Term::Literal(Literal::typed("3", XSD_INTEGER))));
        assert!(objects.contains(&&Term::Literal(Literal::typed("5.0E-1", XSD_DOUBLE))));
        assert!(objects.contains(&&Term::Literal(Literal::typed("true", XSD_BOOLEAN))));
        assert!(objects.contains(&&Term::iri("https://example.org/b")));
        assert!(objects.contains(&&Term::Literal(Literal::lang("chat", "fr"))));
        assert_eq!(quads.len(), 5);
    }

    #[test]
    fn list_values_chain_through_rdf_rest() {
        let quads = to_rdf(&json!({
            "@context": { "@vocab": "https://schema.org/" },
            "@id": "https://example.com/a",
            "itemListElement": { "@list": ["x", "y"] }
        }))
        .unwrap();
        let rests = quads
            .iter()
            .filter(|quad| quad.triple.predicate == Term::iri(RDF_REST))
            .count();
        assert_eq!(rests, 2);
        assert!(quads.iter().any(|quad| quad.triple.object == Term::iri(RDF_NIL)));
        assert!(
            quads
                .iter()
                .any(|quad| quad.triple.object == Term::Literal(Literal::typed("y", XSD_STRING)))
        );
    }

    #[test]
    fn graph_container_emits_every_node() {
        let lines = triples(json!({
            "@context": { "@vocab": "https://schema.org/" },
            "@graph": [
                { "@id": "https://example.com/a", "name": "A" },
                { "@id": "https://example.com/b", "about": { "@id": "https://example.com/a" } }
            ]
        }));
        assert_eq!(lines.len(), 2);
        assert!(lines.contains(
            &"<https://example.com/b> <https://schema.org/about> <https://example.com/a> ."
                .to_string()
        ));
    }

    #[test]
    fn named_graph_labels_quads() {
        let quads = to_rdf(&json!({
            "@context": { "@vocab": "https://schema.org/" },
            "@id": "https://example.com/g",
            "@graph": { "@id": "https://example.com/a", "name": "A" }
        }))
        .unwrap();
        assert_eq!(quads.len(), 1);
        assert_eq!(quads[0].graph, Some(Term::iri("https://example.com/g")));
    }

    #[test]
    fn unmapped_property_is_dropped() {
        let lines = triples(json!({
            "@id": "https://example.com/a",
            "name": "no vocab"
        }));
        assert!(lines.is_empty());
    }

    #[test]
    fn resolve_relative_references() {
        assert_eq!(
            resolve("https://example.com/a/b", "c d"),
            "https://example.com/a/c%20d"
        );
        assert_eq!(resolve("https://example.com/a/b", "/root"), "https://example.com/root");
        assert_eq!(resolve("https://example.com/a/b#x", "#y"), "https://example.com/a/b#y");
        assert_eq!(resolve("https://example.com", "x"), "https://example.com/x");
    }

    #[test]
    fn canonical_doubles() {
        assert_eq!(canonical_double(0.5), "5.0E-1");
        assert_eq!(canonical_double(1.25), "1.25E0");
    }
}
