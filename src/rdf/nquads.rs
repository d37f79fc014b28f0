//! Line-oriented N-Quads / N-Triples reader and writer.

use crate::error::PathogenError;
use crate::rdf::graph::Graph;
use crate::rdf::term::{Literal, Quad, Term, Triple, XSD_STRING};

pub fn write_nquads(quads: &[Quad]) -> String {
    let mut output = String::new();
    for quad in quads {
        output.push_str(&quad.to_string());
        output.push('\n');
    }
    output
}

pub fn parse_nquads(text: &str) -> Result<Vec<Quad>, PathogenError> {
    parse_statements(text, true)
}

/// Parses N-Triples (N-Quads without graph labels) into a [`Graph`].
pub fn parse_ntriples(text: &str) -> Result<Graph, PathogenError> {
    parse_statements(text, false).map(Graph::from_quads)
}

fn parse_statements(text: &str, allow_graph: bool) -> Result<Vec<Quad>, PathogenError> {
    let mut quads = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut reader = LineReader::new(trimmed, index + 1);
        let subject = reader.term()?;
        let predicate = reader.term()?;
        let object = reader.term()?;
        reader.skip_ws();
        let graph = if reader.peek() == Some('.') {
            None
        } else if allow_graph {
            Some(reader.term()?)
        } else {
            return Err(reader.error("graph label in N-Triples input"));
        };
        reader.skip_ws();
        reader.expect('.')?;
        reader.skip_ws();
        if !reader.at_end() && reader.peek() != Some('#') {
            return Err(reader.error("trailing content after statement"));
        }
        if matches!(subject, Term::Literal(_)) {
            return Err(reader.error("literal in subject position"));
        }
        if !matches!(predicate, Term::Iri(_)) {
            return Err(reader.error("predicate must be an IRI"));
        }
        quads.push(Quad {
            triple: Triple::new(subject, predicate, object),
            graph,
        });
    }
    Ok(quads)
}

struct LineReader {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl LineReader {
    fn new(source: &str, line: usize) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line,
        }
    }

    fn error(&self, message: &str) -> PathogenError {
        PathogenError::NQuadsParse {
            line: self.line,
            message: format!("{message} (column {})", self.pos + 1),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), PathogenError> {
        match self.bump() {
            Some(ch) if ch == expected => Ok(()),
            _ => Err(self.error(&format!("expected `{expected}`"))),
        }
    }

    fn term(&mut self) -> Result<Term, PathogenError> {
        self.skip_ws();
        match self.peek() {
            Some('<') => Ok(Term::Iri(self.iri()?)),
            Some('_') => self.blank(),
            Some('"') => self.literal(),
            _ => Err(self.error("expected a term")),
        }
    }

    fn iri(&mut self) -> Result<String, PathogenError> {
        self.expect('<')?;
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('>') => return Ok(value),
                Some('\\') => value.push(self.unicode_escape()?),
                Some(ch) if ch == ' ' || ch == '<' || ch == '"' => {
                    return Err(self.error("invalid character in IRI"));
                }
                Some(ch) => value.push(ch),
                None => return Err(self.error("unterminated IRI")),
            }
        }
    }

    fn blank(&mut self) -> Result<Term, PathogenError> {
        self.expect('_')?;
        self.expect(':')?;
        let start = self.pos;
        while matches!(self.peek(), Some(ch) if !ch.is_whitespace() && ch != '.') {
            self.pos += 1;
        }
        // a label may contain dots, but not end with one
        while matches!(self.peek(), Some('.'))
            && matches!(self.chars.get(self.pos + 1), Some(ch) if !ch.is_whitespace())
        {
            self.pos += 1;
            while matches!(self.peek(), Some(ch) if !ch.is_whitespace() && ch != '.') {
                self.pos += 1;
            }
        }
        if self.pos == start {
            return Err(self.error("empty blank node label"));
        }
        Ok(Term::Blank(self.chars[start..self.pos].iter().collect()))
    }

    fn literal(&mut self) -> Result<Term, PathogenError> {
        self.expect('"')?;
        let mut lexical = String::new();
        loop {
            match self.bump() {
                Some('"') => break,
                Some('\\') => {
                    let escaped = match self.peek() {
                        Some('t') => '\t',
                        Some('b') => '\u{8}',
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('f') => '\u{c}',
                        Some('"') => '"',
                        Some('\'') => '\'',
                        Some('\\') => '\\',
                        Some('u' | 'U') => {
                            lexical.push(self.unicode_escape()?);
                            continue;
                        }
                        _ => return Err(self.error("invalid escape in literal")),
                    };
                    self.pos += 1;
                    lexical.push(escaped);
                }
                Some(ch) => lexical.push(ch),
                None => return Err(self.error("unterminated literal")),
            }
        }
        match self.peek() {
            Some('@') => {
                self.pos += 1;
                let start = self.pos;
                while matches!(self.peek(), Some(ch) if ch.is_ascii_alphanumeric() || ch == '-') {
                    self.pos += 1;
                }
                if self.pos == start {
                    return Err(self.error("empty language tag"));
                }
                let language: String = self.chars[start..self.pos].iter().collect();
                Ok(Term::Literal(Literal::lang(lexical, language)))
            }
            Some('^') => {
                self.expect('^')?;
                self.expect('^')?;
                let datatype = self.iri()?;
                Ok(Term::Literal(Literal::typed(lexical, datatype)))
            }
            _ => Ok(Term::Literal(Literal::typed(lexical, XSD_STRING))),
        }
    }

    /// Reads `uXXXX` or `UXXXXXXXX` after a consumed backslash.
    fn unicode_escape(&mut self) -> Result<char, PathogenError> {
        let width = match self.bump() {
            Some('u') => 4,
            Some('U') => 8,
            _ => return Err(self.error("invalid escape")),
        };
        if self.pos + width > self.chars.len() {
            return Err(self.error("truncated unicode escape"));
        }
        let digits: String = self.chars[self.pos..self.pos + width].iter().collect();
        self.pos += width;
        u32::from_str_radix(&digits, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error("invalid unicode escape"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quads_with_and_without_graph() {
        let text = r#"
# comment
<http://ex/s> <http://ex/p> "tab\there"@en .
_:b0 <http://ex/p> "1"^^<http://www.w3.org/2001/XMLSchema#integer> <http://ex/g> .
"#;
        let quads = parse_nquads(text).unwrap();
        assert_eq!(quads.len(), 2);
        assert_eq!(
            quads[0].triple.object,
            Term::Literal(Literal::lang("tab\there", "en"))
        );
        assert_eq!(quads[1].triple.subject, Term::blank("b0"));
        assert_eq!(quads[1].graph, Some(Term::iri("http://ex/g")));
    }

    #[test]
    fn writer_output_parses_back() {
        let quads = vec![Quad {
            triple: Triple::new(
                Term::blank("b3"),
                Term::iri("https://schema.org/name"),
                Term::string("quote \" and \\ backslash\nline"),
            ),
            graph: None,
        }];
        let text = write_nquads(&quads);
        assert_eq!(parse_nquads(&text).unwrap(), quads);
    }

    #[test]
    fn rejects_literal_subject() {
        let err = parse_nquads("\"x\" <http://ex/p> <http://ex/o> .").unwrap_err();
        assert!(matches!(err, PathogenError::NQuadsParse { line: 1, .. }));
    }

    #[test]
    fn ntriples_rejects_graph_label() {
        let err =
            parse_ntriples("<http://ex/s> <http://ex/p> <http://ex/o> <http://ex/g> .").unwrap_err();
        assert!(matches!(err, PathogenError::NQuadsParse { line: 1, .. }));
    }
}
