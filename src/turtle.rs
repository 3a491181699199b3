//! Minimal Turtle writer: a fixed prefix preamble and a clause-tracking
//! builder for one subject with nested anonymous resources.
//!
//! A [`Resource`] is a list of predicate/object clauses. Separators are only
//! written between clauses while rendering, so a resource never needs its
//! last clause rewritten, and a nested resource is rendered from its own
//! clause list only after it has been fully built and attached to its parent.

use std::fmt::Write;

use crate::format::escape_literal;

/// A namespace declared in the output preamble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Namespace {
    pub prefix: &'static str,
    pub iri: &'static str,
}

impl Namespace {
    const fn new(prefix: &'static str, iri: &'static str) -> Self {
        Self { prefix, iri }
    }

    /// A term for `local` in this namespace: `prefix:local` when `local` is a
    /// plain Turtle local name, otherwise the full `<iri>`.
    pub fn term(&self, local: &str) -> String {
        if is_plain_local_name(local) {
            format!("{}:{}", self.prefix, local)
        } else {
            format!("<{}{}>", self.iri, encode_iri(local))
        }
    }
}

pub const FANTA: Namespace = Namespace::new("fanta", "https://fanta.bio/cre/");
pub const REFTSS: Namespace = Namespace::new("reftss", "https://reftss.riken.jp/reftss/TSS:");
pub const FANTAO: Namespace = Namespace::new("fantao", "https://fanta.bio/ontology/");
pub const DCT: Namespace = Namespace::new("dct", "http://purl.org/dc/terms/");
pub const SKOS: Namespace = Namespace::new("skos", "http://www.w3.org/2004/02/skos/core#");
pub const OBO: Namespace = Namespace::new("obo", "http://purl.obolibrary.org/obo/");
pub const NCBIGENE: Namespace = Namespace::new("ncbigene", "http://identifiers.org/ncbigene/");
pub const HGNC: Namespace = Namespace::new("hgnc", "http://identifiers.org/hgnc/");
pub const ENSEMBL: Namespace = Namespace::new("ensembl", "http://identifiers.org/ensembl/");
pub const REFSEQ: Namespace = Namespace::new("refseq", "http://identifiers.org/refseq/");
pub const INSDC: Namespace = Namespace::new("insdc", "http://identifiers.org/insdc/");
pub const MGI: Namespace = Namespace::new("mgi", "http://identifiers.org/mgi/");
pub const UNIPROT: Namespace = Namespace::new("uniprot", "http://purl.uniprot.org/uniprot/");
pub const SRA: Namespace = Namespace::new("sra", "http://identifiers.org/insdc.sra/");
pub const HCO: Namespace = Namespace::new("hco", "http://identifiers.org/hco/");
pub const FALDO: Namespace = Namespace::new("faldo", "http://biohackathon.org/resource/faldo#");
pub const TAX: Namespace = Namespace::new("tax", "http://identifiers.org/taxonomy/");
pub const SIO: Namespace = Namespace::new("sio", "http://semanticscience.org/resource/");
pub const RDF: Namespace = Namespace::new("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#");
pub const RDFS: Namespace = Namespace::new("rdfs", "http://www.w3.org/2000/01/rdf-schema#");
pub const SCREEN: Namespace = Namespace::new(
    "screen",
    "https://screen.encodeproject.org/search/?assembly=GRCh38&q=",
);
pub const FOAF: Namespace = Namespace::new("foaf", "http://xmlns.com/foaf/0.1/");

/// Preamble order.
pub const NAMESPACES: [Namespace; 22] = [
    FANTA, REFTSS, FANTAO, DCT, SKOS, OBO, NCBIGENE, HGNC, ENSEMBL, REFSEQ, INSDC, MGI, UNIPROT,
    SRA, HCO, FALDO, TAX, SIO, RDF, RDFS, SCREEN, FOAF,
];

/// The `@prefix` block written once at the top of every species file,
/// followed by a blank line.
pub fn prefixes() -> String {
    let width = NAMESPACES
        .iter()
        .map(|ns| ns.prefix.len())
        .max()
        .unwrap_or(0)
        + 1;
    let mut out = String::new();
    for ns in NAMESPACES {
        let label = format!("{}:", ns.prefix);
        let _ = writeln!(out, "@prefix {label:<width$} <{}> .", ns.iri);
    }
    out.push('\n');
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `[ a X ; p o ]` on a single line.
    Inline,
    /// One clause per line, closing bracket on its own line.
    Block,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Prefixed name, IRI or numeric token, written as-is.
    Term(String),
    /// Plain string literal, escaped on render.
    Literal(String),
    Resource(Resource),
}

#[derive(Debug, Clone, PartialEq)]
struct Clause {
    predicate: &'static str,
    objects: Vec<Object>,
}

/// An anonymous resource, or the predicate list of a subject.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    layout: Layout,
    clauses: Vec<Clause>,
}

impl Resource {
    pub fn inline() -> Self {
        Self {
            layout: Layout::Inline,
            clauses: Vec::new(),
        }
    }

    pub fn block() -> Self {
        Self {
            layout: Layout::Block,
            clauses: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// `a T1, T2, ...`
    pub fn types(mut self, classes: &[String]) -> Self {
        self.clauses.push(Clause {
            predicate: "a",
            objects: classes.iter().cloned().map(Object::Term).collect(),
        });
        self
    }

    pub fn typed(self, class: String) -> Self {
        self.types(&[class])
    }

    pub fn term(mut self, predicate: &'static str, term: String) -> Self {
        self.push(predicate, Object::Term(term));
        self
    }

    pub fn literal(mut self, predicate: &'static str, text: &str) -> Self {
        self.push(predicate, Object::Literal(text.to_string()));
        self
    }

    pub fn integer(mut self, predicate: &'static str, value: i64) -> Self {
        self.push(predicate, Object::Term(value.to_string()));
        self
    }

    pub fn resource(mut self, predicate: &'static str, resource: Resource) -> Self {
        self.push(predicate, Object::Resource(resource));
        self
    }

    pub fn push(&mut self, predicate: &'static str, object: Object) {
        self.clauses.push(Clause {
            predicate,
            objects: vec![object],
        });
    }

    fn render_nested(&self, out: &mut String, indent: usize) {
        if self.clauses.is_empty() {
            out.push_str("[]");
            return;
        }
        match self.layout {
            Layout::Inline => {
                out.push_str("[ ");
                for (i, clause) in self.clauses.iter().enumerate() {
                    if i > 0 {
                        out.push_str(" ; ");
                    }
                    clause.render(out, indent);
                }
                out.push_str(" ]");
            }
            Layout::Block => {
                let inner = indent + 2;
                out.push_str("[\n");
                for (i, clause) in self.clauses.iter().enumerate() {
                    if i > 0 {
                        out.push_str(" ;\n");
                    }
                    push_indent(out, inner);
                    clause.render(out, inner);
                }
                out.push('\n');
                push_indent(out, indent);
                out.push(']');
            }
        }
    }
}

impl Clause {
    fn render(&self, out: &mut String, indent: usize) {
        out.push_str(self.predicate);
        out.push(' ');
        for (i, object) in self.objects.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            match object {
                Object::Term(term) => out.push_str(term),
                Object::Literal(text) => {
                    out.push('"');
                    out.push_str(&escape_literal(text));
                    out.push('"');
                }
                Object::Resource(resource) => resource.render_nested(out, indent),
            }
        }
    }
}

/// A named subject and its predicate list.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    subject: String,
    body: Resource,
}

impl Statement {
    pub fn new(subject: String, body: Resource) -> Self {
        Self { subject, body }
    }

    /// Renders the statement terminated by ` .` and followed by a blank line.
    /// The first clause shares the subject line, later clauses are indented
    /// by two spaces.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.subject);
        for (i, clause) in self.body.clauses.iter().enumerate() {
            if i == 0 {
                out.push(' ');
            } else {
                out.push_str(" ;\n");
                push_indent(&mut out, 2);
            }
            clause.render(&mut out, 2);
        }
        out.push_str(" .\n\n");
        out
    }
}

fn push_indent(out: &mut String, width: usize) {
    out.extend(std::iter::repeat_n(' ', width));
}

fn is_plain_local_name(local: &str) -> bool {
    let bytes = local.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return false;
    };
    let body = |b: &u8| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b':');
    (first.is_ascii_alphanumeric() || matches!(first, b'_' | b':'))
        && *last != b'.'
        && bytes.iter().all(body)
}

fn encode_iri(local: &str) -> String {
    let mut out = String::with_capacity(local.len());
    for ch in local.chars() {
        match ch {
            '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' | ' ' => {
                let _ = write!(out, "%{:02X}", ch as u32);
            }
            c if c.is_control() => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    let _ = write!(out, "%{byte:02X}");
                }
            }
            c => out.push(c),
        }
    }
    out
}
