use std::collections::HashMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::warn;

use crate::error::FantaError;

/// NCBI Gene ids and official symbols for one taxon, as served by the
/// RDF portal NCBI Gene endpoint. `{{tax}}` is replaced by the taxon id.
pub const DEFAULT_SYMBOL_QUERY: &str = r#"PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
PREFIX insdc: <http://ddbj.nig.ac.jp/ontologies/nucleotide/>
PREFIX taxid: <http://identifiers.org/taxonomy/>
PREFIX ncbio: <https://dbcls.github.io/ncbigene-rdf/ontology.ttl#>

SELECT DISTINCT ?gene ?symbol
WHERE {
  ?gene a insdc:Gene ;
        ncbio:taxid taxid:{{tax}} ;
        rdfs:label ?symbol .
}
"#;

const RESULTS_JSON: &str = "application/sparql-results+json";

#[derive(Debug, Clone, Deserialize)]
pub struct SparqlResults {
    pub results: SparqlBindings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SparqlBindings {
    #[serde(default)]
    pub bindings: Vec<HashMap<String, SparqlTerm>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SparqlTerm {
    pub value: String,
}

pub trait SparqlClient: Send + Sync {
    fn select(&self, endpoint: &str, query: &str) -> Result<SparqlResults, FantaError>;
}

#[derive(Clone)]
pub struct SparqlHttpClient {
    client: Client,
}

impl SparqlHttpClient {
    pub fn new() -> Result<Self, FantaError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("fantabio-rdf/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| FantaError::Filesystem(err.to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static(RESULTS_JSON));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|err| FantaError::SparqlHttp(err.to_string()))?;
        Ok(Self { client })
    }
}

impl SparqlClient for SparqlHttpClient {
    fn select(&self, endpoint: &str, query: &str) -> Result<SparqlResults, FantaError> {
        let response = self
            .client
            .get(endpoint)
            .query(&[("query", query)])
            .send()
            .map_err(|err| FantaError::SparqlHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "SPARQL query failed".to_string());
            return Err(FantaError::SparqlStatus { status, message });
        }
        response
            .json::<SparqlResults>()
            .map_err(|err| FantaError::SparqlResponse(err.to_string()))
    }
}

pub fn parse_results(body: &str) -> Result<SparqlResults, FantaError> {
    serde_json::from_str(body).map_err(|err| FantaError::SparqlResponse(err.to_string()))
}

pub fn render_query(template: &str, taxon_id: &str) -> String {
    template.replace("{{tax}}", taxon_id)
}

/// Writes `gene<TAB>symbol` rows under a `gene\tsymbol` header and returns
/// the number of rows written. Bindings without both variables are skipped.
pub fn write_symbol_table(results: &SparqlResults, destination: &Path) -> Result<usize, FantaError> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|err| FantaError::Filesystem(err.to_string()))?;
    }
    let file =
        fs::File::create(destination).map_err(|err| FantaError::Filesystem(err.to_string()))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "gene\tsymbol").map_err(|err| FantaError::Filesystem(err.to_string()))?;

    let mut rows = 0;
    for binding in &results.results.bindings {
        let (Some(gene), Some(symbol)) = (binding.get("gene"), binding.get("symbol")) else {
            warn!("SPARQL binding without gene or symbol, skipped");
            continue;
        };
        writeln!(out, "{}\t{}", gene.value, symbol.value)
            .map_err(|err| FantaError::Filesystem(err.to_string()))?;
        rows += 1;
    }
    out.flush()
        .map_err(|err| FantaError::Filesystem(err.to_string()))?;
    Ok(rows)
}
