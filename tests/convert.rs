use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;
use chrono::{FixedOffset, TimeZone};
use flate2::Compression;
use flate2::write::GzEncoder;

use fantabio_rdf::app::{App, ConvertOptions, ProgressEvent, ProgressSink};
use fantabio_rdf::config::{Config, ConfigLoader, ResolvedConfig};
use fantabio_rdf::convert::{self, write_turtle};
use fantabio_rdf::domain::Species;
use fantabio_rdf::download::{ArchiveClient, write_gunzipped};
use fantabio_rdf::error::FantaError;
use fantabio_rdf::sparql::{SparqlClient, SparqlResults, parse_results};
use fantabio_rdf::symbols::SymbolGeneMap;
use fantabio_rdf::turtle::prefixes;

const FIXTURE: &str = "tests/fixtures/human_sample.jsonl";

struct MockArchives {
    files: HashMap<String, Vec<u8>>,
}

impl ArchiveClient for MockArchives {
    fn download_gz(&self, url: &str, destination: &Path) -> Result<(), FantaError> {
        let body = self
            .files
            .get(url)
            .ok_or_else(|| FantaError::DownloadStatus {
                status: 404,
                message: url.to_string(),
            })?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(body).unwrap();
        let compressed = encoder.finish().unwrap();
        write_gunzipped(compressed.as_slice(), destination)
    }
}

#[derive(Default)]
struct MockSparql {
    queries: Mutex<Vec<(String, String)>>,
}

impl SparqlClient for MockSparql {
    fn select(&self, endpoint: &str, query: &str) -> Result<SparqlResults, FantaError> {
        self.queries
            .lock()
            .unwrap()
            .push((endpoint.to_string(), query.to_string()));
        parse_results(
            r#"{"head":{"vars":["gene","symbol"]},"results":{"bindings":[
                {"gene":{"type":"uri","value":"http://identifiers.org/ncbigene/7157"},"symbol":{"type":"literal","value":"TP53"}},
                {"gene":{"type":"uri","value":"http://identifiers.org/ncbigene/1"}}
            ]}}"#,
        )
    }
}

impl SparqlClient for &MockSparql {
    fn select(&self, endpoint: &str, query: &str) -> Result<SparqlResults, FantaError> {
        MockSparql::select(self, endpoint, query)
    }
}

#[derive(Default)]
struct RecordingSink {
    messages: Mutex<Vec<String>>,
}

impl ProgressSink for RecordingSink {
    fn event(&self, event: ProgressEvent) {
        self.messages.lock().unwrap().push(event.message);
    }
}

fn config_in(root: &Path) -> ResolvedConfig {
    let raw = serde_json::json!({
        "sparql_endpoint": "https://sparql.example.org/ncbi",
        "input_dir": root.join("files").to_str().unwrap(),
        "output_dir": root.join("output").to_str().unwrap(),
        "species": {
            "human": {
                "jsonl": "https://example.org/v1/human_cre.jsonl.gz",
                "bed": "https://example.org/v1/human_cre.bed.gz"
            }
        }
    });
    let config: Config = serde_json::from_value(raw).unwrap();
    ConfigLoader::resolve_config(config).unwrap()
}

fn archives() -> MockArchives {
    let mut files = HashMap::new();
    files.insert(
        "https://example.org/v1/human_cre.jsonl.gz".to_string(),
        fs::read(FIXTURE).unwrap(),
    );
    files.insert(
        "https://example.org/v1/human_cre.bed.gz".to_string(),
        b"chr1\t1000\t2000\tHCRE0000001\n".to_vec(),
    );
    MockArchives { files }
}

#[test]
fn write_turtle_counts_written_and_skipped_lines() {
    let symbols = SymbolGeneMap::new();
    let input = fs::read(FIXTURE).unwrap();
    let mut out = Vec::new();
    let stats = write_turtle(Species::Human, &symbols, input.as_slice(), &mut out).unwrap();
    assert_eq!(stats.records_written, 3);
    assert_eq!(stats.lines_skipped, 2);

    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with(&prefixes()));
    let first = text.find("fanta:HCRE0000001 ").unwrap();
    let second = text.find("fanta:HCRE0000002 ").unwrap();
    let third = text.find("fanta:HCRE0000003 ").unwrap();
    assert!(first < second && second < third);
    assert!(!text.contains("record without identifier"));
}

#[test]
fn empty_input_yields_prefixes_only() {
    let symbols = SymbolGeneMap::new();
    let mut out = Vec::new();
    let stats = write_turtle(Species::Mouse, &symbols, &b""[..], &mut out).unwrap();
    assert_eq!(stats.records_written, 0);
    assert_eq!(String::from_utf8(out).unwrap(), prefixes());
}

#[test]
fn missing_input_is_fatal() {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    let output = root.join("output/human.ttl");
    let err = convert::convert_species(
        Species::Human,
        &root.join("files/human_fantabio.jsonl"),
        &root.join("files/human_gene_symbol.tsv"),
        &output,
    )
    .unwrap_err();
    assert_matches!(err, FantaError::InputMissing(_));
    assert!(!output.exists());
}

#[test]
fn convert_without_symbol_table() {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    let input = root.join("human_fantabio.jsonl");
    fs::copy(FIXTURE, &input).unwrap();
    let output = root.join("out/human.ttl");

    let summary = convert::convert_species(
        Species::Human,
        &input,
        &root.join("missing.tsv"),
        &output,
    )
    .unwrap();
    assert_eq!(summary.symbols_loaded, 0);
    assert_eq!(summary.records_written, 3);
    let text = fs::read_to_string(&output).unwrap();
    assert!(!text.contains("ncbigene:7157 ;\n    rdfs:label \"TP53\""));
}

#[test]
fn metadata_document_fields() {
    let created = FixedOffset::east_opt(9 * 3600)
        .unwrap()
        .with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
        .unwrap();
    let doc = convert::metadata_document("v1.2.0", &created);
    assert!(doc.contains("pav:version     \"v1.2.0\" ;"));
    assert!(doc.contains("dct:created     \"2024-03-01+09:00\"^^xsd:date ;"));
    assert!(doc.contains("<http://rdf.fanta.bio/>  rdf:type        sio:SIO_000750 ;"));
}

#[test]
fn blank_release_is_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("metadata.ttl")).unwrap();
    let err = convert::write_metadata(&path, "  ", &chrono::Utc::now()).unwrap_err();
    assert_matches!(err, FantaError::InvalidRelease(_));
    assert!(!path.exists());
}

#[test]
fn full_pipeline_with_mock_clients() {
    let temp = tempfile::tempdir().unwrap();
    let config = config_in(temp.path());
    let sparql = MockSparql::default();
    let app = App::new(config, archives(), sparql);
    let sink = RecordingSink::default();
    let options = ConvertOptions {
        release: Some("v1.2.0".to_string()),
    };

    let result = app.run_all(&[Species::Human], &options, &sink).unwrap();

    assert_eq!(result.download.items.len(), 2);
    let files = temp.path().join("files");
    assert!(files.join("human_cre.jsonl").is_file());
    assert_eq!(
        fs::read_to_string(files.join("human_fantabio.jsonl")).unwrap(),
        fs::read_to_string(FIXTURE).unwrap()
    );
    assert!(files.join("human_fantabio.bed").exists());

    assert_eq!(result.symbols.items.len(), 1);
    assert_eq!(result.symbols.items[0].rows, 1);
    assert_eq!(
        fs::read_to_string(files.join("human_gene_symbol.tsv")).unwrap(),
        "gene\tsymbol\nhttp://identifiers.org/ncbigene/7157\tTP53\n"
    );

    let summary = &result.convert.items[0];
    assert_eq!(summary.symbols_loaded, 1);
    assert_eq!(summary.records_written, 3);
    assert_eq!(summary.lines_skipped, 2);

    let ttl = fs::read_to_string(temp.path().join("output/human.ttl")).unwrap();
    assert!(ttl.contains("    rdfs:seeAlso ncbigene:7157 ;\n    rdfs:label \"TP53\" ;\n"));

    let metadata = fs::read_to_string(temp.path().join("output/metadata.ttl")).unwrap();
    assert!(metadata.contains("pav:version     \"v1.2.0\""));
    assert_eq!(
        result.convert.metadata_path.as_deref(),
        temp.path().join("output/metadata.ttl").to_str()
    );

    let messages = sink.messages.lock().unwrap();
    assert_eq!(messages[0], "== Step 1/3: download ==");
    assert!(messages.iter().any(|m| m == "== Step 3/3: convert =="));
}

#[test]
fn symbols_query_targets_taxon() {
    let temp = tempfile::tempdir().unwrap();
    let sparql = MockSparql::default();
    let app = App::new(config_in(temp.path()), archives(), &sparql);
    let sink = RecordingSink::default();
    let result = app
        .fetch_symbols(&[Species::Human, Species::Mouse], &sink)
        .unwrap();
    assert_eq!(result.items.len(), 2);

    let queries = sparql.queries.lock().unwrap();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0].0, "https://sparql.example.org/ncbi");
    assert!(queries[0].1.contains("taxid:9606 ;"));
    assert!(queries[1].1.contains("taxid:10090 ;"));
    assert!(temp.path().join("files/mouse_gene_symbol.tsv").is_file());
}

#[test]
fn missing_species_source_is_reported() {
    let temp = tempfile::tempdir().unwrap();
    let app = App::new(config_in(temp.path()), archives(), MockSparql::default());
    let sink = RecordingSink::default();
    let err = app.download(&[Species::Mouse], &sink).unwrap_err();
    assert_matches!(err, FantaError::MissingSource(ref name) if name == "mouse");
}

#[test]
fn convert_without_release_skips_metadata() {
    let temp = tempfile::tempdir().unwrap();
    let config = config_in(temp.path());
    fs::create_dir_all(temp.path().join("files")).unwrap();
    fs::copy(FIXTURE, temp.path().join("files/human_fantabio.jsonl")).unwrap();
    let app = App::new(config, archives(), MockSparql::default());
    let sink = RecordingSink::default();

    let result = app
        .convert(&[Species::Human], &ConvertOptions::default(), &sink)
        .unwrap();
    assert!(result.metadata_path.is_none());
    assert_eq!(result.items[0].records_written, 3);
    assert!(!temp.path().join("output/metadata.ttl").exists());
}
