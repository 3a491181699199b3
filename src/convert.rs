use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};

use camino::Utf8Path;
use chrono::{DateTime, TimeZone};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::Species;
use crate::error::FantaError;
use crate::format::escape_literal;
use crate::mapper::CreMapper;
use crate::record::CreRecord;
use crate::symbols::SymbolGeneMap;
use crate::turtle::prefixes;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConvertStats {
    pub records_written: usize,
    pub lines_skipped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvertSummary {
    pub species: Species,
    pub output_path: String,
    pub symbols_loaded: usize,
    pub records_written: usize,
    pub lines_skipped: usize,
}

/// Converts one species' JSONL file into a Turtle file.
///
/// The output is assembled in a temp file next to `output` and only moved
/// into place once every line has been processed.
pub fn convert_species(
    species: Species,
    input: &Utf8Path,
    symbol_table: &Utf8Path,
    output: &Utf8Path,
) -> Result<ConvertSummary, FantaError> {
    if !input.as_std_path().is_file() {
        return Err(FantaError::InputMissing(input.as_std_path().to_path_buf()));
    }
    let symbols = SymbolGeneMap::load(symbol_table.as_std_path())?;

    let parent = output
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or(Utf8Path::new("."));
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| FantaError::Filesystem(err.to_string()))?;
    let temp = tempfile::Builder::new()
        .prefix("fantabio-ttl")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| FantaError::Filesystem(err.to_string()))?;

    let reader = File::open(input.as_std_path())
        .map(BufReader::new)
        .map_err(|err| FantaError::Filesystem(format!("open {input}: {err}")))?;
    let mut writer = BufWriter::new(temp);
    let stats = write_turtle(species, &symbols, reader, &mut writer)?;
    let temp = writer
        .into_inner()
        .map_err(|err| FantaError::Filesystem(err.to_string()))?;
    temp.persist(output.as_std_path())
        .map_err(|err| FantaError::Filesystem(err.to_string()))?;

    info!(
        %species,
        output = %output,
        records = stats.records_written,
        skipped = stats.lines_skipped,
        "wrote turtle"
    );
    Ok(ConvertSummary {
        species,
        output_path: output.to_string(),
        symbols_loaded: symbols.len(),
        records_written: stats.records_written,
        lines_skipped: stats.lines_skipped,
    })
}

/// Writes the prefix preamble followed by one block per mappable line of
/// `reader`, in input order. Undecodable lines and records with a missing
/// or blank `cre_id` are skipped; blank lines are ignored.
pub fn write_turtle<R: BufRead, W: Write>(
    species: Species,
    symbols: &SymbolGeneMap,
    mut reader: R,
    writer: &mut W,
) -> Result<ConvertStats, FantaError> {
    let mapper = CreMapper::new(species, symbols);
    let mut stats = ConvertStats::default();

    writer
        .write_all(prefixes().as_bytes())
        .map_err(|err| FantaError::Filesystem(err.to_string()))?;

    let mut buf = Vec::new();
    let mut line_no = 0usize;
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|err| FantaError::Filesystem(err.to_string()))?;
        if read == 0 {
            break;
        }
        line_no += 1;
        // Invalid UTF-8 counts as an undecodable line.
        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(err) => {
                warn!(%species, line = line_no, error = %err, "skipping undecodable line");
                stats.lines_skipped += 1;
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let record = match CreRecord::from_json_line(line) {
            Ok(record) => record,
            Err(err) => {
                warn!(%species, line = line_no, error = %err, "skipping undecodable line");
                stats.lines_skipped += 1;
                continue;
            }
        };
        let Some(block) = mapper.map(&record) else {
            debug!(%species, line = line_no, "skipping record without cre_id");
            stats.lines_skipped += 1;
            continue;
        };
        writer
            .write_all(block.as_bytes())
            .map_err(|err| FantaError::Filesystem(err.to_string()))?;
        stats.records_written += 1;
    }

    writer
        .flush()
        .map_err(|err| FantaError::Filesystem(err.to_string()))?;
    Ok(stats)
}

/// Dataset description written next to the species files.
pub fn metadata_document<Tz: TimeZone>(version: &str, created: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let date = created.format("%Y-%m-%d%:z");
    format!(
        r#"@prefix dct: <http://purl.org/dc/terms/> .
@prefix sio: <http://semanticscience.org/resource/> .
@prefix pav: <http://purl.org/pav/> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
<http://rdf.fanta.bio/>  rdf:type        sio:SIO_000750 ;
                         rdfs:label      "Fanta.bio" ;
                         dct:title       "Fanta.bio RDF" ;
                         pav:version     "{version}" ;
                         dct:created     "{date}"^^xsd:date ;
                         dct:description "Fanta.bio RDF converted from CRE peaks annotation JSONL." .
"#,
        version = escape_literal(version),
    )
}

pub fn write_metadata<Tz: TimeZone>(
    path: &Utf8Path,
    version: &str,
    created: &DateTime<Tz>,
) -> Result<(), FantaError>
where
    Tz::Offset: std::fmt::Display,
{
    let version = version.trim();
    if version.is_empty() {
        return Err(FantaError::InvalidRelease(version.to_string()));
    }
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or(Utf8Path::new("."));
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| FantaError::Filesystem(err.to_string()))?;
    let mut temp = tempfile::Builder::new()
        .prefix("fantabio-metadata")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| FantaError::Filesystem(err.to_string()))?;
    temp.write_all(metadata_document(version, created).as_bytes())
        .map_err(|err| FantaError::Filesystem(err.to_string()))?;
    temp.persist(path.as_std_path())
        .map_err(|err| FantaError::Filesystem(err.to_string()))?;
    info!(path = %path, version, "wrote metadata");
    Ok(())
}
