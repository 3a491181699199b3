use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum FantaError {
    #[error("unknown species: {0}")]
    InvalidSpecies(String),

    #[error("missing config file fantabio.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("species {0} has no download source configured")]
    MissingSource(String),

    #[error("input file not found: {0}")]
    InputMissing(PathBuf),

    #[error("download failed: {0}")]
    DownloadHttp(String),

    #[error("download returned status {status}: {message}")]
    DownloadStatus { status: u16, message: String },

    #[error("failed to decompress archive: {0}")]
    Decompress(String),

    #[error("SPARQL request failed: {0}")]
    SparqlHttp(String),

    #[error("SPARQL query failed with status {status}: {message}")]
    SparqlStatus { status: u16, message: String },

    #[error("unexpected SPARQL response: {0}")]
    SparqlResponse(String),

    #[error("invalid release version: {0}")]
    InvalidRelease(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
