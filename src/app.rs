use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::ResolvedConfig;
use crate::convert::{self, ConvertSummary};
use crate::domain::Species;
use crate::download::{ArchiveClient, archive_file_name};
use crate::error::FantaError;
use crate::sparql::{self, DEFAULT_SYMBOL_QUERY, SparqlClient};

#[derive(Debug, Clone, Serialize)]
pub struct DownloadResult {
    pub items: Vec<DownloadItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadItem {
    pub species: Species,
    pub kind: String,
    pub url: String,
    pub path: String,
    pub canonical_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SymbolsResult {
    pub items: Vec<SymbolsItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SymbolsItem {
    pub species: Species,
    pub path: String,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvertResult {
    pub items: Vec<ConvertSummary>,
    pub metadata_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunAllResult {
    pub download: DownloadResult,
    pub symbols: SymbolsResult,
    pub convert: ConvertResult,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Version recorded in `metadata.ttl`; no metadata is written when unset.
    pub release: Option<String>,
}

#[derive(Clone)]
pub struct App<A: ArchiveClient, Q: SparqlClient> {
    config: ResolvedConfig,
    archives: A,
    sparql: Q,
}

impl<A: ArchiveClient, Q: SparqlClient> App<A, Q> {
    pub fn new(config: ResolvedConfig, archives: A, sparql: Q) -> Self {
        Self {
            config,
            archives,
            sparql,
        }
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Downloads and decompresses every configured archive of `species`.
    pub fn download(
        &self,
        species: &[Species],
        sink: &dyn ProgressSink,
    ) -> Result<DownloadResult, FantaError> {
        let mut items = Vec::new();
        for &sp in species {
            let source = self.config.source(sp)?.clone();
            let mut targets = vec![("jsonl", source.jsonl.clone(), self.config.jsonl_path(sp))];
            if let Some(bed) = source.bed.clone() {
                targets.push(("bed", bed, self.config.bed_path(sp)));
            }
            for (kind, url, canonical) in targets {
                let file_name = archive_file_name(&url)
                    .ok_or_else(|| FantaError::DownloadHttp(format!("no file name in {url}")))?;
                let path = self.config.input_dir.join(file_name);

                sink.event(ProgressEvent {
                    message: format!("phase=Download; [{sp}] {url}"),
                    elapsed: None,
                });
                let start = Instant::now();
                self.archives.download_gz(&url, path.as_std_path())?;
                if path != canonical {
                    link_canonical(file_name, canonical.as_std_path())?;
                }
                sink.event(ProgressEvent {
                    message: format!("phase=Store; saved {path}"),
                    elapsed: Some(start.elapsed()),
                });

                items.push(DownloadItem {
                    species: sp,
                    kind: kind.to_string(),
                    url,
                    path: path.to_string(),
                    canonical_path: canonical.to_string(),
                });
            }
        }
        Ok(DownloadResult { items })
    }

    /// Queries the SPARQL endpoint for gene symbols and writes one TSV per
    /// species.
    pub fn fetch_symbols(
        &self,
        species: &[Species],
        sink: &dyn ProgressSink,
    ) -> Result<SymbolsResult, FantaError> {
        let template = self.query_template()?;
        let mut items = Vec::new();
        for &sp in species {
            sink.event(ProgressEvent {
                message: format!("phase=Query; [{sp}] {}", self.config.sparql_endpoint),
                elapsed: None,
            });
            let start = Instant::now();
            let query = sparql::render_query(&template, sp.taxon_id());
            let results = self.sparql.select(&self.config.sparql_endpoint, &query)?;
            let path = self.config.symbol_table_path(sp);
            let rows = sparql::write_symbol_table(&results, path.as_std_path())?;
            sink.event(ProgressEvent {
                message: format!("phase=Store; saved {path} ({rows} rows)"),
                elapsed: Some(start.elapsed()),
            });
            items.push(SymbolsItem {
                species: sp,
                path: path.to_string(),
                rows,
            });
        }
        Ok(SymbolsResult { items })
    }

    /// Converts each species' JSONL into Turtle, then writes the metadata
    /// document when a release is given.
    pub fn convert(
        &self,
        species: &[Species],
        options: &ConvertOptions,
        sink: &dyn ProgressSink,
    ) -> Result<ConvertResult, FantaError> {
        let mut items = Vec::new();
        for &sp in species {
            sink.event(ProgressEvent {
                message: format!("phase=Convert; [{sp}] {}", self.config.jsonl_path(sp)),
                elapsed: None,
            });
            let start = Instant::now();
            let summary = convert::convert_species(
                sp,
                &self.config.jsonl_path(sp),
                &self.config.symbol_table_path(sp),
                &self.config.turtle_path(sp),
            )?;
            sink.event(ProgressEvent {
                message: format!(
                    "phase=Store; wrote {} ({} records)",
                    summary.output_path, summary.records_written
                ),
                elapsed: Some(start.elapsed()),
            });
            items.push(summary);
        }

        let metadata_path = match &options.release {
            Some(release) => {
                let path = self.config.metadata_path();
                convert::write_metadata(&path, release, &chrono::Local::now())?;
                sink.event(ProgressEvent {
                    message: format!("phase=Store; wrote {path}"),
                    elapsed: None,
                });
                Some(path.to_string())
            }
            None => None,
        };

        Ok(ConvertResult {
            items,
            metadata_path,
        })
    }

    pub fn run_all(
        &self,
        species: &[Species],
        options: &ConvertOptions,
        sink: &dyn ProgressSink,
    ) -> Result<RunAllResult, FantaError> {
        sink.event(ProgressEvent {
            message: "== Step 1/3: download ==".to_string(),
            elapsed: None,
        });
        let download = self.download(species, sink)?;
        sink.event(ProgressEvent {
            message: "== Step 2/3: symbols ==".to_string(),
            elapsed: None,
        });
        let symbols = self.fetch_symbols(species, sink)?;
        sink.event(ProgressEvent {
            message: "== Step 3/3: convert ==".to_string(),
            elapsed: None,
        });
        let convert = self.convert(species, options, sink)?;
        Ok(RunAllResult {
            download,
            symbols,
            convert,
        })
    }

    fn query_template(&self) -> Result<String, FantaError> {
        match &self.config.sparql_query {
            Some(path) => fs::read_to_string(path.as_std_path())
                .map_err(|err| FantaError::Filesystem(format!("read {path}: {err}"))),
            None => Ok(DEFAULT_SYMBOL_QUERY.to_string()),
        }
    }
}

/// Points `<species>_fantabio.<ext>` at the downloaded file, which lives in
/// the same directory.
fn link_canonical(file_name: &str, link: &Path) -> Result<(), FantaError> {
    if link.symlink_metadata().is_ok() {
        fs::remove_file(link).map_err(|err| FantaError::Filesystem(err.to_string()))?;
    }
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(file_name, link)
            .map_err(|err| FantaError::Filesystem(err.to_string()))?;
    }
    #[cfg(not(unix))]
    {
        let source = link
            .parent()
            .map(|dir| dir.join(file_name))
            .ok_or_else(|| FantaError::Filesystem("invalid link path".to_string()))?;
        fs::copy(&source, link).map_err(|err| FantaError::Filesystem(err.to_string()))?;
    }
    Ok(())
}

/// Species selected on the command line, or all of them.
pub fn selected_species(filter: &[Species]) -> Vec<Species> {
    let mut species: Vec<Species> = if filter.is_empty() {
        Species::ALL.to_vec()
    } else {
        filter.to_vec()
    };
    species.sort();
    species.dedup();
    species
}
