use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::Species;
use crate::error::FantaError;

pub const DEFAULT_CONFIG_PATH: &str = "fantabio.json";
pub const DEFAULT_SPARQL_ENDPOINT: &str = "https://rdfportal.org/ncbi/sparql";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub sparql_endpoint: Option<String>,
    #[serde(default)]
    pub sparql_query: Option<String>,
    #[serde(default)]
    pub input_dir: Option<String>,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub species: BTreeMap<String, SpeciesSource>,
    /// Top-level `"human": {...}` entries of the older flat layout.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SpeciesSource {
    pub jsonl: String,
    #[serde(default)]
    pub bed: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub sparql_endpoint: String,
    pub sparql_query: Option<Utf8PathBuf>,
    pub input_dir: Utf8PathBuf,
    pub output_dir: Utf8PathBuf,
    pub sources: BTreeMap<Species, SpeciesSource>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            sparql_endpoint: DEFAULT_SPARQL_ENDPOINT.to_string(),
            sparql_query: None,
            input_dir: Utf8PathBuf::from("files"),
            output_dir: Utf8PathBuf::from("output"),
            sources: BTreeMap::new(),
        }
    }
}

impl ResolvedConfig {
    pub fn source(&self, species: Species) -> Result<&SpeciesSource, FantaError> {
        self.sources
            .get(&species)
            .ok_or_else(|| FantaError::MissingSource(species.to_string()))
    }

    /// `<input_dir>/<species>_fantabio.jsonl`
    pub fn jsonl_path(&self, species: Species) -> Utf8PathBuf {
        self.input_dir.join(format!("{species}_fantabio.jsonl"))
    }

    /// `<input_dir>/<species>_fantabio.bed`
    pub fn bed_path(&self, species: Species) -> Utf8PathBuf {
        self.input_dir.join(format!("{species}_fantabio.bed"))
    }

    /// `<input_dir>/<species>_gene_symbol.tsv`
    pub fn symbol_table_path(&self, species: Species) -> Utf8PathBuf {
        self.input_dir.join(format!("{species}_gene_symbol.tsv"))
    }

    /// `<output_dir>/<species>.ttl`
    pub fn turtle_path(&self, species: Species) -> Utf8PathBuf {
        self.output_dir.join(format!("{species}.ttl"))
    }

    pub fn metadata_path(&self) -> Utf8PathBuf {
        self.output_dir.join("metadata.ttl")
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, FantaError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_PATH),
        };

        if path.is_none() && !config_path.exists() {
            return Err(FantaError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| FantaError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| FantaError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    /// Like [`ConfigLoader::resolve`], but an absent default config file
    /// resolves to the built-in defaults.
    pub fn resolve_or_default(path: Option<&str>) -> Result<ResolvedConfig, FantaError> {
        match Self::resolve(path) {
            Err(FantaError::MissingConfig) => Ok(ResolvedConfig::default()),
            other => other,
        }
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, FantaError> {
        let defaults = ResolvedConfig::default();
        let mut sources = BTreeMap::new();

        for (key, value) in config.extra {
            // Only species-shaped objects are read from the top level; other
            // keys are ignored like in the flat layout.
            let Ok(species) = key.parse::<Species>() else {
                continue;
            };
            if !value.is_object() {
                continue;
            }
            let source: SpeciesSource = serde_json::from_value(value)
                .map_err(|err| FantaError::ConfigParse(format!("{key}: {err}")))?;
            sources.insert(species, source);
        }
        for (key, source) in config.species {
            sources.insert(key.parse::<Species>()?, source);
        }

        Ok(ResolvedConfig {
            sparql_endpoint: config
                .sparql_endpoint
                .unwrap_or(defaults.sparql_endpoint),
            sparql_query: config.sparql_query.map(Utf8PathBuf::from),
            input_dir: config
                .input_dir
                .map(Utf8PathBuf::from)
                .unwrap_or(defaults.input_dir),
            output_dir: config
                .output_dir
                .map(Utf8PathBuf::from)
                .unwrap_or(defaults.output_dir),
            sources,
        })
    }
}
