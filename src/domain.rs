use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::FantaError;

static ENSEMBL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i-u)^ENS[TG]\w+\.\d+$").unwrap());
static REFSEQ_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i-u)^(NM|NR|XM|XR)_\d+(\.\d+)?$").unwrap());
static HGNC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i-u)^HGNC:(\d+)$").unwrap());
static MGI_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i-u)^MGI:(\d+)$").unwrap());

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    Human,
    Mouse,
}

impl Species {
    pub const ALL: [Species; 2] = [Species::Human, Species::Mouse];

    pub fn as_str(&self) -> &'static str {
        match self {
            Species::Human => "human",
            Species::Mouse => "mouse",
        }
    }

    /// NCBI taxonomy id.
    pub fn taxon_id(&self) -> &'static str {
        match self {
            Species::Human => "9606",
            Species::Mouse => "10090",
        }
    }

    /// Genome assembly the Fanta.bio coordinates are reported on.
    pub fn assembly(&self) -> &'static str {
        match self {
            Species::Human => "GRCh38",
            // mm10
            Species::Mouse => "GRCm38",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Species {
    type Err = FantaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "human" => Ok(Species::Human),
            "mouse" => Ok(Species::Mouse),
            _ => Err(FantaError::InvalidSpecies(value.to_string())),
        }
    }
}

/// Namespace a transcript identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Ensembl,
    RefSeq,
    Insdc,
}

impl IdKind {
    /// Classifies a raw transcript id. Anything that is neither Ensembl nor
    /// RefSeq is treated as an INSDC accession.
    pub fn classify(id: &str) -> Self {
        if ENSEMBL_RE.is_match(id) {
            IdKind::Ensembl
        } else if REFSEQ_RE.is_match(id) {
            IdKind::RefSeq
        } else {
            IdKind::Insdc
        }
    }
}

/// HGNC or MGI gene id with its numeric suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneDbRef {
    Hgnc(String),
    Mgi(String),
}

impl GeneDbRef {
    /// Returns `None` for anything other than an exact `HGNC:<digits>` or
    /// `MGI:<digits>` id. Surrounding whitespace is not tolerated.
    pub fn classify(id: &str) -> Option<Self> {
        if let Some(caps) = HGNC_RE.captures(id) {
            return Some(GeneDbRef::Hgnc(caps[1].to_string()));
        }
        MGI_RE
            .captures(id)
            .map(|caps| GeneDbRef::Mgi(caps[1].to_string()))
    }
}
