use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::error::FantaError;

/// Gene symbol -> NCBI Gene id, built once per species from the
/// `<species>_gene_symbol.tsv` file.
#[derive(Debug, Clone, Default)]
pub struct SymbolGeneMap {
    entries: HashMap<String, String>,
}

impl SymbolGeneMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the TSV at `path`. A missing file yields an empty map.
    pub fn load(path: &Path) -> Result<Self, FantaError> {
        if !path.is_file() {
            debug!(path = %path.display(), "gene symbol table not found, using empty map");
            return Ok(Self::new());
        }
        let file = File::open(path)
            .map_err(|err| FantaError::Filesystem(format!("open {}: {err}", path.display())))?;
        let map = Self::from_reader(BufReader::new(file))?;
        debug!(path = %path.display(), symbols = map.len(), "loaded gene symbol table");
        Ok(map)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, FantaError> {
        let mut map = Self::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|err| FantaError::Filesystem(err.to_string()))?;
            if index == 0 && is_header(&line) {
                continue;
            }
            let Some((gene, symbol)) = line.split_once('\t') else {
                continue;
            };
            let (gene, symbol) = (gene.trim(), symbol.trim());
            if gene.is_empty() || symbol.is_empty() {
                continue;
            }
            let Some(gene_id) = last_path_segment(gene) else {
                continue;
            };
            map.insert(symbol, gene_id);
        }
        Ok(map)
    }

    /// Later inserts for the same symbol replace earlier ones.
    pub fn insert(&mut self, symbol: impl Into<String>, gene_id: impl Into<String>) {
        self.entries.insert(symbol.into(), gene_id.into());
    }

    pub fn get(&self, symbol: &str) -> Option<&str> {
        self.entries.get(symbol).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_header(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("gene") && lower.contains("symbol")
}

// Full identifiers.org / NCBI URIs keep only their final segment.
fn last_path_segment(gene: &str) -> Option<&str> {
    gene.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn header_is_skipped_and_uri_trimmed() {
        let tsv = "gene\tsymbol\nhttp://example.org/9606\tTP53\n";
        let map = SymbolGeneMap::from_reader(Cursor::new(tsv)).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("TP53"), Some("9606"));
    }

    #[test]
    fn first_line_without_header_words_is_data() {
        let tsv = "7157\tTP53\n672\tBRCA1\n";
        let map = SymbolGeneMap::from_reader(Cursor::new(tsv)).unwrap();
        assert_eq!(map.get("TP53"), Some("7157"));
        assert_eq!(map.get("BRCA1"), Some("672"));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let tsv = "Gene\tSymbol\nno-tab-here\n\tEMPTYGENE\n123\t  \n  42 \t MYC \n";
        let map = SymbolGeneMap::from_reader(Cursor::new(tsv)).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("MYC"), Some("42"));
    }

    #[test]
    fn later_duplicates_win() {
        let tsv = "1\tDUP\n2\tDUP\n";
        let map = SymbolGeneMap::from_reader(Cursor::new(tsv)).unwrap();
        assert_eq!(map.get("DUP"), Some("2"));
    }

    #[test]
    fn symbols_are_case_sensitive() {
        let tsv = "1\tTp53\n";
        let map = SymbolGeneMap::from_reader(Cursor::new(tsv)).unwrap();
        assert_eq!(map.get("TP53"), None);
        assert_eq!(map.get("Tp53"), Some("1"));
    }

    #[test]
    fn missing_file_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        let map = SymbolGeneMap::load(&temp.path().join("absent.tsv")).unwrap();
        assert!(map.is_empty());
    }
}
