use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One line of a Fanta.bio CRE annotation JSONL file.
///
/// Every field is optional. `null` reads as absent, list fields accept a
/// bare scalar as a one-element list, and identifier scalars may be JSON
/// strings or numbers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub cre_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub cre_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_texts")]
    pub cre_old_names: Vec<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub cre_chrom: Option<String>,
    #[serde(default)]
    pub cre_chrom_start: Option<Value>,
    #[serde(default)]
    pub cre_chrom_end: Option<Value>,

    #[serde(default, deserialize_with = "lenient_texts")]
    pub tss_ncbi_geneids: Vec<String>,
    #[serde(default, deserialize_with = "lenient_texts")]
    pub tss_hgnc_mgi_ids: Vec<String>,
    #[serde(default, deserialize_with = "lenient_texts")]
    pub tss_uniprot_ids: Vec<String>,
    #[serde(default, deserialize_with = "lenient_texts")]
    pub tss_gene_names: Vec<String>,
    #[serde(default, deserialize_with = "lenient_texts")]
    pub tss_gene_symbols: Vec<String>,
    #[serde(default, deserialize_with = "lenient_texts")]
    pub tss_gene_synonyms: Vec<String>,

    #[serde(default, deserialize_with = "lenient_list")]
    pub reftss_tss: Vec<RefTssEntry>,
    #[serde(default, deserialize_with = "lenient_texts")]
    pub tss_nearest_transcript_ids: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub tss_transcripts: Vec<TranscriptAssociation>,

    #[serde(default, deserialize_with = "lenient_list")]
    pub screen_ccres: Vec<ScreenCcre>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub fantom5_cage_peaks: Vec<CagePeak>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub fantom5_enhancers: Vec<Fantom5Enhancer>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub chip_atlas_antigens: Vec<ChipAtlasAntigen>,
}

impl CreRecord {
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// True when the gene cross-reference lists that make up a promoter are
    /// all empty.
    pub fn has_promoter(&self) -> bool {
        !(self.tss_ncbi_geneids.is_empty()
            && self.tss_hgnc_mgi_ids.is_empty()
            && self.tss_uniprot_ids.is_empty()
            && self.tss_gene_names.is_empty()
            && self.tss_gene_symbols.is_empty()
            && self.tss_gene_synonyms.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefTssEntry {
    #[serde(default, deserialize_with = "lenient_texts")]
    pub tss_id: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranscriptAssociation {
    #[serde(default, deserialize_with = "lenient_text")]
    pub transcript_id: Option<String>,
    #[serde(default)]
    pub transcript_distance: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScreenCcre {
    #[serde(default, deserialize_with = "lenient_text")]
    pub screen_ccre_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub screen_ccre_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CagePeak {
    #[serde(default, deserialize_with = "lenient_text")]
    pub cage_peak_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub cage_peak_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fantom5Enhancer {
    #[serde(default, deserialize_with = "lenient_texts")]
    pub enhancer_id: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChipAtlasAntigen {
    #[serde(default, deserialize_with = "lenient_text")]
    pub antigen: Option<String>,
    #[serde(default)]
    pub maxqscore: Option<Value>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub experiments: Vec<ChipAtlasExperiment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChipAtlasExperiment {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default)]
    pub qscore: Option<Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Text(value) => value,
            Scalar::Integer(value) => value.to_string(),
            Scalar::Unsigned(value) => value.to_string(),
            Scalar::Float(value) => value.to_string(),
            Scalar::Bool(value) => value.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Scalar>::deserialize(deserializer)?;
    Ok(value.map(Scalar::into_text))
}

fn lenient_texts<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<OneOrMany<Option<Scalar>>>::deserialize(deserializer)?;
    let items = match value {
        None => Vec::new(),
        Some(OneOrMany::One(item)) => vec![item],
        Some(OneOrMany::Many(items)) => items,
    };
    // `null` entries inside a list carry nothing to emit.
    Ok(items
        .into_iter()
        .flatten()
        .map(Scalar::into_text)
        .collect())
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let value = Option::<OneOrMany<T>>::deserialize(deserializer)?;
    Ok(match value {
        None => Vec::new(),
        Some(OneOrMany::One(item)) => vec![item],
        Some(OneOrMany::Many(items)) => items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_minimal_record() {
        let record = CreRecord::from_json_line(r#"{"cre_id":"HCRE0000001"}"#).unwrap();
        assert_eq!(record.cre_id.as_deref(), Some("HCRE0000001"));
        assert!(record.cre_name.is_none());
        assert!(record.tss_transcripts.is_empty());
        assert!(!record.has_promoter());
    }

    #[test]
    fn nulls_and_scalars_are_lenient() {
        let line = r#"{
            "cre_id": "HCRE1",
            "cre_old_names": null,
            "tss_ncbi_geneids": [7157, "7158", null],
            "tss_gene_symbols": "TP53",
            "reftss_tss": [{"tss_id": "hg_1.1"}],
            "fantom5_enhancers": {"enhancer_id": ["chr1:1-2"]}
        }"#;
        let record = CreRecord::from_json_line(line).unwrap();
        assert!(record.cre_old_names.is_empty());
        assert_eq!(record.tss_ncbi_geneids, vec!["7157", "7158"]);
        assert_eq!(record.tss_gene_symbols, vec!["TP53"]);
        assert_eq!(record.reftss_tss[0].tss_id, vec!["hg_1.1"]);
        assert_eq!(record.fantom5_enhancers[0].enhancer_id, vec!["chr1:1-2"]);
        assert!(record.has_promoter());
    }

    #[test]
    fn malformed_line_is_an_error() {
        assert!(CreRecord::from_json_line("{\"cre_id\": ").is_err());
        assert!(CreRecord::from_json_line(r#"{"tss_transcripts": 5}"#).is_err());
    }
}
