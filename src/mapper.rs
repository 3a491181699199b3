use std::collections::HashSet;

use crate::domain::{GeneDbRef, IdKind, Species};
use crate::format::{coerce_integer, normalize_chromosome};
use crate::record::{ChipAtlasAntigen, CreRecord, TranscriptAssociation};
use crate::symbols::SymbolGeneMap;
use crate::turtle::{
    ENSEMBL, FALDO, FANTA, FANTAO, HCO, HGNC, INSDC, MGI, NCBIGENE, OBO, REFSEQ, REFTSS,
    Resource, SCREEN, SRA, Statement, TAX, UNIPROT,
};

const IDENTIFIER: &str = "dct:identifier";
const ALTERNATIVE: &str = "dct:alternative";
const LABEL: &str = "rdfs:label";
const SEE_ALSO: &str = "rdfs:seeAlso";
const ALT_LABEL: &str = "skos:altLabel";
const IN_TAXON: &str = "obo:RO_0002162";
const HAS_ATTRIBUTE: &str = "sio:SIO_000216";
const HAS_VALUE: &str = "sio:SIO_000300";
const HAS_UNIT: &str = "sio:SIO_000221";
const PAGE: &str = "foaf:page";

/// Maps Fanta.bio records of one species onto Turtle statements.
pub struct CreMapper<'a> {
    species: Species,
    symbols: &'a SymbolGeneMap,
}

impl<'a> CreMapper<'a> {
    pub fn new(species: Species, symbols: &'a SymbolGeneMap) -> Self {
        Self { species, symbols }
    }

    /// Renders the record as one Turtle block, or `None` when its `cre_id`
    /// is missing or blank.
    pub fn map(&self, record: &CreRecord) -> Option<String> {
        self.statement(record).map(|statement| statement.render())
    }

    pub fn statement(&self, record: &CreRecord) -> Option<Statement> {
        let cre_id = record
            .cre_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())?;

        let mut body = Resource::block()
            .typed(FANTAO.term("CisRegulatoryElement"))
            .literal(IDENTIFIER, cre_id);
        if let Some(name) = &record.cre_name {
            body = body.literal(LABEL, name);
        }
        for alt in &record.cre_old_names {
            body = body.literal(ALT_LABEL, alt);
        }
        body = body.term(IN_TAXON, TAX.term(self.species.taxon_id()));

        if let Some(location) = self.location(record) {
            body = body.resource("faldo:location", location);
        }
        if let Some(promoter) = promoter(record) {
            body = body.resource("fantao:hasPromoter", promoter);
        }
        for tss_id in record.reftss_tss.iter().flat_map(|entry| &entry.tss_id) {
            body = body.resource(
                "fantao:hasRefTss",
                xref("ReferenceTss", REFTSS.term(tss_id), tss_id),
            );
        }

        let nearest: HashSet<&str> = record
            .tss_nearest_transcript_ids
            .iter()
            .map(String::as_str)
            .collect();
        for transcript in &record.tss_transcripts {
            if let Some(resource) = transcript_resource(transcript, &nearest) {
                body = body.resource("fantao:hasTssTranscript", resource);
            }
        }

        for ccre in &record.screen_ccres {
            let Some(id) = &ccre.screen_ccre_id else {
                continue;
            };
            let mut resource = Resource::block()
                .typed(FANTAO.term("ScreenCcre"))
                .literal(IDENTIFIER, id);
            if let Some(kind) = &ccre.screen_ccre_type {
                resource = resource.literal(LABEL, kind);
            }
            resource = resource.term(PAGE, SCREEN.term(id));
            body = body.resource("fantao:hasOverlappedScreenCcre", resource);
        }

        for peak in &record.fantom5_cage_peaks {
            let Some(id) = &peak.cage_peak_id else {
                continue;
            };
            let mut resource = Resource::block()
                .typed(FANTAO.term("Fantom5CagePeak"))
                .literal(IDENTIFIER, id);
            if let Some(name) = &peak.cage_peak_name {
                resource = resource.literal(LABEL, name);
            }
            body = body.resource("fantao:hasOverlappedFantom5CagePeak", resource);
        }

        for id in record
            .fantom5_enhancers
            .iter()
            .flat_map(|enhancer| &enhancer.enhancer_id)
        {
            let resource = Resource::inline()
                .typed(FANTAO.term("Fantom5Enhancer"))
                .literal(IDENTIFIER, id);
            body = body.resource("fantao:hasOverlappedFantom5Enhancer", resource);
        }

        for antigen in &record.chip_atlas_antigens {
            body = body.resource("fantao:hasOverlappedAntigen", self.antigen(antigen));
        }

        Some(Statement::new(FANTA.term(cre_id), body))
    }

    // All three coordinates or nothing.
    fn location(&self, record: &CreRecord) -> Option<Resource> {
        let chrom = record.cre_chrom.as_deref()?;
        let start = record.cre_chrom_start.as_ref().and_then(coerce_integer)?;
        let end = record.cre_chrom_end.as_ref().and_then(coerce_integer)?;
        let reference = HCO.term(&format!(
            "{}#{}",
            normalize_chromosome(chrom),
            self.species.assembly()
        ));
        let position = |value: i64| {
            Resource::inline()
                .typed(FALDO.term("ExactPosition"))
                .integer("faldo:position", value)
                .term("faldo:reference", reference.clone())
        };
        Some(
            Resource::block()
                .typed(FALDO.term("Region"))
                .resource("faldo:begin", position(start))
                .resource("faldo:end", position(end)),
        )
    }

    fn antigen(&self, antigen: &ChipAtlasAntigen) -> Resource {
        let mut resource = Resource::block().typed(FANTAO.term("ChipAtlasAntigen"));
        if let Some(symbol) = &antigen.antigen {
            if let Some(gene_id) = self.symbols.get(symbol) {
                resource = resource.term(SEE_ALSO, NCBIGENE.term(gene_id));
            }
            resource = resource.literal(LABEL, symbol);
        }
        if let Some(max) = antigen.maxqscore.as_ref().and_then(coerce_integer) {
            resource = resource.resource(HAS_ATTRIBUTE, score("MaxQscore", max));
        }
        for experiment in &antigen.experiments {
            let Some(id) = &experiment.id else {
                continue;
            };
            let mut nested = Resource::block()
                .typed(FANTAO.term("Experiment"))
                .term(SEE_ALSO, SRA.term(id))
                .literal(IDENTIFIER, id);
            if let Some(qscore) = experiment.qscore.as_ref().and_then(coerce_integer) {
                nested = nested.resource(HAS_ATTRIBUTE, score("Qscore", qscore));
            }
            resource = resource.resource("fantao:experiment", nested);
        }
        resource
    }
}

fn promoter(record: &CreRecord) -> Option<Resource> {
    if !record.has_promoter() {
        return None;
    }
    let mut promoter = Resource::block().typed(FANTAO.term("Promoter"));
    for gene_id in &record.tss_ncbi_geneids {
        promoter =
            promoter.resource(SEE_ALSO, xref("NcbiGene", NCBIGENE.term(gene_id), gene_id));
    }
    for raw in &record.tss_hgnc_mgi_ids {
        let reference = match GeneDbRef::classify(raw) {
            Some(GeneDbRef::Hgnc(number)) => xref("Hgnc", HGNC.term(&number), &number),
            Some(GeneDbRef::Mgi(number)) => xref("Mgi", MGI.term(&number), &number),
            None => continue,
        };
        promoter = promoter.resource(SEE_ALSO, reference);
    }
    for uniprot in &record.tss_uniprot_ids {
        promoter =
            promoter.resource(SEE_ALSO, xref("UniProt", UNIPROT.term(uniprot), uniprot));
    }
    if let Some(symbol) = record.tss_gene_symbols.first() {
        promoter = promoter.literal(LABEL, symbol);
    }
    for synonym in &record.tss_gene_synonyms {
        promoter = promoter.literal(ALT_LABEL, synonym);
    }
    if let Some(name) = record.tss_gene_names.first() {
        promoter = promoter.literal(ALTERNATIVE, name);
    }
    Some(promoter)
}

fn transcript_resource(
    transcript: &TranscriptAssociation,
    nearest: &HashSet<&str>,
) -> Option<Resource> {
    let id = transcript.transcript_id.as_deref()?;
    let mut classes = vec![FANTAO.term("TssTranscript")];
    if nearest.contains(id) {
        classes.push(FANTAO.term("NearestTssTranscript"));
    }
    let (class, namespace) = match IdKind::classify(id) {
        IdKind::Ensembl => ("Ensembl", ENSEMBL),
        IdKind::RefSeq => ("RefSeq", REFSEQ),
        IdKind::Insdc => ("Insdc", INSDC),
    };
    let mut resource = Resource::block()
        .types(&classes)
        .resource(SEE_ALSO, xref(class, namespace.term(id), id));
    if let Some(distance) = transcript.transcript_distance.as_ref().and_then(coerce_integer) {
        let measurement = Resource::inline()
            .typed(FANTAO.term("TssDistance"))
            .integer(HAS_VALUE, distance)
            .term(HAS_UNIT, OBO.term("UO_0000244"));
        resource = resource.resource(HAS_ATTRIBUTE, measurement);
    }
    Some(resource)
}

/// `[ a fantao:<class> ; rdfs:seeAlso <target> ; dct:identifier "<id>" ]`
fn xref(class: &str, target: String, id: &str) -> Resource {
    Resource::inline()
        .typed(FANTAO.term(class))
        .term(SEE_ALSO, target)
        .literal(IDENTIFIER, id)
}

fn score(class: &str, value: i64) -> Resource {
    Resource::inline()
        .typed(FANTAO.term(class))
        .integer(HAS_VALUE, value)
}
