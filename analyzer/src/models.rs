//! Data model: the records that flow between pipeline stages and the
//! serializable report handed to consumers.

use std::collections::BTreeMap;

use serde::Serialize;

/// One CDS feature from the annotated reference record
#[derive(Debug, Clone)]
pub struct CdsFeature {
    pub gene: String,
    pub translation: String,
}

/// Annotated reference nucleotide record, immutable once fetched
#[derive(Debug, Clone)]
pub struct ReferenceRecord {
    /// Versioned accession (VERSION line; falls back to ACCESSION, then
    /// the LOCUS name)
    pub id: String,
    pub name: String,
    pub description: String,
    /// Nucleotide length from the LOCUS line
    pub length: usize,
    /// CDS features in annotation order
    pub cds: Vec<CdsFeature>,
}

impl ReferenceRecord {
    pub fn metadata(&self) -> Metadata {
        Metadata {
            sequence_id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            length: self.length,
        }
    }
}

/// Metadata record. Serialized with the capitalized keys the downstream
/// data-file consumers expect.
#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    #[serde(rename = "Sequence ID")]
    pub sequence_id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Length")]
    pub length: usize,
}

/// A translated variant protein, immutable once translated
#[derive(Debug, Clone)]
pub struct VariantRecord {
    pub id: String,
    pub protein: String,
}

/// Per-gene half-open range in the shared aligned coordinate space
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneSpan {
    pub gene: String,
    pub start: usize,
    pub end: usize,
}

/// One amino-acid substitution in aligned coordinates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mutation {
    pub position: usize,
    pub reference: char,
    pub variant: char,
}

/// One row of the alignment, in canonical order
#[derive(Debug, Clone, Serialize)]
pub struct AlignedSequence {
    pub id: String,
    pub sequence: String,
}

/// Alignment/mutation record: ordered spans, ordered rows, substitutions
/// keyed by variant id
#[derive(Debug, Clone, Serialize)]
pub struct AlignmentData {
    pub alignment_index: Vec<GeneSpan>,
    pub aligned_sequences: Vec<AlignedSequence>,
    pub mutation_data: BTreeMap<String, Vec<Mutation>>,
}

/// Parsed output of the mRNA design tool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignOutput {
    pub mrna_sequence: String,
    pub mrna_structure: String,
    pub free_energy: f64,
    pub cai: f64,
}

/// Helix/turn/sheet propensity fractions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecondaryStructureFraction {
    pub helix: f64,
    pub turn: f64,
    pub sheet: f64,
}

/// Physicochemical battery for one protein subsequence
#[derive(Debug, Clone, Serialize)]
pub struct ProteinParameters {
    pub sequence: String,
    pub molecular_weight: f64,
    pub amino_acid_count: BTreeMap<char, usize>,
    pub amino_acid_percent: BTreeMap<char, f64>,
    pub isoelectric_point: f64,
    pub instability_index: f64,
    pub secondary_structure_fraction: SecondaryStructureFraction,
    pub gravy: f64,
    pub aromaticity: f64,
}

/// Design/protein-parameters record
#[derive(Debug, Clone, Serialize)]
pub struct DesignData {
    pub linear_design: DesignOutput,
    pub prot_param: ProteinParameters,
}

/// The full pipeline result: three flat records suitable for structured
/// serialization
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub metadata: Metadata,
    pub alignment: AlignmentData,
    pub design: DesignData,
}
