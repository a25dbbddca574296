//! Sequence preparation: reference protein assembly, variant translation,
//! and the combined FASTA handed to the aligner.

use std::fs::File;
use std::path::Path;

use bio::io::fasta;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::models::{ReferenceRecord, VariantRecord};
use crate::translate::translate_to_stop;

/// Concatenated reference protein plus the ordered ungapped length of each
/// gene's translation.
pub struct ReferenceProteins {
    pub sequence: String,
    pub gene_lengths: Vec<(String, usize)>,
}

/// Scan CDS features in annotation order; for each distinct gene name the
/// first annotated translation wins, later duplicates are ignored.
pub fn reference_proteins(record: &ReferenceRecord) -> ReferenceProteins {
    let mut sequence = String::new();
    let mut gene_lengths: Vec<(String, usize)> = Vec::new();

    for feature in &record.cds {
        if gene_lengths.iter().any(|(gene, _)| gene == &feature.gene) {
            debug!("duplicate CDS for gene {}, keeping first", feature.gene);
            continue;
        }
        gene_lengths.push((feature.gene.clone(), feature.translation.len()));
        sequence.push_str(&feature.translation);
    }

    ReferenceProteins {
        sequence,
        gene_lengths,
    }
}

/// Read exactly one nucleotide record from a variant FASTA file and
/// translate it as a single open reading frame.
pub fn read_variant(path: &Path) -> Result<VariantRecord> {
    let file = File::open(path)
        .map_err(|e| PipelineError::Format(format!("cannot open {}: {e}", path.display())))?;
    let reader = fasta::Reader::new(file);

    let mut records = reader.records();
    let record = records
        .next()
        .ok_or_else(|| {
            PipelineError::Format(format!("{} contains no FASTA record", path.display()))
        })?
        .map_err(|e| PipelineError::Format(format!("{}: {e}", path.display())))?;
    if records.next().is_some() {
        return Err(PipelineError::Format(format!(
            "{} contains more than one FASTA record",
            path.display()
        )));
    }

    let protein = translate_to_stop(record.seq());
    debug!(
        "translated {} ({} nt -> {} aa)",
        record.id(),
        record.seq().len(),
        protein.len()
    );
    Ok(VariantRecord {
        id: record.id().to_string(),
        protein,
    })
}

/// Write the combined protein FASTA: reference first, then each variant in
/// input order.
pub fn write_combined(
    path: &Path,
    reference_id: &str,
    reference_protein: &str,
    variants: &[VariantRecord],
) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = fasta::Writer::new(file);

    writer.write(
        reference_id,
        Some("reference protein"),
        reference_protein.as_bytes(),
    )?;
    for variant in variants {
        writer.write(
            &variant.id,
            Some("translated variant protein"),
            variant.protein.as_bytes(),
        )?;
    }
    info!(
        "wrote combined FASTA with {} sequences to {}",
        variants.len() + 1,
        path.display()
    );
    Ok(())
}

//───────────────────────────────── tests ───────────────────────────────────//
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CdsFeature;
    use std::io::Write;

    fn record_with(cds: Vec<(&str, &str)>) -> ReferenceRecord {
        ReferenceRecord {
            id: "REF.1".to_string(),
            name: "REF".to_string(),
            description: "test".to_string(),
            length: 100,
            cds: cds
                .into_iter()
                .map(|(gene, translation)| CdsFeature {
                    gene: gene.to_string(),
                    translation: translation.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn first_seen_wins_per_gene() {
        let record = record_with(vec![("S", "MFVF"), ("S", "XXXX"), ("E", "MYS")]);
        let proteins = reference_proteins(&record);
        assert_eq!(proteins.sequence, "MFVFMYS");
        assert_eq!(
            proteins.gene_lengths,
            vec![("S".to_string(), 4), ("E".to_string(), 3)]
        );
    }

    #[test]
    fn reads_single_record_variant() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, ">VAR1.1 spike\nATGTTTTAAGGG").unwrap();
        let variant = read_variant(file.path()).unwrap();
        assert_eq!(variant.id, "VAR1.1");
        assert_eq!(variant.protein, "MF");
    }

    #[test]
    fn rejects_multi_record_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, ">A\nATG\n>B\nATG").unwrap();
        let err = read_variant(file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::Format(_)));
    }

    #[test]
    fn rejects_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = read_variant(file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::Format(_)));
    }

    #[test]
    fn combined_fasta_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("combined.fasta");
        let variants = vec![
            VariantRecord {
                id: "V1".to_string(),
                protein: "MFV".to_string(),
            },
            VariantRecord {
                id: "V2".to_string(),
                protein: "MYS".to_string(),
            },
        ];
        write_combined(&path, "REF.1", "MFVFMYS", &variants).unwrap();

        let reader = fasta::Reader::new(File::open(&path).unwrap());
        let ids: Vec<String> = reader
            .records()
            .map(|r| r.unwrap().id().to_string())
            .collect();
        assert_eq!(ids, vec!["REF.1", "V1", "V2"]);
    }
}
