//! Aligned-FASTA reading, canonical record ordering, and gene-span
//! recomputation over the shared aligned coordinate space.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use bio::io::fasta;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::models::GeneSpan;

pub const GAP: char = '-';

/// The alignment as downstream steps consume it: id-keyed rows, the
/// canonical ordering (reference first, variants in input order), and the
/// gene spans computed from the reference row.
#[derive(Debug)]
pub struct Alignment {
    sequences: HashMap<String, String>,
    pub order: Vec<String>,
    pub spans: Vec<GeneSpan>,
}

impl Alignment {
    /// Row lookup; every id in `order` is guaranteed present.
    pub fn sequence(&self, id: &str) -> Result<&str> {
        self.sequences
            .get(id)
            .map(String::as_str)
            .ok_or_else(|| PipelineError::MissingRecord(id.to_string()))
    }

    /// The reference row (first entry of the canonical ordering).
    pub fn reference(&self) -> &str {
        &self.sequences[&self.order[0]]
    }

    pub fn span(&self, gene: &str) -> Result<&GeneSpan> {
        self.spans
            .iter()
            .find(|span| span.gene == gene)
            .ok_or_else(|| PipelineError::MissingRecord(format!("gene {gene}")))
    }
}

/// Parse the aligned FASTA and assemble the canonical view.
///
/// Fails with `MissingFile` if the aligner produced no output file, and
/// with `MissingRecord` if any expected id is absent from it.
pub fn load(
    path: &Path,
    reference_id: &str,
    variant_ids: &[String],
    gene_lengths: &[(String, usize)],
) -> Result<Alignment> {
    if !path.exists() {
        return Err(PipelineError::MissingFile(path.to_path_buf()));
    }
    let reader = fasta::Reader::new(File::open(path)?);

    let mut sequences = HashMap::new();
    for record in reader.records() {
        let record = record.map_err(|e| PipelineError::Format(format!("{}: {e}", path.display())))?;
        let seq = String::from_utf8_lossy(record.seq()).to_string();
        sequences.insert(record.id().to_string(), seq);
    }
    debug!("parsed {} aligned records from {}", sequences.len(), path.display());

    let mut order = Vec::with_capacity(variant_ids.len() + 1);
    order.push(reference_id.to_string());
    order.extend(variant_ids.iter().cloned());
    for id in &order {
        if !sequences.contains_key(id) {
            return Err(PipelineError::MissingRecord(id.clone()));
        }
    }

    let spans = compute_gene_spans(&sequences[reference_id], gene_lengths);
    info!(
        "alignment loaded: {} records, {} gene spans",
        order.len(),
        spans.len()
    );

    Ok(Alignment {
        sequences,
        order,
        spans,
    })
}

/// Recompute per-gene spans in aligned coordinates by one-shot gap
/// absorption: walk the genes in order, count the gap columns of the
/// reference row over each gene's ungapped length, and extend that gene's
/// end (and every later offset) by the count. The extension itself is not
/// rescanned.
pub fn compute_gene_spans(
    reference_aligned: &str,
    gene_lengths: &[(String, usize)],
) -> Vec<GeneSpan> {
    let reference: Vec<char> = reference_aligned.chars().collect();
    let mut spans = Vec::with_capacity(gene_lengths.len());
    let mut start = 0usize;

    for (gene, length) in gene_lengths {
        let mut end = start + length;
        let gap_count = reference[start..end.min(reference.len())]
            .iter()
            .filter(|&&c| c == GAP)
            .count();
        end += gap_count;
        spans.push(GeneSpan {
            gene: gene.clone(),
            start,
            end,
        });
        start = end;
    }
    spans
}

//───────────────────────────────── tests ───────────────────────────────────//
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn lengths(pairs: &[(&str, usize)]) -> Vec<(String, usize)> {
        pairs
            .iter()
            .map(|(g, l)| (g.to_string(), *l))
            .collect()
    }

    #[test]
    fn spans_absorb_gap_columns() {
        // Gene A: ungapped 4, two gaps inside -> [0, 6)
        // Gene B: ungapped 3, no gaps        -> [6, 9)
        let reference = "MF--VFMYS";
        let spans = compute_gene_spans(reference, &lengths(&[("A", 4), ("B", 3)]));
        assert_eq!(
            spans,
            vec![
                GeneSpan { gene: "A".to_string(), start: 0, end: 6 },
                GeneSpan { gene: "B".to_string(), start: 6, end: 9 },
            ]
        );
    }

    #[test]
    fn spans_are_contiguous_and_cover_the_alignment() {
        let reference = "MF-VF-MY-SA";
        let spans = compute_gene_spans(reference, &lengths(&[("A", 4), ("B", 2), ("C", 2)]));
        for pair in spans.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert_eq!(spans.first().unwrap().start, 0);
        assert_eq!(spans.last().unwrap().end, reference.len());
    }

    #[test]
    fn span_recomputation_is_idempotent() {
        let reference = "MF--VFMYS";
        let gene_lengths = lengths(&[("A", 4), ("B", 3)]);
        let first = compute_gene_spans(reference, &gene_lengths);
        let second = compute_gene_spans(reference, &gene_lengths);
        assert_eq!(first, second);
    }

    #[test]
    fn gapped_window_round_trips_to_ungapped_length() {
        let reference = "MF--VFMYS";
        let gene_lengths = lengths(&[("A", 4), ("B", 3)]);
        let spans = compute_gene_spans(reference, &gene_lengths);
        for (span, (_, ungapped)) in spans.iter().zip(&gene_lengths) {
            let residues = reference[span.start..span.end]
                .chars()
                .filter(|&c| c != GAP)
                .count();
            assert_eq!(residues, *ungapped);
        }
    }

    #[test]
    fn load_orders_reference_first_and_checks_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aligned.fasta");
        let mut file = File::create(&path).unwrap();
        // Aligner output order differs from the canonical order on purpose.
        writeln!(file, ">V1\nMK-S\n>REF.1\nMKAS\n>V2\nMKTS").unwrap();
        drop(file);

        let alignment = load(
            &path,
            "REF.1",
            &["V1".to_string(), "V2".to_string()],
            &lengths(&[("A", 4)]),
        )
        .unwrap();
        assert_eq!(alignment.order, vec!["REF.1", "V1", "V2"]);
        assert_eq!(alignment.reference(), "MKAS");
        assert_eq!(alignment.sequence("V2").unwrap(), "MKTS");
        assert!(alignment.sequence("V3").is_err());
    }

    #[test]
    fn load_rejects_missing_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aligned.fasta");
        let mut file = File::create(&path).unwrap();
        writeln!(file, ">REF.1\nMKAS").unwrap();
        drop(file);

        let err = load(&path, "REF.1", &["V1".to_string()], &lengths(&[("A", 4)]))
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingRecord(id) if id == "V1"));
    }

    #[test]
    fn load_rejects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(
            &dir.path().join("absent.fasta"),
            "REF.1",
            &[],
            &lengths(&[]),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::MissingFile(_)));
    }
}
