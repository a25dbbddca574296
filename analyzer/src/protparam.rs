//! Physicochemical protein statistics for the extracted subsequence.
//!
//! Pure functions of the input sequence: molecular weight, residue
//! composition, isoelectric point (Henderson-Hasselbalch bisection),
//! instability index (Guruprasad 1990 dipeptide weights), secondary
//! structure fractions, GRAVY, and aromaticity.

use std::collections::BTreeMap;

use crate::error::{PipelineError, Result};
use crate::models::{ProteinParameters, SecondaryStructureFraction};

/// The 20 standard amino acids, in index order.
const AMINO_ACIDS: [u8; 20] = *b"ACDEFGHIKLMNPQRSTVWY";

fn aa_index(aa: u8) -> Option<usize> {
    AMINO_ACIDS.iter().position(|&a| a == aa)
}

/// Uppercase and validate against the standard 20-letter alphabet.
fn normalize(sequence: &str) -> Result<Vec<u8>> {
    if sequence.is_empty() {
        return Err(PipelineError::Format("empty protein sequence".to_string()));
    }
    sequence
        .bytes()
        .map(|b| {
            let upper = b.to_ascii_uppercase();
            if aa_index(upper).is_some() {
                Ok(upper)
            } else {
                Err(PipelineError::Format(format!(
                    "invalid amino acid '{}' in protein sequence",
                    b as char
                )))
            }
        })
        .collect()
}

/// Average residue masses, indexed by `aa_index`; one water is subtracted
/// per peptide bond.
const RESIDUE_MASS: [f64; 20] = [
    89.0932,  // A
    121.1582, // C
    133.1027, // D
    147.1293, // E
    165.1891, // F
    75.0666,  // G
    155.1546, // H
    131.1729, // I
    146.1876, // K
    131.1729, // L
    149.2113, // M
    132.1179, // N
    115.1305, // P
    146.1445, // Q
    174.2010, // R
    105.0926, // S
    119.1192, // T
    117.1463, // V
    204.2252, // W
    181.1885, // Y
];

const WATER: f64 = 18.0153;

/// Kyte-Doolittle (1982) hydropathy values, indexed by `aa_index`.
const KYTE_DOOLITTLE: [f64; 20] = [
    1.8,  // A
    2.5,  // C
    -3.5, // D
    -3.5, // E
    2.8,  // F
    -0.4, // G
    -3.2, // H
    4.5,  // I
    -3.9, // K
    3.8,  // L
    1.9,  // M
    -3.5, // N
    -1.6, // P
    -3.5, // Q
    -4.5, // R
    -0.8, // S
    -0.7, // T
    4.2,  // V
    -0.9, // W
    -1.3, // Y
];

// pKa values for the charge model.
const PKA_NTERM: f64 = 9.69;
const PKA_CTERM: f64 = 2.34;
const PKA_D: f64 = 3.65;
const PKA_E: f64 = 4.25;
const PKA_C: f64 = 8.18;
const PKA_Y: f64 = 10.07;
const PKA_H: f64 = 6.00;
const PKA_K: f64 = 10.53;
const PKA_R: f64 = 12.48;

/// Guruprasad et al. (1990) dipeptide instability weights,
/// `DIWV[first][second]`, indexed by `aa_index`. Dipeptides without a
/// published weight carry 1.0.
#[rustfmt::skip]
const DIWV: [[f64; 20]; 20] = [
    //        A       C       D       E       F       G       H       I       K       L       M       N       P       Q       R       S       T       V       W       Y
    /* A */ [  1.0,  44.94,  -7.49,    1.0,    1.0,    1.0,  -7.49,    1.0,    1.0,    1.0,    1.0,    1.0,  20.26,    1.0,    1.0,    1.0,    1.0,    1.0,    1.0,    1.0],
    /* C */ [  1.0,    1.0,  20.26,    1.0,    1.0,    1.0,  33.60,    1.0,    1.0,  20.26,  33.60,    1.0,  20.26,  -6.54,    1.0,    1.0,  33.60,  -6.54,  24.68,    1.0],
    /* D */ [  1.0,    1.0,    1.0,    1.0,  -6.54,    1.0,    1.0,    1.0,  -7.49,    1.0,    1.0,    1.0,    1.0,    1.0,  -6.54,  20.26, -14.03,    1.0,    1.0,    1.0],
    /* E */ [  1.0,  44.94,  20.26,  33.60,    1.0,    1.0,  -6.54,  20.26,    1.0,    1.0,    1.0,    1.0,  20.26,  20.26,    1.0,  20.26,    1.0,    1.0, -14.03,    1.0],
    /* F */ [  1.0,    1.0,  13.34,    1.0,    1.0,    1.0,    1.0,    1.0, -14.03,    1.0,    1.0,    1.0,  20.26,    1.0,    1.0,    1.0,    1.0,    1.0,    1.0,  33.60],
    /* G */ [-7.49,    1.0,    1.0,  -6.54,    1.0,  13.34,    1.0,  -7.49,  -7.49,    1.0,    1.0,  -7.49,    1.0,    1.0,    1.0,    1.0,  -7.49,    1.0,  13.34,  -7.49],
    /* H */ [  1.0,    1.0,    1.0,    1.0,  -9.37,  -9.37,    1.0,  44.94,  24.68,    1.0,    1.0,  24.68,  -1.88,    1.0,    1.0,    1.0,  -6.54,    1.0,  -1.88,  44.94],
    /* I */ [  1.0,    1.0,    1.0,  44.94,    1.0,    1.0,  13.34,    1.0,  -7.49,  20.26,    1.0,    1.0,  -1.88,    1.0,    1.0,    1.0,    1.0,  -7.49,    1.0,    1.0],
    /* K */ [  1.0,    1.0,    1.0,    1.0,    1.0,  -7.49,    1.0,  -7.49,    1.0,  -7.49,  33.60,    1.0,  -6.54,  24.64,  33.60,    1.0,    1.0,  -7.49,    1.0,    1.0],
    /* L */ [  1.0,    1.0,    1.0,    1.0,    1.0,    1.0,    1.0,    1.0,  -7.49,    1.0,    1.0,    1.0,  20.26,  33.60,  20.26,    1.0,    1.0,    1.0,  24.68,    1.0],
    /* M */ [13.34,    1.0,    1.0,    1.0,    1.0,    1.0,  58.28,    1.0,    1.0,    1.0,  -1.88,    1.0,  44.94,  -6.54,  -6.54,  44.94,  -1.88,    1.0,    1.0,  24.68],
    /* N */ [  1.0,  -1.88,    1.0,    1.0, -14.03, -14.03,    1.0,  44.94,  24.68,    1.0,    1.0,    1.0,  -1.88,  -6.54,    1.0,    1.0,  -7.49,    1.0,  -9.37,    1.0],
    /* P */ [20.26,  -6.54,  -6.54,  18.38,  20.26,    1.0,    1.0,    1.0,    1.0,    1.0,  -6.54,    1.0,  20.26,  20.26,  -6.54,  20.26,    1.0,  20.26,  -1.88,    1.0],
    /* Q */ [  1.0,  -6.54,  20.26,  20.26,  -6.54,    1.0,    1.0,    1.0,    1.0,    1.0,    1.0,    1.0,  20.26,  20.26,    1.0,  44.94,    1.0,  -6.54,    1.0,  -6.54],
    /* R */ [  1.0,    1.0,    1.0,    1.0,    1.0,  -7.49,  20.26,    1.0,    1.0,    1.0,    1.0,  13.34,  20.26,  20.26,  58.28,  44.94,    1.0,    1.0,  58.28,  -6.54],
    /* S */ [  1.0,  33.60,    1.0,  20.26,    1.0,    1.0,    1.0,    1.0,    1.0,    1.0,    1.0,    1.0,  44.94,  20.26,  20.26,  20.26,    1.0,    1.0,    1.0,    1.0],
    /* T */ [  1.0,    1.0,    1.0,  20.26,  13.34,  -7.49,    1.0,    1.0,    1.0,    1.0,    1.0, -14.03,    1.0,  -6.54,    1.0,    1.0,    1.0,    1.0, -14.03,    1.0],
    /* V */ [  1.0,    1.0, -14.03,    1.0,    1.0,  -7.49,    1.0,    1.0,  -1.88,    1.0,    1.0,    1.0,  20.26,    1.0,    1.0,    1.0,  -7.49,    1.0,    1.0,  -6.54],
    /* W */ [-14.03,   1.0,    1.0,    1.0,    1.0,  -9.37,  24.68,    1.0,    1.0,  13.34,  24.68,  13.34,    1.0,    1.0,    1.0,    1.0, -14.03,  -7.49,    1.0,    1.0],
    /* Y */ [24.68,    1.0,  24.68,  -6.54,    1.0,  -7.49,  13.34,    1.0,    1.0,    1.0,  44.94,    1.0,  13.34,    1.0, -15.91,    1.0,  -7.49,    1.0,  -9.37,  13.34],
];

// Residue classes for the secondary-structure fraction triple.
const HELIX_RESIDUES: &[u8] = b"VIYFWL";
const TURN_RESIDUES: &[u8] = b"NPGS";
const SHEET_RESIDUES: &[u8] = b"EMAL";

const AROMATIC_RESIDUES: &[u8] = b"FWY";

/// Compute the full parameter battery for one protein subsequence.
pub fn analyze(sequence: &str) -> Result<ProteinParameters> {
    let seq = normalize(sequence)?;
    let len = seq.len() as f64;

    let mut counts: BTreeMap<char, usize> = AMINO_ACIDS.iter().map(|&a| (a as char, 0)).collect();
    for &aa in &seq {
        *counts.get_mut(&(aa as char)).expect("standard residue") += 1;
    }
    let percents: BTreeMap<char, f64> = counts
        .iter()
        .map(|(&aa, &count)| (aa, count as f64 / len))
        .collect();

    Ok(ProteinParameters {
        sequence: String::from_utf8(seq.clone()).expect("normalized ASCII"),
        molecular_weight: molecular_weight(&seq),
        amino_acid_count: counts,
        amino_acid_percent: percents,
        isoelectric_point: isoelectric_point(&seq),
        instability_index: instability_index(&seq),
        secondary_structure_fraction: secondary_structure_fraction(&seq),
        gravy: gravy(&seq),
        aromaticity: class_fraction(&seq, AROMATIC_RESIDUES),
    })
}

fn molecular_weight(seq: &[u8]) -> f64 {
    let residues: f64 = seq
        .iter()
        .map(|&aa| RESIDUE_MASS[aa_index(aa).expect("normalized")])
        .sum();
    residues - (seq.len() as f64 - 1.0) * WATER
}

/// Net charge at a given pH via Henderson-Hasselbalch.
fn net_charge(seq: &[u8], ph: f64) -> f64 {
    let mut charge = 0.0;

    charge += 1.0 / (1.0 + 10_f64.powf(ph - PKA_NTERM));
    charge -= 1.0 / (1.0 + 10_f64.powf(PKA_CTERM - ph));

    for &aa in seq {
        match aa {
            b'D' => charge -= 1.0 / (1.0 + 10_f64.powf(PKA_D - ph)),
            b'E' => charge -= 1.0 / (1.0 + 10_f64.powf(PKA_E - ph)),
            b'C' => charge -= 1.0 / (1.0 + 10_f64.powf(PKA_C - ph)),
            b'Y' => charge -= 1.0 / (1.0 + 10_f64.powf(PKA_Y - ph)),
            b'H' => charge += 1.0 / (1.0 + 10_f64.powf(ph - PKA_H)),
            b'K' => charge += 1.0 / (1.0 + 10_f64.powf(ph - PKA_K)),
            b'R' => charge += 1.0 / (1.0 + 10_f64.powf(ph - PKA_R)),
            _ => {}
        }
    }
    charge
}

/// Isoelectric point by bisection on the charge equation.
fn isoelectric_point(seq: &[u8]) -> f64 {
    let mut lo = 0.0_f64;
    let mut hi = 14.0_f64;

    for _ in 0..100 {
        let mid = (lo + hi) / 2.0;
        let charge = net_charge(seq, mid);
        if charge.abs() < 0.001 {
            return mid;
        }
        if charge > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    (lo + hi) / 2.0
}

/// Instability index: `10/L * sum of dipeptide weights`.
fn instability_index(seq: &[u8]) -> f64 {
    let sum: f64 = seq
        .windows(2)
        .map(|pair| {
            DIWV[aa_index(pair[0]).expect("normalized")][aa_index(pair[1]).expect("normalized")]
        })
        .sum();
    10.0 / seq.len() as f64 * sum
}

fn class_fraction(seq: &[u8], class: &[u8]) -> f64 {
    seq.iter().filter(|aa| class.contains(aa)).count() as f64 / seq.len() as f64
}

fn secondary_structure_fraction(seq: &[u8]) -> SecondaryStructureFraction {
    SecondaryStructureFraction {
        helix: class_fraction(seq, HELIX_RESIDUES),
        turn: class_fraction(seq, TURN_RESIDUES),
        sheet: class_fraction(seq, SHEET_RESIDUES),
    }
}

/// GRAVY: mean Kyte-Doolittle hydropathy over the sequence.
fn gravy(seq: &[u8]) -> f64 {
    let sum: f64 = seq
        .iter()
        .map(|&aa| KYTE_DOOLITTLE[aa_index(aa).expect("normalized")])
        .sum();
    sum / seq.len() as f64
}

//───────────────────────────────── tests ───────────────────────────────────//
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_percents_cover_all_residues() {
        let params = analyze("AAK").unwrap();
        assert_eq!(params.amino_acid_count.len(), 20);
        assert_eq!(params.amino_acid_count[&'A'], 2);
        assert_eq!(params.amino_acid_count[&'K'], 1);
        assert_eq!(params.amino_acid_count[&'W'], 0);
        assert!((params.amino_acid_percent[&'A'] - 2.0 / 3.0).abs() < 1e-10);
        let total: f64 = params.amino_acid_percent.values().sum();
        assert!((total - 1.0).abs() < 1e-10);
    }

    #[test]
    fn molecular_weight_subtracts_water_per_bond() {
        let single = analyze("A").unwrap();
        assert!((single.molecular_weight - 89.0932).abs() < 1e-4);
        let pair = analyze("AA").unwrap();
        assert!((pair.molecular_weight - (2.0 * 89.0932 - 18.0153)).abs() < 1e-4);
    }

    #[test]
    fn gravy_matches_kyte_doolittle() {
        assert!((analyze("IIIII").unwrap().gravy - 4.5).abs() < 1e-10);
        // A = 1.8, R = -4.5
        assert!((analyze("AR").unwrap().gravy - (-1.35)).abs() < 1e-10);
    }

    #[test]
    fn aromaticity_counts_f_w_y() {
        assert!((analyze("FWYA").unwrap().aromaticity - 0.75).abs() < 1e-10);
        assert_eq!(analyze("AAAA").unwrap().aromaticity, 0.0);
    }

    #[test]
    fn secondary_structure_fractions() {
        let ssf = analyze("VNEA").unwrap().secondary_structure_fraction;
        assert!((ssf.helix - 0.25).abs() < 1e-10);
        assert!((ssf.turn - 0.25).abs() < 1e-10);
        // E and A are both sheet formers
        assert!((ssf.sheet - 0.5).abs() < 1e-10);
    }

    #[test]
    fn isoelectric_point_tracks_charge() {
        assert!(analyze("DDDDD").unwrap().isoelectric_point < 4.0);
        assert!(analyze("KKKKK").unwrap().isoelectric_point > 10.0);
        let neutral = analyze("GGGGG").unwrap().isoelectric_point;
        assert!(neutral > 5.0 && neutral < 7.0);
    }

    #[test]
    fn instability_index_spot_values() {
        // A-C carries weight 44.94: 10/2 * 44.94
        assert!((analyze("AC").unwrap().instability_index - 224.7).abs() < 1e-9);
        // A-A is an unlisted dipeptide (weight 1.0)
        assert!((analyze("AA").unwrap().instability_index - 5.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_invalid_residues_and_empty_input() {
        assert!(matches!(analyze("AB"), Err(PipelineError::Format(_))));
        assert!(matches!(analyze("AC-D"), Err(PipelineError::Format(_))));
        assert!(matches!(analyze(""), Err(PipelineError::Format(_))));
    }

    #[test]
    fn lowercase_input_is_normalized() {
        let params = analyze("mfvf").unwrap();
        assert_eq!(params.sequence, "MFVF");
    }
}
