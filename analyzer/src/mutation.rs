//! Positional substitution scan between aligned protein rows.

use std::collections::BTreeMap;

use crate::alignment::{Alignment, GAP};
use crate::error::Result;
use crate::models::Mutation;

/// Compare a variant row against the reference row position by position.
/// A substitution is recorded only where both residues are non-gap and
/// differ; gap-vs-residue columns are insertions/deletions, not
/// substitutions, and are never recorded.
pub fn find_substitutions(reference: &str, variant: &str) -> Vec<Mutation> {
    reference
        .chars()
        .zip(variant.chars())
        .enumerate()
        .filter(|(_, (r, v))| r != v && *r != GAP && *v != GAP)
        .map(|(position, (reference, variant))| Mutation {
            position,
            reference,
            variant,
        })
        .collect()
}

/// Substitutions for every variant in the alignment, keyed by variant id.
pub fn mutation_table(alignment: &Alignment) -> Result<BTreeMap<String, Vec<Mutation>>> {
    let reference = alignment.reference();
    let mut table = BTreeMap::new();
    for id in &alignment.order[1..] {
        let variant = alignment.sequence(id)?;
        table.insert(id.clone(), find_substitutions(reference, variant));
    }
    Ok(table)
}

//───────────────────────────────── tests ───────────────────────────────────//
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_single_substitution() {
        let mutations = find_substitutions("ACDEFG", "ACDQFG");
        assert_eq!(
            mutations,
            vec![Mutation {
                position: 3,
                reference: 'E',
                variant: 'Q',
            }]
        );
    }

    #[test]
    fn gap_columns_are_never_substitutions() {
        // Reference gap at position 2: an insertion in the variant, not a
        // substitution.
        assert!(find_substitutions("AC-DEF", "ACGDEF").is_empty());
        // Variant gap: a deletion.
        assert!(find_substitutions("ACGDEF", "AC-DEF").is_empty());
        // Gap against gap.
        assert!(find_substitutions("AC-DEF", "AC-DEF").is_empty());
    }

    #[test]
    fn positions_ascend_and_match_rows() {
        let reference = "MKV-STAR";
        let variant = "MRVQSTAK";
        let mutations = find_substitutions(reference, variant);
        assert_eq!(mutations.len(), 2);
        for pair in mutations.windows(2) {
            assert!(pair[0].position < pair[1].position);
        }
        for m in &mutations {
            assert_ne!(m.reference, m.variant);
            assert_ne!(m.reference, GAP);
            assert_ne!(m.variant, GAP);
            assert_eq!(reference.chars().nth(m.position).unwrap(), m.reference);
            assert_eq!(variant.chars().nth(m.position).unwrap(), m.variant);
        }
    }
}
