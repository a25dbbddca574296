//! Line-oriented parser for GenBank flat-file records as returned by
//! efetch with `rettype=gb`.
//!
//! Only the fields the pipeline consumes are extracted: LOCUS name and
//! length, DEFINITION, VERSION/ACCESSION, and CDS features with their
//! `/gene` and `/translation` qualifiers. Parsing stops at ORIGIN.

use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::models::{CdsFeature, ReferenceRecord};

// Feature keys start at this column, qualifier lines past it.
const FEATURE_KEY_COLUMN: usize = 5;

#[derive(Default)]
struct CdsBuilder {
    gene: Option<String>,
    translation: Option<String>,
}

impl CdsBuilder {
    fn finish(self, features: &mut Vec<CdsFeature>) {
        match (self.gene, self.translation) {
            (Some(gene), Some(translation)) => features.push(CdsFeature { gene, translation }),
            (gene, _) => {
                // The annotation can carry CDS features without a usable
                // gene/translation pair (pseudogenes, partial entries).
                debug!(
                    "skipping CDS without gene/translation qualifiers (gene: {:?})",
                    gene
                );
            }
        }
    }
}

/// Parse one GenBank flat-file record.
pub fn parse(text: &str) -> Result<ReferenceRecord> {
    let mut name = None;
    let mut length = None;
    let mut accession = None;
    let mut version = None;
    let mut description = String::new();

    let mut in_features = false;
    let mut in_definition = false;
    let mut cds: Option<CdsBuilder> = None;
    let mut translation_open = false;
    let mut features = Vec::new();

    for line in text.lines() {
        if !line.starts_with(' ') && !line.is_empty() {
            // Column-0 keyword: whatever was being accumulated is over.
            in_definition = false;
            if in_features {
                if let Some(builder) = cds.take() {
                    builder.finish(&mut features);
                }
                translation_open = false;
                in_features = false;
            }

            let mut tokens = line.split_whitespace();
            match tokens.next() {
                Some("LOCUS") => {
                    name = tokens.next().map(str::to_string);
                    length = tokens.next().and_then(|t| t.parse::<usize>().ok());
                }
                Some("DEFINITION") => {
                    description = tokens.collect::<Vec<_>>().join(" ");
                    in_definition = true;
                }
                Some("ACCESSION") => {
                    accession = tokens.next().map(str::to_string);
                }
                Some("VERSION") => {
                    version = tokens.next().map(str::to_string);
                }
                Some("FEATURES") => {
                    in_features = true;
                }
                Some("ORIGIN") | Some("//") => break,
                _ => {}
            }
            continue;
        }

        if in_definition {
            description.push(' ');
            description.push_str(line.trim());
            continue;
        }

        if !in_features {
            continue;
        }

        let bytes = line.as_bytes();
        if bytes.len() > FEATURE_KEY_COLUMN && bytes[FEATURE_KEY_COLUMN] != b' ' {
            // New feature key.
            if let Some(builder) = cds.take() {
                builder.finish(&mut features);
            }
            translation_open = false;
            let key = line.trim_start().split_whitespace().next().unwrap_or("");
            if key == "CDS" {
                cds = Some(CdsBuilder::default());
            }
            continue;
        }

        // Qualifier line or continuation of a multi-line qualifier value.
        let Some(builder) = cds.as_mut() else {
            continue;
        };
        let trimmed = line.trim();
        if translation_open {
            let chunk = trimmed.strip_suffix('"');
            builder
                .translation
                .get_or_insert_with(String::new)
                .push_str(chunk.unwrap_or(trimmed));
            if chunk.is_some() {
                translation_open = false;
            }
        } else if let Some(value) = trimmed.strip_prefix("/gene=") {
            builder.gene = Some(value.trim_matches('"').to_string());
        } else if let Some(value) = trimmed.strip_prefix("/translation=\"") {
            match value.strip_suffix('"') {
                Some(complete) => builder.translation = Some(complete.to_string()),
                None => {
                    builder.translation = Some(value.to_string());
                    translation_open = true;
                }
            }
        }
    }

    if let Some(builder) = cds.take() {
        builder.finish(&mut features);
    }

    let name = name.ok_or_else(|| {
        PipelineError::Format("GenBank record has no parseable LOCUS line".to_string())
    })?;
    let length = length.ok_or_else(|| {
        PipelineError::Format(format!("LOCUS line for {name} carries no sequence length"))
    })?;
    // Record id preference: versioned accession first, bare accession
    // next, locus name last.
    let id = version.or(accession).unwrap_or_else(|| name.clone());
    let description = description.trim_end_matches('.').to_string();

    Ok(ReferenceRecord {
        id,
        name,
        description,
        length,
        cds: features,
    })
}
