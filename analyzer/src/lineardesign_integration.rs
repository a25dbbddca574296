//! Sub-region extraction in aligned coordinates and the mRNA design tool
//! invocation.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::alignment::{Alignment, GAP};
use crate::error::{PipelineError, Result};
use crate::models::DesignOutput;
use crate::runner::ExternalCommand;

const SEQUENCE_LABEL: &str = "mRNA sequence:";
const STRUCTURE_LABEL: &str = "mRNA structure:";
const ENERGY_LABEL: &str = "mRNA folding free energy:";
const CAI_LABEL: &str = "mRNA CAI:";

/// Sub-region boundaries in reference-ungapped coordinates (half-open).
#[derive(Debug, Clone, Copy)]
pub struct SubRegion {
    pub start: usize,
    pub end: usize,
}

fn count_gaps(window: &str) -> usize {
    window.chars().filter(|&c| c == GAP).count()
}

/// Recover the gapped window of `region` inside `gene`'s span and extract
/// the target variant's ungapped residues over it.
///
/// Gap absorption happens in two stages against the *reference* row: first
/// the start boundary shifts past the gaps preceding it, then the end
/// extends by the gaps inside the shifted window. The resulting column
/// range is applied to the variant's row.
pub fn extract_target_region(
    alignment: &Alignment,
    gene: &str,
    variant_id: &str,
    region: SubRegion,
) -> Result<String> {
    if region.start > region.end {
        return Err(PipelineError::Format(format!(
            "sub-region start {} is past end {}",
            region.start, region.end
        )));
    }

    let span = alignment.span(gene)?;
    let reference_window = alignment
        .reference()
        .get(span.start..span.end)
        .ok_or_else(|| {
            PipelineError::Format(format!(
                "gene {gene} span [{}, {}) exceeds the reference row",
                span.start, span.end
            ))
        })?;

    let prefix = reference_window.get(..region.start).ok_or_else(|| {
        PipelineError::Format(format!(
            "sub-region start {} lies outside the {gene} window",
            region.start
        ))
    })?;
    let start = region.start + count_gaps(prefix);
    let mut end = region.end + count_gaps(prefix);
    let infix = reference_window.get(start..end).ok_or_else(|| {
        PipelineError::Format(format!(
            "sub-region end {} lies outside the {gene} window",
            region.end
        ))
    })?;
    end += count_gaps(infix);

    let variant_window = alignment
        .sequence(variant_id)?
        .get(span.start..span.end)
        .ok_or_else(|| {
            PipelineError::Format(format!(
                "gene {gene} span [{}, {}) exceeds the {variant_id} row",
                span.start, span.end
            ))
        })?;
    let target: String = variant_window
        .get(start..end)
        .ok_or_else(|| {
            PipelineError::Format(format!(
                "gapped sub-region [{start}, {end}) exceeds the {variant_id} window"
            ))
        })?
        .chars()
        .filter(|&c| c != GAP)
        .collect();

    debug!(
        "extracted {} residues of {variant_id} {gene} over columns [{start}, {end})",
        target.len()
    );
    Ok(target)
}

/// Pipe the ungapped subsequence to the design executable and parse its
/// stdout. The tool's directory is passed as the subprocess working
/// directory; a non-zero exit aborts the pipeline.
pub fn run_linear_design(
    design_dir: &Path,
    design_exe: &str,
    sequence: &str,
    timeout: Option<Duration>,
) -> Result<DesignOutput> {
    info!("running mRNA design on {} residues", sequence.len());
    let output = ExternalCommand::new("lineardesign", design_dir.join(design_exe))
        .working_dir(design_dir)
        .stdin_payload(sequence)
        .timeout(timeout)
        .run()?;
    parse_design_output(&String::from_utf8_lossy(&output.stdout))
}

/// Parse the four labeled result lines from the end of the tool's stdout:
/// fourth-from-last the mRNA sequence, third-from-last the structure,
/// second-from-last the `free energy;CAI` pair.
pub fn parse_design_output(stdout: &str) -> Result<DesignOutput> {
    let lines: Vec<&str> = stdout.lines().collect();
    if lines.len() < 4 {
        return Err(PipelineError::Format(format!(
            "design output carries {} lines, expected at least 4",
            lines.len()
        )));
    }

    let mrna_sequence = strip_label(lines[lines.len() - 4], SEQUENCE_LABEL)?.to_string();
    let mrna_structure = strip_label(lines[lines.len() - 3], STRUCTURE_LABEL)?.to_string();

    let metrics = lines[lines.len() - 2];
    let (energy_part, cai_part) = metrics.split_once(';').ok_or_else(|| {
        PipelineError::Format(format!("design metrics line is not a labeled pair: {metrics}"))
    })?;
    let free_energy = parse_metric(strip_label(energy_part, ENERGY_LABEL)?)?;
    let cai = parse_metric(strip_label(cai_part, CAI_LABEL)?)?;

    Ok(DesignOutput {
        mrna_sequence,
        mrna_structure,
        free_energy,
        cai,
    })
}

fn strip_label<'a>(line: &'a str, label: &str) -> Result<&'a str> {
    line.trim()
        .strip_prefix(label)
        .map(str::trim)
        .ok_or_else(|| {
            PipelineError::Format(format!("design output line missing label {label:?}: {line}"))
        })
}

/// Numeric field, tolerating a trailing unit (`-182.2 kcal/mol`).
fn parse_metric(value: &str) -> Result<f64> {
    let number = value.strip_suffix("kcal/mol").map(str::trim).unwrap_or(value);
    number
        .parse::<f64>()
        .map_err(|_| PipelineError::Format(format!("design metric is not a number: {value}")))
}
