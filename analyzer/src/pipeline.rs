//! Sequential orchestration: fetch, prepare, align, read, diff, design,
//! analyze. Data flows strictly forward; any fatal error aborts before a
//! partial report is assembled.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::alignment;
use crate::api_handler;
use crate::error::{PipelineError, Result};
use crate::genbank;
use crate::lineardesign_integration::{self, SubRegion};
use crate::models::{AlignedSequence, AlignmentData, AnalysisReport, DesignData};
use crate::muscle_integration;
use crate::mutation;
use crate::prepare;
use crate::protparam;

pub struct PipelineOptions {
    pub accession: String,
    pub variant_files: Vec<PathBuf>,
    pub email: String,
    pub tool_name: String,
    pub muscle_exe: String,
    pub design_dir: PathBuf,
    pub design_exe: String,
    pub gene: String,
    pub target_variant: Option<String>,
    pub region: SubRegion,
    pub work_dir: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub tool_timeout: Option<Duration>,
}

pub fn run(options: &PipelineOptions) -> Result<AnalysisReport> {
    let text =
        api_handler::fetch_genbank(&options.accession, &options.email, &options.tool_name)?;
    let reference = genbank::parse(&text)?;
    info!(
        "fetched {} ({}, {} bp, {} CDS features)",
        reference.id,
        reference.name,
        reference.length,
        reference.cds.len()
    );

    let proteins = prepare::reference_proteins(&reference);
    let variants = options
        .variant_files
        .iter()
        .map(|path| prepare::read_variant(path))
        .collect::<Result<Vec<_>>>()?;
    if variants.is_empty() {
        return Err(PipelineError::Format(
            "no variant FASTA files given".to_string(),
        ));
    }

    fs::create_dir_all(&options.work_dir)?;
    let combined = options.work_dir.join("combined.fasta");
    let aligned = options.work_dir.join("aligned.fasta");
    prepare::write_combined(&combined, &reference.id, &proteins.sequence, &variants)?;

    muscle_integration::run_muscle(
        &options.muscle_exe,
        &combined,
        &aligned,
        options.tool_timeout,
    )?;

    let variant_ids: Vec<String> = variants.iter().map(|v| v.id.clone()).collect();
    let alignment = alignment::load(
        &aligned,
        &reference.id,
        &variant_ids,
        &proteins.gene_lengths,
    )?;

    let mutation_data = mutation::mutation_table(&alignment)?;

    let target_variant = options
        .target_variant
        .clone()
        .unwrap_or_else(|| variant_ids[0].clone());
    let target = lineardesign_integration::extract_target_region(
        &alignment,
        &options.gene,
        &target_variant,
        options.region,
    )?;
    let linear_design = lineardesign_integration::run_linear_design(
        &options.design_dir,
        &options.design_exe,
        &target,
        options.tool_timeout,
    )?;

    let prot_param = protparam::analyze(&target)?;

    let mut aligned_sequences = Vec::with_capacity(alignment.order.len());
    for id in &alignment.order {
        aligned_sequences.push(AlignedSequence {
            id: id.clone(),
            sequence: alignment.sequence(id)?.to_string(),
        });
    }

    let report = AnalysisReport {
        metadata: reference.metadata(),
        alignment: AlignmentData {
            alignment_index: alignment.spans.clone(),
            aligned_sequences,
            mutation_data,
        },
        design: DesignData {
            linear_design,
            prot_param,
        },
    };

    if let Some(dir) = &options.output_dir {
        fs::create_dir_all(dir)?;
        write_json(&dir.join("metadata.json"), &report.metadata)?;
        write_json(&dir.join("alignment_data.json"), &report.alignment)?;
        write_json(&dir.join("linear_design_data.json"), &report.design)?;
        info!("wrote data files to {}", dir.display());
    }

    Ok(report)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| PipelineError::Format(format!("serializing report: {e}")))?;
    fs::write(path, text)?;
    Ok(())
}
