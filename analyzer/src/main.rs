use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::lineardesign_integration::SubRegion;
use crate::pipeline::PipelineOptions;

mod alignment;
mod api_handler;
mod error;
mod genbank;
mod lineardesign_integration;
mod models;
mod muscle_integration;
mod mutation;
mod pipeline;
mod prepare;
mod protparam;
mod runner;
mod translate;

/// Comparative viral protein analysis: fetch an annotated reference,
/// align translated variants against it, enumerate amino-acid
/// substitutions, and run mRNA design plus protein statistics on a
/// sub-region of interest.
#[derive(Parser, Debug)]
#[command(name = "analyzer", version)]
struct Cli {
    /// Reference nucleotide accession id (e.g. NC_045512)
    accession: String,

    /// Variant nucleotide FASTA file (exactly one record each); repeatable
    #[arg(long = "variant", required = true, value_name = "FASTA")]
    variants: Vec<PathBuf>,

    /// Contact email sent with every NCBI request
    #[arg(long, default_value = "your_email@example.com")]
    email: String,

    /// Tool name sent with every NCBI request
    #[arg(long, default_value = "analyzer")]
    tool_name: String,

    /// MUSCLE executable
    #[arg(long, default_value = "muscle")]
    muscle_exe: String,

    /// Directory containing the mRNA design tool
    #[arg(long, value_name = "DIR")]
    design_dir: PathBuf,

    /// Design executable, resolved inside --design-dir unless absolute
    #[arg(long, default_value = "lineardesign")]
    design_exe: String,

    /// Gene containing the sub-region of interest
    #[arg(long, default_value = "S")]
    gene: String,

    /// Variant whose sub-region is designed (default: first variant)
    #[arg(long)]
    target_variant: Option<String>,

    /// Sub-region start in reference-ungapped coordinates
    #[arg(long, default_value_t = 318)]
    region_start: usize,

    /// Sub-region end in reference-ungapped coordinates
    #[arg(long, default_value_t = 541)]
    region_end: usize,

    /// Directory for the combined/aligned FASTA intermediates
    #[arg(long, default_value = "result")]
    work_dir: PathBuf,

    /// Write metadata.json, alignment_data.json and linear_design_data.json
    /// under this directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Kill an external tool after this many seconds
    #[arg(long)]
    tool_timeout_secs: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = PipelineOptions {
        accession: cli.accession,
        variant_files: cli.variants,
        email: cli.email,
        tool_name: cli.tool_name,
        muscle_exe: cli.muscle_exe,
        design_dir: cli.design_dir,
        design_exe: cli.design_exe,
        gene: cli.gene,
        target_variant: cli.target_variant,
        region: SubRegion {
            start: cli.region_start,
            end: cli.region_end,
        },
        work_dir: cli.work_dir,
        output_dir: cli.output_dir,
        tool_timeout: cli.tool_timeout_secs.map(Duration::from_secs),
    };

    let report = pipeline::run(&options).context("analysis pipeline failed")?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
