//! MUSCLE invocation on the combined protein FASTA.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::runner::ExternalCommand;

/// Align the combined FASTA into `aligned`. The tool's console output is
/// captured and suppressed; a non-zero exit aborts the pipeline.
pub fn run_muscle(
    muscle_exe: &str,
    combined: &Path,
    aligned: &Path,
    timeout: Option<Duration>,
) -> Result<()> {
    info!(
        "running alignment: {} -> {}",
        combined.display(),
        aligned.display()
    );

    let output = ExternalCommand::new("muscle", muscle_exe)
        .arg("-in")
        .arg(combined)
        .arg("-out")
        .arg(aligned)
        .timeout(timeout)
        .run()?;
    debug!(
        "muscle stderr: {}",
        String::from_utf8_lossy(&output.stderr).trim()
    );

    if !aligned.exists() {
        return Err(PipelineError::MissingFile(aligned.to_path_buf()));
    }
    Ok(())
}
