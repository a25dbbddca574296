//! Error types for the analysis pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can abort the pipeline. Every variant is fatal: the pipeline
/// produces no partial report once one of these surfaces.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Remote fetch failure (unknown accession, service error, transport
    /// failure). Single attempt, no retry.
    #[error("retrieval failed ({}): {reason}", display_status(.status))]
    Retrieval {
        /// HTTP status code, if the service answered at all
        status: Option<u16>,
        /// Error message
        reason: String,
    },

    /// Malformed or unexpected input: FASTA shape, GenBank text, sequence
    /// alphabet, or external tool output that does not match its contract
    #[error("format error: {0}")]
    Format(String),

    /// Expected intermediate file absent
    #[error("missing file: {}", .0.display())]
    MissingFile(PathBuf),

    /// Expected record id (or gene name) absent from alignment data
    #[error("missing record: {0}")]
    MissingRecord(String),

    /// External tool exited non-zero, timed out, or could not be spawned
    #[error("{tool} failed ({}): {stderr}", display_exit(.status))]
    ExternalTool {
        /// Tool name for reporting
        tool: String,
        /// Exit code, if the process ran to completion
        status: Option<i32>,
        /// Captured stderr or spawn failure message
        stderr: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("HTTP {code}"),
        None => "no response".to_string(),
    }
}

fn display_exit(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit {code}"),
        None => "no exit code".to_string(),
    }
}
