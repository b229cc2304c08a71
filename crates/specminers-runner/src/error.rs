//! Error types for installing and running the miner.

use std::path::PathBuf;

use specminers_core::CodecError;

/// Errors from building the miner's image.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    /// The container CLI could not be started.
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The image build exited unsuccessfully.
    #[error("building image '{image}' failed (exit code {code:?}): {stderr}")]
    BuildFailed {
        image: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Errors from a single run of the miner.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// No input files were given.
    #[error("expected one or more input files")]
    NoInputs,

    /// An input path does not name an existing file.
    #[error("input file not found: {}", .path.display())]
    InputNotFound { path: PathBuf },

    /// Two inputs would be mounted at the same place in the container.
    #[error("more than one input file is named '{name}'")]
    DuplicateInputName { name: String },

    /// The miner's image has not been built.
    #[error("image for tool is not installed: {image}")]
    NotInstalled { image: String },

    /// The container CLI could not be started.
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The miner exited unsuccessfully.
    #[error("tool failed (exit code {code:?}): {stderr}")]
    ToolFailed { code: Option<i32>, stderr: String },

    /// Resolving an input path failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the full mining pipeline.
#[derive(Debug, thiserror::Error)]
pub enum MineError {
    #[error(transparent)]
    Run(#[from] RunError),

    /// The tool's output was not a valid invariant report.
    #[error("invalid invariant report: {0}")]
    Report(#[from] CodecError),
}
