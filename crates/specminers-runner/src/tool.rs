//! The capability the pipeline needs from an invariant miner.

use std::path::PathBuf;

use crate::error::{InstallError, RunError};

/// An installable external miner that turns declarations and trace files into
/// the text of an invariant report.
pub trait ToolRunner {
    /// Whether the tool is ready to run.
    fn is_installed(&self) -> bool;

    /// Installs the tool. Does nothing if it is installed and `force` is false.
    fn install(&self, force: bool) -> Result<(), InstallError>;

    /// Runs the tool over the given files and returns its raw output.
    fn run(&self, paths: &[PathBuf]) -> Result<String, RunError>;
}

impl<T: ToolRunner + ?Sized> ToolRunner for &T {
    fn is_installed(&self) -> bool {
        (**self).is_installed()
    }

    fn install(&self, force: bool) -> Result<(), InstallError> {
        (**self).install(force)
    }

    fn run(&self, paths: &[PathBuf]) -> Result<String, RunError> {
        (**self).run(paths)
    }
}
