//! Mining pipeline: run the tool, then read its report.

use std::path::PathBuf;
use std::sync::Arc;

use specminers_core::{Declarations, InvariantReader, InvariantReport};

use crate::error::MineError;
use crate::tool::ToolRunner;

/// Runs `runner` over the declarations and trace files in `paths` and parses
/// its output against `decls`.
///
/// The caller is responsible for `paths` containing the declarations file
/// that `decls` was loaded from.
pub fn mine<R: ToolRunner>(
    runner: &R,
    decls: Arc<Declarations>,
    paths: &[PathBuf],
) -> Result<InvariantReport, MineError> {
    let output = runner.run(paths)?;
    let report = InvariantReader::new(decls).read_text(&output)?;
    tracing::info!(
        "mined {} invariants over {} program points",
        report.num_invariants(),
        report.len()
    );
    Ok(report)
}
