//! Invariant reports: the text Daikon prints for each program point.
//!
//! A report is a sequence of blocks, each introduced by a delimiter line of
//! 75 `=` characters and the program point name, followed by one invariant
//! per line up to the next delimiter.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::declarations::Declarations;
use crate::error::CodecError;
use crate::lines::{LineBuffer, LineSource};

const DELIMITER_WIDTH: usize = 75;

/// Returns true if `line` is a block delimiter.
pub fn is_delimiter(line: &str) -> bool {
    line.len() == DELIMITER_WIDTH && line.bytes().all(|b| b == b'=')
}

/// One invariant, kept as the tool printed it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Invariant(String);

impl Invariant {
    pub fn new(text: impl Into<String>) -> Self {
        Invariant(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Invariants per program point, covering every declared point in
/// declaration order. Points the tool said nothing about map to an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct InvariantReport {
    points: IndexMap<String, Vec<Invariant>>,
}

impl InvariantReport {
    /// Invariants of one program point; `None` only for undeclared names.
    pub fn get(&self, name: &str) -> Option<&[Invariant]> {
        self.points.get(name).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &[Invariant])> {
        self.points
            .iter()
            .map(|(name, invariants)| (name.as_str(), invariants.as_slice()))
    }

    /// Number of program points covered.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Total number of invariants across all points.
    pub fn num_invariants(&self) -> usize {
        self.points.values().map(Vec::len).sum()
    }
}

/// Reads invariant reports against a set of declarations.
#[derive(Debug, Clone)]
pub struct InvariantReader {
    decls: Arc<Declarations>,
}

impl InvariantReader {
    pub fn new(decls: Arc<Declarations>) -> Self {
        InvariantReader { decls }
    }

    pub fn read_text(&self, text: &str) -> Result<InvariantReport, CodecError> {
        self.read_lines(&mut LineBuffer::from_text(text))
    }

    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<InvariantReport, CodecError> {
        let path = path.as_ref();
        tracing::debug!("reading invariants from file: {}", path.display());
        self.read_lines(&mut LineBuffer::open(path)?)
    }

    /// Reads blocks until the input is exhausted. Blank lines inside a block
    /// are not invariants.
    pub fn read_lines<I: LineSource>(
        &self,
        lines: &mut LineBuffer<I>,
    ) -> Result<InvariantReport, CodecError> {
        let mut points: IndexMap<String, Vec<Invariant>> = self
            .decls
            .names()
            .map(|name| (name.to_string(), Vec::new()))
            .collect();

        if let Some(first) = lines.peek()? {
            if !is_delimiter(first) {
                let actual = first.to_string();
                return Err(CodecError::ExpectedDelimiter { actual });
            }
        }

        while lines.pop()?.is_some() {
            let delimiter_line = lines.line_number();
            let name = match lines.pop()? {
                Some(name) if !name.is_empty() && !is_delimiter(&name) => name,
                _ => {
                    return Err(CodecError::TruncatedInvariantBlock {
                        line: delimiter_line,
                    })
                }
            };
            let invariants = points
                .get_mut(&name)
                .ok_or_else(|| CodecError::UnknownProgramPoint { name: name.clone() })?;

            let before = invariants.len();
            while let Some(line) = lines.peek()? {
                if is_delimiter(line) {
                    break;
                }
                if let Some(line) = lines.pop()? {
                    if !line.trim().is_empty() {
                        invariants.push(Invariant(line));
                    }
                }
            }
            tracing::debug!("read {} invariants for {}", invariants.len() - before, name);
        }

        let report = InvariantReport { points };
        tracing::debug!(
            "finished reading {} invariants for {} program points",
            report.num_invariants(),
            report.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECLS: &str = "\
ppt takeoff:::ENTER
ppt-type enter
ppt takeoff:::EXIT0
ppt-type subexit
ppt land:::ENTER
ppt-type enter
";

    fn reader() -> InvariantReader {
        InvariantReader::new(Arc::new(Declarations::parse(DECLS).unwrap()))
    }

    fn delimiter() -> String {
        "=".repeat(DELIMITER_WIDTH)
    }

    #[test]
    fn covers_every_declared_point() {
        let d = delimiter();
        let text = format!(
            "{d}\ntakeoff:::ENTER\naltitude > 0.0\narmed == true\n{d}\ntakeoff:::EXIT0\naltitude >= 10.0\n"
        );
        let report = reader().read_text(&text).unwrap();
        assert_eq!(report.len(), 3);
        assert_eq!(report.num_invariants(), 3);
        assert_eq!(
            report.get("takeoff:::ENTER").unwrap(),
            [Invariant::new("altitude > 0.0"), Invariant::new("armed == true")]
        );
        assert!(report.get("land:::ENTER").unwrap().is_empty());
        assert!(report.get("nowhere").is_none());

        let names: Vec<&str> = report.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["takeoff:::ENTER", "takeoff:::EXIT0", "land:::ENTER"]);
    }

    #[test]
    fn empty_input_yields_empty_lists() {
        let report = reader().read_text("").unwrap();
        assert_eq!(report.len(), 3);
        assert_eq!(report.num_invariants(), 0);
    }

    #[test]
    fn repeated_points_accumulate() {
        let d = delimiter();
        let text = format!("{d}\nland:::ENTER\na\n\n{d}\nland:::ENTER\nb\n");
        let report = reader().read_text(&text).unwrap();
        assert_eq!(
            report.get("land:::ENTER").unwrap(),
            [Invariant::new("a"), Invariant::new("b")]
        );
    }

    #[test]
    fn unknown_point_is_rejected() {
        let text = format!("{}\nhover:::ENTER\nx > 0\n", delimiter());
        let err = reader().read_text(&text).unwrap_err();
        assert!(matches!(err, CodecError::UnknownProgramPoint { ref name } if name == "hover:::ENTER"));
    }

    #[test]
    fn delimiter_without_name_is_truncated() {
        let d = delimiter();
        let text = format!("{d}\nland:::ENTER\na\n{d}\n");
        let err = reader().read_text(&text).unwrap_err();
        assert!(matches!(err, CodecError::TruncatedInvariantBlock { line: 4 }));
    }

    #[test]
    fn leading_text_is_rejected() {
        let err = reader().read_text("Daikon version 5.8\n").unwrap_err();
        assert!(matches!(err, CodecError::ExpectedDelimiter { .. }));
    }

    #[test]
    fn delimiter_width_is_exact() {
        assert!(is_delimiter(&delimiter()));
        assert!(!is_delimiter(&"=".repeat(74)));
        assert!(!is_delimiter(&"=".repeat(76)));
    }

    #[test]
    fn serializes_as_a_map() {
        let d = delimiter();
        let text = format!("{d}\nland:::ENTER\nmode == \"LAND\"\n");
        let report = reader().read_text(&text).unwrap();
        insta::assert_json_snapshot!(report, @r###"
        {
          "takeoff:::ENTER": [],
          "takeoff:::EXIT0": [],
          "land:::ENTER": [
            "mode == \"LAND\""
          ]
        }
        "###);
    }
}
