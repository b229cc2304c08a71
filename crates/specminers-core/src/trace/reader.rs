//! Lazy reading of trace records.
//!
//! A record is a blank line, the program point name, an optional
//! `this_invocation_nonce` line followed by the nonce, and then three lines
//! (name, value, modified flag) for every declared variable of the point, in
//! declared order.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::declarations::Declarations;
use crate::error::CodecError;
use crate::lines::{FileLines, LineBuffer, LineSource, TextLines};
use crate::trace::record::TraceRecord;

/// Line announcing that the next line holds the record's nonce.
pub const NONCE_MARKER: &str = "this_invocation_nonce";

/// Reads trace records against a shared set of declarations.
#[derive(Debug, Clone)]
pub struct TraceReader {
    decls: Arc<Declarations>,
}

impl TraceReader {
    pub fn new(decls: Arc<Declarations>) -> Self {
        TraceReader { decls }
    }

    pub fn declarations(&self) -> &Arc<Declarations> {
        &self.decls
    }

    /// Reads the next record from `lines`.
    ///
    /// Returns `Ok(None)` when the input ends between records. Running out of
    /// input inside a record is an error.
    pub fn read_record<I: LineSource>(
        &self,
        lines: &mut LineBuffer<I>,
    ) -> Result<Option<TraceRecord>, CodecError> {
        let mut separated = false;
        loop {
            match lines.peek()?.map(str::is_empty) {
                None => return Ok(None),
                Some(true) => {
                    lines.pop()?;
                    separated = true;
                }
                Some(false) => break,
            }
        }
        let name = lines.expect(|| "program point name".to_string())?;
        if !separated {
            return Err(CodecError::ExpectedBlankLine { actual: name });
        }
        let ppt = Arc::clone(self.decls.resolve(&name)?);

        let nonce = if lines.peek()? == Some(NONCE_MARKER) {
            lines.pop()?;
            let raw = lines.expect(|| format!("nonce of record for '{}'", name))?;
            let nonce = raw.trim().parse().map_err(|_| CodecError::InvalidNonce {
                ppt: name.clone(),
                raw,
            })?;
            Some(nonce)
        } else {
            None
        };

        let mut values = Vec::with_capacity(ppt.len());
        for decl in ppt.variables() {
            let context = || format!("variable '{}' of record for '{}'", decl.name(), name);
            let actual = lines.expect(context)?;
            if actual != decl.name() {
                return Err(CodecError::VariableOrderMismatch {
                    ppt: name.clone(),
                    expected: decl.name().to_string(),
                    actual,
                });
            }
            let raw = lines.expect(context)?;
            let value = decl.decode(&raw)?;
            let flag = lines.expect(context)?;
            let modified = flag
                .trim()
                .parse()
                .map_err(|_| CodecError::InvalidModifiedFlag {
                    variable: decl.name().to_string(),
                    raw: flag,
                })?;
            values.push((value, modified));
        }
        Ok(Some(TraceRecord::new(ppt, nonce, values)))
    }

    /// Iterates over the records of a line buffer.
    pub fn records<I: LineSource>(&self, lines: LineBuffer<I>) -> Records<I> {
        Records {
            reader: self.clone(),
            lines,
            failed: false,
        }
    }

    /// Iterates over the records of an in-memory trace.
    pub fn read_text(&self, text: &str) -> Records<TextLines> {
        self.records(LineBuffer::from_text(text))
    }

    /// Opens one trace file. The file is closed when the iterator is dropped.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<Records<FileLines>, CodecError> {
        let path = path.as_ref();
        tracing::debug!("reading trace records from {}", path.display());
        Ok(self.records(LineBuffer::open(path)?))
    }

    /// Iterates over the records of several files, in order. Each file is
    /// opened only when reached and closed once exhausted.
    pub fn read<P: AsRef<Path>>(&self, paths: impl IntoIterator<Item = P>) -> FileRecords {
        let pending: Vec<PathBuf> = paths
            .into_iter()
            .map(|p| p.as_ref().to_path_buf())
            .collect();
        FileRecords {
            reader: self.clone(),
            pending: pending.into_iter(),
            current: None,
            failed: false,
        }
    }
}

/// Lazy record stream over one line buffer. Stops after the first error, so
/// a partially read record is never yielded.
#[derive(Debug)]
pub struct Records<I> {
    reader: TraceReader,
    lines: LineBuffer<I>,
    failed: bool,
}

impl<I: LineSource> Iterator for Records<I> {
    type Item = Result<TraceRecord, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.reader.read_record(&mut self.lines) {
            Ok(record) => record.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// Lazy concatenation of the records of several trace files.
#[derive(Debug)]
pub struct FileRecords {
    reader: TraceReader,
    pending: std::vec::IntoIter<PathBuf>,
    current: Option<(PathBuf, Records<FileLines>)>,
    failed: bool,
}

impl Iterator for FileRecords {
    type Item = Result<TraceRecord, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.failed {
                return None;
            }
            if let Some((path, records)) = &mut self.current {
                match records.next() {
                    Some(Ok(record)) => return Some(Ok(record)),
                    Some(Err(err)) => {
                        self.failed = true;
                        self.current = None;
                        return Some(Err(err));
                    }
                    None => {
                        tracing::debug!("finished reading {}", path.display());
                        self.current = None;
                    }
                }
            }
            let path = self.pending.next()?;
            match self.reader.read_file(&path) {
                Ok(records) => self.current = Some((path, records)),
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            }
        }
    }
}
