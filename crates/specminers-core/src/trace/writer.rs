//! Serialization of trace records.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use crate::declarations::Declarations;
use crate::error::CodecError;
use crate::ppt::ProgramPoint;
use crate::trace::reader::NONCE_MARKER;
use crate::trace::record::{TraceRecord, UNMODIFIED};
use crate::value::Value;

/// Names the program point a record is written for.
#[derive(Debug, Clone, Copy)]
pub enum PointRef<'a> {
    Name(&'a str),
    Point(&'a ProgramPoint),
}

impl<'a> PointRef<'a> {
    pub fn name(self) -> &'a str {
        match self {
            PointRef::Name(name) => name,
            PointRef::Point(ppt) => ppt.name(),
        }
    }
}

impl<'a> From<&'a str> for PointRef<'a> {
    fn from(name: &'a str) -> Self {
        PointRef::Name(name)
    }
}

impl<'a> From<&'a String> for PointRef<'a> {
    fn from(name: &'a String) -> Self {
        PointRef::Name(name)
    }
}

impl<'a> From<&'a ProgramPoint> for PointRef<'a> {
    fn from(ppt: &'a ProgramPoint) -> Self {
        PointRef::Point(ppt)
    }
}

impl<'a> From<&'a Arc<ProgramPoint>> for PointRef<'a> {
    fn from(ppt: &'a Arc<ProgramPoint>) -> Self {
        PointRef::Point(ppt)
    }
}

/// Writes trace records to a sink, numbering each program point's visits.
///
/// Nonces start at 1 and advance independently per program point. A point
/// given by value is looked up by name in the writer's declarations.
pub struct TraceWriter<W: Write> {
    decls: Arc<Declarations>,
    output: W,
    nonces: HashMap<String, u64>,
    written: usize,
}

impl TraceWriter<BufWriter<File>> {
    /// Creates (or truncates) a trace file.
    pub fn create(decls: Arc<Declarations>, path: impl AsRef<Path>) -> Result<Self, CodecError> {
        let path = path.as_ref();
        tracing::debug!("writing trace records to {}", path.display());
        let file = File::create(path)?;
        Ok(TraceWriter::new(decls, BufWriter::new(file)))
    }
}

impl<W: Write> TraceWriter<W> {
    pub fn new(decls: Arc<Declarations>, output: W) -> Self {
        TraceWriter {
            decls,
            output,
            nonces: HashMap::new(),
            written: 0,
        }
    }

    pub fn declarations(&self) -> &Arc<Declarations> {
        &self.decls
    }

    /// Nonce the next record for `name` will receive.
    pub fn next_nonce(&self, name: &str) -> u64 {
        self.nonces.get(name).copied().unwrap_or(1)
    }

    pub fn records_written(&self) -> usize {
        self.written
    }

    /// Writes one visit to `point` with all variables marked unmodified, and
    /// returns the nonce it was given.
    ///
    /// `values` must name every declared variable of the point exactly once,
    /// in any order. Nothing is written and the nonce does not advance if the
    /// values are rejected.
    pub fn write<'p, K: AsRef<str>>(
        &mut self,
        point: impl Into<PointRef<'p>>,
        values: impl IntoIterator<Item = (K, Value)>,
    ) -> Result<u64, CodecError> {
        let name = point.into().name();
        let ppt = Arc::clone(self.decls.resolve(name)?);
        let nonce = self.next_nonce(name);
        let record = TraceRecord::from_named(ppt, Some(nonce), values, UNMODIFIED)?;
        self.emit(&record)?;
        self.nonces.insert(name.to_string(), nonce + 1);
        Ok(nonce)
    }

    /// Writes an existing record as is, keeping its nonce and modified flags.
    /// The writer's own nonce counters are not touched.
    pub fn add(&mut self, record: &TraceRecord) -> Result<(), CodecError> {
        self.decls.resolve(record.ppt().name())?;
        self.emit(record)
    }

    fn emit(&mut self, record: &TraceRecord) -> Result<(), CodecError> {
        let out = &mut self.output;
        writeln!(out)?;
        writeln!(out, "{}", record.ppt().name())?;
        if let Some(nonce) = record.nonce() {
            writeln!(out, "{}", NONCE_MARKER)?;
            writeln!(out, "{}", nonce)?;
        }
        for var in record.variables() {
            writeln!(out, "{}", var.name())?;
            writeln!(out, "{}", var.value.encode())?;
            writeln!(out, "{}", var.modified)?;
        }
        self.written += 1;
        Ok(())
    }

    /// Flushes the sink and hands it back.
    pub fn finish(mut self) -> Result<W, CodecError> {
        self.output.flush()?;
        tracing::debug!("finished writing {} trace records", self.written);
        Ok(self.output)
    }
}
