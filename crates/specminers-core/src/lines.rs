//! Single-lookahead line cursor shared by every reader in the codec.
//!
//! [`LineBuffer`] wraps a lazily produced sequence of lines (trailing newline
//! already stripped) and offers `peek`, `pop` and end-of-input detection. None
//! of the grammars need more than one line of lookahead.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::error::CodecError;

/// Any iterator of fallible lines can back a [`LineBuffer`].
pub trait LineSource: Iterator<Item = io::Result<String>> {}

impl<T: Iterator<Item = io::Result<String>>> LineSource for T {}

/// Lines of an in-memory text, owned so the buffer has no borrow on the input.
pub type TextLines = std::iter::Map<std::vec::IntoIter<String>, fn(String) -> io::Result<String>>;

/// Lines of an open file. The handle closes when the buffer is dropped.
pub type FileLines = io::Lines<BufReader<File>>;

/// A cursor over lines with one line of lookahead.
#[derive(Debug)]
pub struct LineBuffer<I> {
    source: I,
    lookahead: Option<String>,
    consumed: usize,
}

impl<I: LineSource> LineBuffer<I> {
    pub fn new(source: I) -> Self {
        LineBuffer {
            source,
            lookahead: None,
            consumed: 0,
        }
    }

    /// Pulls the next line into the lookahead slot. Returns `false` at end of input.
    fn fill(&mut self) -> Result<bool, CodecError> {
        if self.lookahead.is_some() {
            return Ok(true);
        }
        match self.source.next() {
            Some(line) => {
                self.lookahead = Some(line?);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Returns the next line without consuming it, or `None` at end of input.
    pub fn peek(&mut self) -> Result<Option<&str>, CodecError> {
        if !self.fill()? {
            return Ok(None);
        }
        Ok(self.lookahead.as_deref())
    }

    /// Consumes and returns the next line, or `None` at end of input.
    pub fn pop(&mut self) -> Result<Option<String>, CodecError> {
        if !self.fill()? {
            return Ok(None);
        }
        self.consumed += 1;
        Ok(self.lookahead.take())
    }

    /// Consumes a line the grammar requires. End of input here is an error,
    /// reported with `context` naming what was being read.
    pub fn expect(&mut self, context: impl FnOnce() -> String) -> Result<String, CodecError> {
        self.pop()?
            .ok_or_else(|| CodecError::UnexpectedEndOfInput { context: context() })
    }

    /// True iff [`peek`](Self::peek) would report end of input.
    pub fn is_empty(&mut self) -> Result<bool, CodecError> {
        Ok(!self.fill()?)
    }

    /// Number of lines consumed so far (1-based line number of the last `pop`).
    pub fn line_number(&self) -> usize {
        self.consumed
    }
}

impl LineBuffer<TextLines> {
    /// Buffers the lines of an in-memory text.
    pub fn from_text(text: &str) -> Self {
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        LineBuffer::new(lines.into_iter().map(Ok as fn(String) -> io::Result<String>))
    }
}

impl<R: BufRead> LineBuffer<io::Lines<R>> {
    pub fn from_reader(reader: R) -> Self {
        LineBuffer::new(reader.lines())
    }
}

impl LineBuffer<FileLines> {
    /// Opens `path` for buffered line reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CodecError> {
        let path = path.as_ref();
        tracing::debug!("opening {}", path.display());
        let file = File::open(path)?;
        Ok(LineBuffer::from_reader(BufReader::new(file)))
    }
}
