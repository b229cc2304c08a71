//! Trace files: streams of records, each a visit to a declared program point.

pub mod reader;
pub mod record;
pub mod writer;

pub use reader::{FileRecords, Records, TraceReader, NONCE_MARKER};
pub use record::{TraceRecord, TraceRecordVariable, MODIFIED, NONSENSICAL, UNMODIFIED};
pub use writer::{PointRef, TraceWriter};
