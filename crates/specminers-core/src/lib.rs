//! Reading and writing Daikon files.
//!
//! [`Declarations`] describe the program points of a program and the
//! variables observed at each. Trace files hold one [`TraceRecord`] per visit
//! to a program point, and invariant reports hold the text the mining tool
//! printed for each point. Declarations are parsed once and shared behind an
//! `Arc` by every reader and writer that resolves program points by name.

pub mod declarations;
pub mod directive;
pub mod error;
pub mod escape;
pub mod invariant;
pub mod lines;
pub mod ppt;
pub mod trace;
pub mod value;
pub mod vardecl;

// Re-export commonly used types
pub use declarations::Declarations;
pub use error::CodecError;
pub use invariant::{Invariant, InvariantReader, InvariantReport};
pub use lines::LineBuffer;
pub use ppt::{PptKind, ProgramPoint};
pub use trace::{PointRef, TraceReader, TraceRecord, TraceWriter};
pub use value::{RepType, Value};
pub use vardecl::VarDecl;
