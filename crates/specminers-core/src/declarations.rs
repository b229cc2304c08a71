//! The declarations file: every program point of a program, in file order.
//!
//! A [`Declarations`] is parsed once and then shared read-only (behind an
//! `Arc`) by the trace reader, the trace writer and the invariant reader,
//! which all address program points by name.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::directive::{required, DirectiveParser, Handler};
use crate::error::CodecError;
use crate::lines::{LineBuffer, LineSource};
use crate::ppt::{ProgramPoint, ProgramPointParser};

/// Version written in the header of serialized declarations.
pub const DECL_VERSION: &str = "2.0";

/// The program points of a program, keyed by name, in file order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Declarations {
    points: IndexMap<String, Arc<ProgramPoint>>,
}

impl Declarations {
    /// Builds declarations from program points. Fails with
    /// [`CodecError::DuplicateProgramPoint`] if two points share a name.
    pub fn new(points: impl IntoIterator<Item = ProgramPoint>) -> Result<Self, CodecError> {
        let mut by_name = IndexMap::new();
        for ppt in points {
            if by_name.contains_key(ppt.name()) {
                return Err(CodecError::DuplicateProgramPoint {
                    name: ppt.name().to_string(),
                });
            }
            by_name.insert(ppt.name().to_string(), Arc::new(ppt));
        }
        Ok(Declarations { points: by_name })
    }

    /// Parses declarations from in-memory text.
    pub fn parse(text: &str) -> Result<Self, CodecError> {
        Self::from_lines(&mut LineBuffer::from_text(text))
    }

    /// Parses declarations from a line buffer, consuming it to the end.
    pub fn from_lines<I: LineSource>(lines: &mut LineBuffer<I>) -> Result<Self, CodecError> {
        DeclarationsParser::default().parse(lines)
    }

    /// Loads declarations from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CodecError> {
        let path = path.as_ref();
        tracing::trace!("loading declarations from file: {}", path.display());
        let decls = Self::from_lines(&mut LineBuffer::open(path)?)?;
        tracing::debug!(
            "loaded {} program points from {}",
            decls.len(),
            path.display()
        );
        Ok(decls)
    }

    /// Writes the serialized declarations to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CodecError> {
        fs::write(path, self.to_string())?;
        Ok(())
    }

    /// Looks up a program point by name.
    pub fn get(&self, name: &str) -> Option<&Arc<ProgramPoint>> {
        self.points.get(name)
    }

    /// Looks up a program point, failing with [`CodecError::UnknownProgramPoint`].
    pub fn resolve(&self, name: &str) -> Result<&Arc<ProgramPoint>, CodecError> {
        self.get(name).ok_or_else(|| CodecError::UnknownProgramPoint {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.points.contains_key(name)
    }

    /// Names of the program points in file order.
    pub fn names(&self) -> impl ExactSizeIterator<Item = &str> {
        self.points.keys().map(String::as_str)
    }

    /// Program points in file order.
    pub fn points(&self) -> impl ExactSizeIterator<Item = &Arc<ProgramPoint>> {
        self.points.values()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Equality is field-for-field and includes program point order.
impl PartialEq for Declarations {
    fn eq(&self, other: &Self) -> bool {
        self.points.iter().eq(other.points.iter())
    }
}

impl Eq for Declarations {}

impl fmt::Display for Declarations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "decl-version {}", DECL_VERSION)?;
        writeln!(f, "var-comparability none")?;
        for ppt in self.points.values() {
            write!(f, "{}", ppt)?;
        }
        Ok(())
    }
}

/// Parser state for a whole declarations file.
#[derive(Debug, Default)]
pub struct DeclarationsParser {
    points: Vec<ProgramPoint>,
    decl_version: Option<String>,
    input_language: Option<String>,
    var_comparability: Option<String>,
}

impl DeclarationsParser {
    fn read_decl_version<I>(&mut self, rest: &str, _: &mut LineBuffer<I>) -> Result<(), CodecError> {
        let version = required("decl-version", rest)?;
        tracing::trace!("using decl-version: {}", version);
        self.decl_version = Some(version.to_string());
        Ok(())
    }

    fn read_input_language<I>(
        &mut self,
        rest: &str,
        _: &mut LineBuffer<I>,
    ) -> Result<(), CodecError> {
        let language = required("input-language", rest)?;
        tracing::trace!("using input-language: {}", language);
        self.input_language = Some(language.to_string());
        Ok(())
    }

    fn read_var_comparability<I>(
        &mut self,
        rest: &str,
        _: &mut LineBuffer<I>,
    ) -> Result<(), CodecError> {
        let mode = required("var-comparability", rest)?;
        tracing::trace!("using var-comparability: {}", mode);
        self.var_comparability = Some(mode.to_string());
        Ok(())
    }

    fn read_ppt<I: LineSource>(
        &mut self,
        rest: &str,
        lines: &mut LineBuffer<I>,
    ) -> Result<(), CodecError> {
        let name = required("ppt", rest)?;
        let ppt = ProgramPointParser::new(name).parse(lines)?;
        self.points.push(ppt);
        Ok(())
    }
}

impl<I: LineSource> DirectiveParser<I> for DeclarationsParser {
    type Output = Declarations;

    fn lookup(keyword: &str) -> Option<Handler<Self, I>> {
        match keyword {
            "decl-version" => Some(Self::read_decl_version::<I>),
            "input-language" => Some(Self::read_input_language::<I>),
            "var-comparability" => Some(Self::read_var_comparability::<I>),
            "ppt" => Some(Self::read_ppt::<I>),
            _ => None,
        }
    }

    fn finalize(self) -> Result<Declarations, CodecError> {
        tracing::trace!(
            "finished declarations (decl-version {:?}, input-language {:?}, var-comparability {:?})",
            self.decl_version,
            self.input_language,
            self.var_comparability
        );
        Declarations::new(self.points)
    }
}
