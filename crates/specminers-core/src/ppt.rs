//! Program points and the parser for one `ppt` block.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::directive::{required, DirectiveParser, Handler};
use crate::error::CodecError;
use crate::lines::{LineBuffer, LineSource};
use crate::vardecl::{VarDecl, VarDeclParser};

/// The kind of a program point (`ppt-type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PptKind {
    Enter,
    Exit,
    Class,
    Subexit,
    Object,
    Point,
}

impl PptKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PptKind::Enter => "enter",
            PptKind::Exit => "exit",
            PptKind::Class => "class",
            PptKind::Subexit => "subexit",
            PptKind::Object => "object",
            PptKind::Point => "point",
        }
    }
}

impl fmt::Display for PptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PptKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enter" => Ok(PptKind::Enter),
            "exit" => Ok(PptKind::Exit),
            "class" => Ok(PptKind::Class),
            "subexit" => Ok(PptKind::Subexit),
            "object" => Ok(PptKind::Object),
            "point" => Ok(PptKind::Point),
            _ => Err(()),
        }
    }
}

/// A program point: a named location and its variables in declared order.
///
/// The order of `variables` is normative: trace records must list values in
/// exactly this order.
#[derive(Debug, Clone, Serialize)]
pub struct ProgramPoint {
    name: String,
    kind: PptKind,
    variables: IndexMap<String, VarDecl>,
}

impl ProgramPoint {
    /// Builds a program point. Fails with [`CodecError::DuplicateVariable`] if
    /// two variables share a name.
    pub fn new(
        name: impl Into<String>,
        kind: PptKind,
        variables: impl IntoIterator<Item = VarDecl>,
    ) -> Result<Self, CodecError> {
        let name = name.into();
        let mut by_name = IndexMap::new();
        for var in variables {
            if by_name.contains_key(var.name()) {
                return Err(CodecError::DuplicateVariable {
                    ppt: name,
                    name: var.name().to_string(),
                });
            }
            by_name.insert(var.name().to_string(), var);
        }
        Ok(ProgramPoint {
            name,
            kind,
            variables: by_name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PptKind {
        self.kind
    }

    /// Looks up a variable by name.
    pub fn get(&self, name: &str) -> Option<&VarDecl> {
        self.variables.get(name)
    }

    /// Looks up a variable and its position in declared order.
    pub fn get_full(&self, name: &str) -> Option<(usize, &VarDecl)> {
        self.variables
            .get_full(name)
            .map(|(index, _, decl)| (index, decl))
    }

    /// Variables in declared order.
    pub fn variables(&self) -> impl ExactSizeIterator<Item = &VarDecl> {
        self.variables.values()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// Equality includes variable order, which `IndexMap` equality ignores.
impl PartialEq for ProgramPoint {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.kind == other.kind
            && self.variables.iter().eq(other.variables.iter())
    }
}

impl Eq for ProgramPoint {}

impl fmt::Display for ProgramPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ppt {}", self.name)?;
        writeln!(f, "ppt-type {}", self.kind)?;
        for var in self.variables.values() {
            write!(f, "{}", var)?;
        }
        Ok(())
    }
}

/// Parser state for one `ppt` block. Runs until the next `ppt ` line.
#[derive(Debug)]
pub struct ProgramPointParser {
    name: String,
    kind: Option<PptKind>,
    variables: Vec<VarDecl>,
}

impl ProgramPointParser {
    pub fn new(name: impl Into<String>) -> Self {
        ProgramPointParser {
            name: name.into(),
            kind: None,
            variables: Vec::new(),
        }
    }

    fn read_kind<I>(&mut self, rest: &str, _: &mut LineBuffer<I>) -> Result<(), CodecError> {
        let value = required("ppt-type", rest)?;
        let kind = value.parse().map_err(|_| CodecError::InvalidPptType {
            ppt: self.name.clone(),
            value: value.to_string(),
        })?;
        self.kind = Some(kind);
        Ok(())
    }

    fn read_variable<I: LineSource>(
        &mut self,
        rest: &str,
        lines: &mut LineBuffer<I>,
    ) -> Result<(), CodecError> {
        let name = required("variable", rest)?;
        let var = VarDeclParser::new(name).parse(lines)?;
        self.variables.push(var);
        Ok(())
    }
}

impl<I: LineSource> DirectiveParser<I> for ProgramPointParser {
    type Output = ProgramPoint;

    fn lookup(keyword: &str) -> Option<Handler<Self, I>> {
        match keyword {
            "ppt-type" => Some(Self::read_kind::<I>),
            "variable" => Some(Self::read_variable::<I>),
            _ => None,
        }
    }

    fn is_finished(&self, lines: &mut LineBuffer<I>) -> Result<bool, CodecError> {
        Ok(match lines.peek()? {
            Some(line) => line.starts_with("ppt "),
            None => true,
        })
    }

    fn finalize(self) -> Result<ProgramPoint, CodecError> {
        let kind = self
            .kind
            .ok_or_else(|| CodecError::MissingPptType {
                ppt: self.name.clone(),
            })?;
        tracing::trace!(
            "parsed program point {} with {} variables",
            self.name,
            self.variables.len()
        );
        ProgramPoint::new(self.name, kind, self.variables)
    }
}
