//! Variable declarations and the parser for one `variable` block.
//!
//! A block looks like:
//!
//! ```text
//! variable latitude
//!   var-kind variable
//!   dec-type float
//!   rep-type float
//!   comparability 1
//! ```
//!
//! Every line after the `variable` header is indented by two spaces; the
//! block ends at the first line without that indentation.

use std::fmt;

use serde::Serialize;

use crate::directive::{arguments, required, DirectiveParser, Handler};
use crate::error::CodecError;
use crate::escape::{escape, unescape};
use crate::lines::{LineBuffer, LineSource};
use crate::value::{RepType, Value};

const INDENT: &str = "  ";

/// One declared variable of a program point. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VarDecl {
    name: String,
    dec_type: String,
    /// The `rep-type` text exactly as declared.
    rep_type: String,
    #[serde(skip)]
    rep: RepType,
    #[serde(skip_serializing_if = "Option::is_none")]
    comparability: Option<i64>,
    /// Constant value, already escaped for the declarations file.
    #[serde(skip_serializing_if = "Option::is_none")]
    constant: Option<String>,
}

impl VarDecl {
    /// Creates a declaration. Fails with [`CodecError::InvalidRepType`] if
    /// `rep_type` is not a supported representation.
    pub fn new(
        name: impl Into<String>,
        dec_type: impl Into<String>,
        rep_type: impl Into<String>,
    ) -> Result<Self, CodecError> {
        let name = name.into();
        let rep_type = rep_type.into();
        let rep = rep_type
            .parse::<RepType>()
            .map_err(|_| CodecError::InvalidRepType {
                variable: name.clone(),
                value: rep_type.clone(),
            })?;
        Ok(VarDecl {
            name,
            dec_type: dec_type.into(),
            rep_type,
            rep,
            comparability: None,
            constant: None,
        })
    }

    pub fn with_comparability(mut self, comparability: i64) -> Self {
        self.comparability = Some(comparability);
        self
    }

    /// Sets the constant from text that is already escaped. The text must
    /// fit on the `constant` line.
    pub fn with_constant(mut self, escaped: impl Into<String>) -> Result<Self, CodecError> {
        let escaped = escaped.into();
        if has_line_break(&escaped) {
            return Err(CodecError::LineBreakInValue {
                variable: self.name,
            });
        }
        self.constant = Some(escaped);
        Ok(self)
    }

    /// Sets the constant from a value, escaping it.
    pub fn with_constant_value(mut self, value: &Value) -> Self {
        self.constant = Some(escape(value));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dec_type(&self) -> &str {
        &self.dec_type
    }

    /// The `rep-type` spelling as declared.
    pub fn rep_type(&self) -> &str {
        &self.rep_type
    }

    /// The representation type governing value decoding.
    pub fn rep(&self) -> RepType {
        self.rep
    }

    pub fn comparability(&self) -> Option<i64> {
        self.comparability
    }

    /// The constant in its escaped, on-disk form.
    pub fn constant(&self) -> Option<&str> {
        self.constant.as_deref()
    }

    /// Decodes the constant according to the representation type.
    pub fn constant_value(&self) -> Result<Option<Value>, CodecError> {
        let Some(text) = self.constant.as_deref() else {
            return Ok(None);
        };
        let decoded = match self.rep {
            RepType::String => unescape(text).map(Value::String),
            rep => rep.decode(text),
        };
        decoded.map(Some).ok_or_else(|| CodecError::ValueDecodeError {
            variable: self.name.clone(),
            raw: text.to_string(),
            expected: self.rep,
        })
    }

    /// Decodes one trace value line for this variable.
    pub fn decode(&self, raw: &str) -> Result<Value, CodecError> {
        self.rep
            .decode(raw)
            .ok_or_else(|| CodecError::ValueDecodeError {
                variable: self.name.clone(),
                raw: raw.to_string(),
                expected: self.rep,
            })
    }

    /// Encodes a value for a trace value line, checking it fits the rep type
    /// and stays on one line.
    pub fn encode(&self, value: &Value) -> Result<String, CodecError> {
        if !self.rep.accepts(value) {
            return Err(CodecError::ValueTypeMismatch {
                variable: self.name.clone(),
                expected: self.rep,
                actual: value.kind(),
            });
        }
        let text = value.encode();
        if has_line_break(&text) {
            return Err(CodecError::LineBreakInValue {
                variable: self.name.clone(),
            });
        }
        Ok(text)
    }
}

fn has_line_break(text: &str) -> bool {
    text.contains(['\n', '\r'])
}

impl fmt::Display for VarDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "variable {}", self.name)?;
        writeln!(f, "{INDENT}var-kind variable")?;
        writeln!(f, "{INDENT}dec-type {}", self.dec_type)?;
        writeln!(f, "{INDENT}rep-type {}", self.rep_type)?;
        if let Some(comparability) = self.comparability {
            writeln!(f, "{INDENT}comparability {}", comparability)?;
        }
        if let Some(constant) = &self.constant {
            writeln!(f, "{INDENT}constant {}", constant)?;
        }
        Ok(())
    }
}

/// Parser state for one `variable` block.
#[derive(Debug)]
pub struct VarDeclParser {
    name: String,
    dec_type: Option<String>,
    rep_type: Option<String>,
    comparability: Option<i64>,
    constant: Option<String>,
}

impl VarDeclParser {
    pub fn new(name: impl Into<String>) -> Self {
        VarDeclParser {
            name: name.into(),
            dec_type: None,
            rep_type: None,
            comparability: None,
            constant: None,
        }
    }

    fn owner(&self) -> String {
        format!("variable '{}'", self.name)
    }

    fn read_var_kind<I>(&mut self, rest: &str, _: &mut LineBuffer<I>) -> Result<(), CodecError> {
        let kind = required("var-kind", rest)?;
        tracing::trace!("variable {} has var-kind {}", self.name, kind);
        Ok(())
    }

    fn read_dec_type<I>(&mut self, rest: &str, _: &mut LineBuffer<I>) -> Result<(), CodecError> {
        self.dec_type = Some(required("dec-type", rest)?.to_string());
        Ok(())
    }

    fn read_rep_type<I>(&mut self, rest: &str, _: &mut LineBuffer<I>) -> Result<(), CodecError> {
        self.rep_type = Some(required("rep-type", rest)?.to_string());
        Ok(())
    }

    fn read_comparability<I>(
        &mut self,
        rest: &str,
        _: &mut LineBuffer<I>,
    ) -> Result<(), CodecError> {
        let text = required("comparability", rest)?;
        let comparability = text
            .trim()
            .parse()
            .map_err(|_| CodecError::InvalidComparability {
                variable: self.name.clone(),
                value: text.to_string(),
            })?;
        self.comparability = Some(comparability);
        Ok(())
    }

    fn read_constant<I>(&mut self, rest: &str, _: &mut LineBuffer<I>) -> Result<(), CodecError> {
        self.constant = Some(required("constant", rest)?.to_string());
        Ok(())
    }

    fn read_flags<I>(&mut self, rest: &str, _: &mut LineBuffer<I>) -> Result<(), CodecError> {
        let flags: Vec<&str> = arguments(rest).collect();
        tracing::warn!("ignoring flags of variable {}: {:?}", self.name, flags);
        Ok(())
    }
}

impl<I: LineSource> DirectiveParser<I> for VarDeclParser {
    type Output = VarDecl;

    fn lookup(keyword: &str) -> Option<Handler<Self, I>> {
        match keyword {
            "var-kind" => Some(Self::read_var_kind::<I>),
            "dec-type" => Some(Self::read_dec_type::<I>),
            "rep-type" => Some(Self::read_rep_type::<I>),
            "comparability" => Some(Self::read_comparability::<I>),
            "constant" => Some(Self::read_constant::<I>),
            "flags" => Some(Self::read_flags::<I>),
            _ => None,
        }
    }

    fn is_finished(&self, lines: &mut LineBuffer<I>) -> Result<bool, CodecError> {
        Ok(!matches!(lines.peek()?, Some(line) if line.starts_with(INDENT)))
    }

    fn strip(line: &str) -> &str {
        line.strip_prefix(INDENT).unwrap_or(line)
    }

    fn finalize(self) -> Result<VarDecl, CodecError> {
        let owner = self.owner();
        let dec_type = self.dec_type.ok_or_else(|| CodecError::MissingField {
            owner: owner.clone(),
            field: "dec-type",
        })?;
        let rep_type = self.rep_type.ok_or(CodecError::MissingField {
            owner,
            field: "rep-type",
        })?;
        let mut decl = VarDecl::new(self.name, dec_type, rep_type)?;
        decl.comparability = self.comparability;
        decl.constant = self.constant;
        Ok(decl)
    }
}
