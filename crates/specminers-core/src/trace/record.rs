//! One snapshot of a program point's variables.

use std::sync::Arc;

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

use crate::error::CodecError;
use crate::ppt::ProgramPoint;
use crate::value::Value;
use crate::vardecl::VarDecl;

/// Modified flag: the value did not change since the last visit.
pub const UNMODIFIED: u8 = 0;
/// Modified flag: the value changed since the last visit.
pub const MODIFIED: u8 = 1;
/// Modified flag: the value could not be observed.
pub const NONSENSICAL: u8 = 2;

/// A variable of a record: its declaration, decoded value and modified flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceRecordVariable<'a> {
    pub decl: &'a VarDecl,
    pub value: &'a Value,
    pub modified: u8,
}

impl<'a> TraceRecordVariable<'a> {
    pub fn name(&self) -> &'a str {
        self.decl.name()
    }
}

/// A recorded visit to a program point.
///
/// Holds exactly one value per declared variable, in the program point's
/// declared order.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceRecord {
    ppt: Arc<ProgramPoint>,
    nonce: Option<u64>,
    values: Vec<(Value, u8)>,
}

impl TraceRecord {
    /// Builds a record from values given in declared order.
    ///
    /// Callers outside the codec go through [`TraceRecord::from_named`] or the
    /// writer, which check the variable set.
    pub(crate) fn new(ppt: Arc<ProgramPoint>, nonce: Option<u64>, values: Vec<(Value, u8)>) -> Self {
        debug_assert_eq!(ppt.len(), values.len());
        TraceRecord { ppt, nonce, values }
    }

    /// Builds a record from values keyed by variable name. Every declared
    /// variable must be supplied exactly once and each value must fit its
    /// variable's representation type.
    pub fn from_named<K: AsRef<str>>(
        ppt: Arc<ProgramPoint>,
        nonce: Option<u64>,
        values: impl IntoIterator<Item = (K, Value)>,
        modified: u8,
    ) -> Result<Self, CodecError> {
        let mut supplied: Vec<(K, Value)> = values.into_iter().collect();
        let mut ordered = Vec::with_capacity(ppt.len());
        for decl in ppt.variables() {
            let pos = supplied
                .iter()
                .position(|(name, _)| name.as_ref() == decl.name())
                .ok_or_else(|| CodecError::MissingVariable {
                    ppt: ppt.name().to_string(),
                    name: decl.name().to_string(),
                })?;
            let (_, value) = supplied.swap_remove(pos);
            decl.encode(&value)?;
            ordered.push((value, modified));
        }
        if let Some((name, _)) = supplied.first() {
            let name = name.as_ref();
            let err = if ppt.get(name).is_some() {
                CodecError::DuplicateVariable {
                    ppt: ppt.name().to_string(),
                    name: name.to_string(),
                }
            } else {
                CodecError::UnexpectedVariable {
                    ppt: ppt.name().to_string(),
                    name: name.to_string(),
                }
            };
            return Err(err);
        }
        Ok(TraceRecord::new(ppt, nonce, ordered))
    }

    pub fn ppt(&self) -> &Arc<ProgramPoint> {
        &self.ppt
    }

    pub fn nonce(&self) -> Option<u64> {
        self.nonce
    }

    /// Looks up a variable of this record by name.
    pub fn get(&self, name: &str) -> Option<TraceRecordVariable<'_>> {
        let (index, decl) = self.ppt.get_full(name)?;
        let (value, modified) = &self.values[index];
        Some(TraceRecordVariable {
            decl,
            value,
            modified: *modified,
        })
    }

    /// Variables in declared order.
    pub fn variables(&self) -> impl ExactSizeIterator<Item = TraceRecordVariable<'_>> {
        self.ppt
            .variables()
            .zip(&self.values)
            .map(|(decl, (value, modified))| TraceRecordVariable {
                decl,
                value,
                modified: *modified,
            })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

struct Values<'a>(&'a TraceRecord);

impl Serialize for Values<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for var in self.0.variables() {
            map.serialize_entry(var.name(), var.value)?;
        }
        map.end()
    }
}

/// Serializes as `{ "ppt": ..., "nonce": ..., "values": { name: value } }`.
impl Serialize for TraceRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TraceRecord", 3)?;
        state.serialize_field("ppt", self.ppt.name())?;
        state.serialize_field("nonce", &self.nonce)?;
        state.serialize_field("values", &Values(self))?;
        state.end()
    }
}
