//! Symbol kinds.
//!
//! Kinds follow the LSP numbering (1..=26). Filters accept only those values,
//! while symbols keep whatever number their server reported.

use crate::error::{SymbolError, SymbolResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of LSP symbol kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum SymbolKind {
    File = 1,
    Module = 2,
    Namespace = 3,
    Package = 4,
    Class = 5,
    Method = 6,
    Property = 7,
    Field = 8,
    Constructor = 9,
    Enum = 10,
    Interface = 11,
    Function = 12,
    Variable = 13,
    Constant = 14,
    String = 15,
    Number = 16,
    Boolean = 17,
    Array = 18,
    Object = 19,
    Key = 20,
    Null = 21,
    EnumMember = 22,
    Struct = 23,
    Event = 24,
    Operator = 25,
    TypeParameter = 26,
}

impl SymbolKind {
    /// All kinds, in numeric order.
    pub const ALL: [SymbolKind; 26] = [
        SymbolKind::File,
        SymbolKind::Module,
        SymbolKind::Namespace,
        SymbolKind::Package,
        SymbolKind::Class,
        SymbolKind::Method,
        SymbolKind::Property,
        SymbolKind::Field,
        SymbolKind::Constructor,
        SymbolKind::Enum,
        SymbolKind::Interface,
        SymbolKind::Function,
        SymbolKind::Variable,
        SymbolKind::Constant,
        SymbolKind::String,
        SymbolKind::Number,
        SymbolKind::Boolean,
        SymbolKind::Array,
        SymbolKind::Object,
        SymbolKind::Key,
        SymbolKind::Null,
        SymbolKind::EnumMember,
        SymbolKind::Struct,
        SymbolKind::Event,
        SymbolKind::Operator,
        SymbolKind::TypeParameter,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }

    /// Human-readable name used in serialized output.
    pub fn label(self) -> &'static str {
        match self {
            SymbolKind::File => "File",
            SymbolKind::Module => "Module",
            SymbolKind::Namespace => "Namespace",
            SymbolKind::Package => "Package",
            SymbolKind::Class => "Class",
            SymbolKind::Method => "Method",
            SymbolKind::Property => "Property",
            SymbolKind::Field => "Field",
            SymbolKind::Constructor => "Constructor",
            SymbolKind::Enum => "Enum",
            SymbolKind::Interface => "Interface",
            SymbolKind::Function => "Function",
            SymbolKind::Variable => "Variable",
            SymbolKind::Constant => "Constant",
            SymbolKind::String => "String",
            SymbolKind::Number => "Number",
            SymbolKind::Boolean => "Boolean",
            SymbolKind::Array => "Array",
            SymbolKind::Object => "Object",
            SymbolKind::Key => "Key",
            SymbolKind::Null => "Null",
            SymbolKind::EnumMember => "EnumMember",
            SymbolKind::Struct => "Struct",
            SymbolKind::Event => "Event",
            SymbolKind::Operator => "Operator",
            SymbolKind::TypeParameter => "TypeParameter",
        }
    }

    /// Look up a kind by its numeric value.
    pub fn from_value(value: i64) -> SymbolResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| i64::from(k.value()) == value)
            .ok_or_else(|| {
                SymbolError::invalid_argument(format!(
                    "Invalid symbol kind {value}; valid kinds are integers from 1 to 26"
                ))
            })
    }

    /// Parse a kind filter list. An empty list means "no filter".
    pub fn parse_list(values: &[i64]) -> SymbolResult<Option<Vec<Self>>> {
        if values.is_empty() {
            return Ok(None);
        }
        values
            .iter()
            .map(|v| Self::from_value(*v))
            .collect::<SymbolResult<Vec<_>>>()
            .map(Some)
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A kind number as reported by a language server.
///
/// Usually one of [`SymbolKind`], but servers are free to send values outside
/// the known range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawKind(pub i64);

impl RawKind {
    /// The known kind, if the value is in range.
    pub fn known(self) -> Option<SymbolKind> {
        SymbolKind::from_value(self.0).ok()
    }

    /// The kind's label, or the bare number for unknown values.
    pub fn label(self) -> String {
        match self.known() {
            Some(kind) => kind.label().to_string(),
            None => self.0.to_string(),
        }
    }
}

impl From<SymbolKind> for RawKind {
    fn from(kind: SymbolKind) -> Self {
        RawKind(i64::from(kind.value()))
    }
}

impl From<lsp_types::SymbolKind> for RawKind {
    fn from(kind: lsp_types::SymbolKind) -> Self {
        // lsp-types keeps the number private; it serializes transparently.
        let value = serde_json::to_value(kind)
            .ok()
            .and_then(|v| v.as_i64())
            .unwrap_or_default();
        RawKind(value)
    }
}
