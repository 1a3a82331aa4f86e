//! Language-neutral description of the generated record types.
//!
//! The generator produces these; emitters render them into concrete source.
//! Everything a downstream consumer needs to populate records column by
//! column (enumeration entries, field and accessor names, key shape) is
//! discoverable from here.

use serde::Serialize;

use crate::codegen::type_resolver::{AccessorType, ValueType};
use crate::layout::ColumnType;

/// The column enumeration of one layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumArtifact {
    pub name: String,
    /// Symbolic entries in layout column order
    pub entries: Vec<String>,
}

/// Persistence attributes of the column behind a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMeta {
    /// Column name as written in the layout
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
}

/// One field of a record type, derived from one layout column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: String,
    /// Enumeration entry of the column this field is read from
    pub column: String,
    /// 0-based position of the column in the layout
    pub column_index: usize,
    pub storage: ValueType,
    pub accessor: AccessorType,
    /// True for composite or single key columns
    pub key: bool,
    pub meta: ColumnMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl FieldSpec {
    pub fn is_optional(&self) -> bool {
        self.accessor.is_optional()
    }
}

/// A named part of a composite key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyPart {
    pub name: String,
    pub value: ValueType,
}

/// Composite key of a line record: (header id, line number).
///
/// Equality and hashing cover exactly these two parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeySpec {
    pub name: String,
    pub parent: KeyPart,
    pub line_number: KeyPart,
}

/// The line record's required reference to its owning header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentRef {
    pub field: String,
    pub header_type: String,
    /// Header field whose value identifies the owner
    pub header_id_field: String,
    pub value: ValueType,
}

/// The header's owned, ordered collection of line records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineCollection {
    pub field: String,
    pub line_type: String,
    /// Line field the collection is sorted by, ascending
    pub order_by: String,
    pub order_by_value: ValueType,
    /// Line field stamped with the header id when a line is added
    pub parent_field: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Header,
    Line,
}

/// A header or line record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordArtifact {
    pub name: String,
    pub kind: RecordKind,
    pub table: String,
    /// Fields in layout column order
    pub fields: Vec<FieldSpec>,
    /// Header records: the id field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_field: Option<String>,
    /// Line records: composite key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<KeySpec>,
    /// Line records: back-reference to the header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentRef>,
    /// Header records with lines: the owned line collection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<LineCollection>,
}

impl RecordArtifact {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Everything generated for one mapping spec, in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutArtifacts {
    pub namespace: String,
    pub section: String,
    pub column_enum: EnumArtifact,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<RecordArtifact>,
    pub header: RecordArtifact,
}

impl LayoutArtifacts {
    /// Records in emission order: line type first, then header type.
    pub fn records(&self) -> impl Iterator<Item = &RecordArtifact> {
        self.line.iter().chain(std::iter::once(&self.header))
    }
}
