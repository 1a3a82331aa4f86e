//! Column layouts of fixed-format RIF records.
//!
//! A layout is read from one named section (a worksheet, or a CSV file) of a
//! tabular resource. Each data row describes one column of the record format.

pub mod parser;
pub mod workbook;

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::codegen::utils::{to_screaming_snake_case, to_snake_case};

pub use parser::{parse_layout, LayoutParser};
pub use workbook::{LayoutSource, Workbook};

/// Column type codes of the layout vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnType {
    Character,
    Numeric,
    Date,
}

impl ColumnType {
    /// Parse a type-code cell. Accepts the long codes and the `CHAR`/`NUM`
    /// abbreviations, ignoring case and surrounding whitespace.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "CHARACTER" | "CHAR" => Some(ColumnType::Character),
            "NUMERIC" | "NUM" => Some(ColumnType::Numeric),
            "DATE" => Some(ColumnType::Date),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ColumnType::Character => "CHARACTER",
            ColumnType::Numeric => "NUMERIC",
            ColumnType::Date => "DATE",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One row of a layout section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column identifier as written in the layout (e.g. `CLM_ID`)
    pub name: String,
    pub column_type: ColumnType,
    /// Character count, total digit precision, or date width depending on type
    pub length: u32,
    /// Fractional digits; only meaningful for NUMERIC columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    /// Whether the record format allows this column to be empty
    pub optional: bool,
    /// Explicit record field name; derived from `name` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// 1-based row of the section this column was read from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, column_type: ColumnType, length: u32) -> Self {
        Self {
            name: name.into(),
            column_type,
            length,
            scale: None,
            optional: false,
            field_name: None,
            label: None,
            row: None,
        }
    }

    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = Some(field_name.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    /// Row to report for this column, assuming one header row and no blank
    /// rows when it was not read from a section.
    pub fn source_row(&self, index: usize) -> usize {
        self.row.unwrap_or(index + 2)
    }

    /// Record field name: the explicit one if given, else `name` in snake_case.
    pub fn resolved_field_name(&self) -> String {
        match &self.field_name {
            Some(field_name) => to_snake_case(field_name),
            None => to_snake_case(&self.name),
        }
    }

    /// Symbolic identifier used for the column enumeration entry.
    pub fn symbol(&self) -> String {
        to_screaming_snake_case(&self.name)
    }

    /// True if `reference` names this column, either by column name or by
    /// field name.
    pub fn is_named(&self, reference: &str) -> bool {
        self.name == reference
            || self.field_name.as_deref() == Some(reference)
            || self.resolved_field_name() == to_snake_case(reference)
    }
}

/// The ordered columns of one parsed layout section.
///
/// Immutable once built; column order is the section's row order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutSchema {
    section: String,
    columns: IndexMap<String, ColumnDefinition>,
}

impl LayoutSchema {
    /// Build a schema, failing on duplicate column names or on two columns
    /// that derive the same field name or enumeration symbol.
    pub fn new(
        section: impl Into<String>,
        columns: Vec<ColumnDefinition>,
    ) -> crate::Result<Self> {
        let section = section.into();
        let mut by_name: IndexMap<String, ColumnDefinition> = IndexMap::with_capacity(columns.len());
        let mut field_names: IndexMap<String, String> = IndexMap::new();
        let mut symbols: IndexMap<String, String> = IndexMap::new();

        for column in columns {
            let row = column.source_row(by_name.len());
            if by_name.contains_key(&column.name) {
                return Err(crate::Error::MalformedSchema {
                    section,
                    row: Some(row),
                    message: format!("duplicate column name '{}'", column.name),
                });
            }
            if let Some(other) = field_names.insert(column.resolved_field_name(), column.name.clone()) {
                return Err(crate::Error::MalformedSchema {
                    section,
                    row: Some(row),
                    message: format!(
                        "column '{}' maps to field '{}' already used by column '{}'",
                        column.name,
                        column.resolved_field_name(),
                        other
                    ),
                });
            }
            if let Some(other) = symbols.insert(column.symbol(), column.name.clone()) {
                return Err(crate::Error::MalformedSchema {
                    section,
                    row: Some(row),
                    message: format!(
                        "column '{}' maps to symbol '{}' already used by column '{}'",
                        column.name,
                        column.symbol(),
                        other
                    ),
                });
            }
            by_name.insert(column.name.clone(), column);
        }

        Ok(Self {
            section,
            columns: by_name,
        })
    }

    /// Name of the section this layout was parsed from.
    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.values()
    }

    pub fn column(&self, index: usize) -> Option<&ColumnDefinition> {
        self.columns.get_index(index).map(|(_, column)| column)
    }

    /// Position of the column named by `reference` (column or field name).
    pub fn position(&self, reference: &str) -> Option<usize> {
        if let Some(index) = self.columns.get_index_of(reference) {
            return Some(index);
        }
        self.columns.values().position(|column| column.is_named(reference))
    }

    pub fn find(&self, reference: &str) -> Option<&ColumnDefinition> {
        self.position(reference).and_then(|index| self.column(index))
    }
}
