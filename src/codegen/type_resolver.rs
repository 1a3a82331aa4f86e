//! Column type resolution.
//!
//! Maps a [`ColumnDefinition`] to the value type stored for it and to the type
//! its accessors expose.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::layout::{ColumnDefinition, ColumnType};

/// Semantic value types a column can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueType {
    /// Exactly one character
    Char,
    /// Text of at most `max_length` characters
    Text { max_length: u32 },
    /// Calendar date, no time or zone
    Date,
    /// Arbitrary precision decimal
    Decimal { precision: u32, scale: u32 },
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Char => write!(f, "char"),
            ValueType::Text { max_length } => write!(f, "string({})", max_length),
            ValueType::Date => write!(f, "date"),
            ValueType::Decimal { precision, scale } => write!(f, "decimal({},{})", precision, scale),
        }
    }
}

/// Type exposed by a field's accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "presence", content = "value", rename_all = "snake_case")]
pub enum AccessorType {
    Required(ValueType),
    Optional(ValueType),
}

impl AccessorType {
    pub fn value_type(&self) -> ValueType {
        match self {
            AccessorType::Required(value) | AccessorType::Optional(value) => *value,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, AccessorType::Optional(_))
    }
}

impl fmt::Display for AccessorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessorType::Required(value) => write!(f, "{}", value),
            AccessorType::Optional(value) => write!(f, "optional<{}>", value),
        }
    }
}

/// Resolution of one column.
///
/// The storage slot of an optional column is nullable; the accessor wraps the
/// same value type exactly once, so an optional single character is
/// `optional<char>` rather than a doubly wrapped type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ResolvedType {
    pub storage: ValueType,
    pub nullable: bool,
}

impl ResolvedType {
    pub fn accessor(&self) -> AccessorType {
        if self.nullable {
            AccessorType::Optional(self.storage)
        } else {
            AccessorType::Required(self.storage)
        }
    }
}

/// Resolve the storage and accessor types of `column`.
///
/// Rules, first match wins:
/// 1. CHARACTER(1) → `char`, nullable when the column is optional
/// 2. CHARACTER(n > 1) → text
/// 3. DATE(8) → calendar date
/// 4. NUMERIC(p, s) → decimal(p, s); a missing scale is a malformed schema
/// 5. anything else is unsupported
pub fn resolve(column: &ColumnDefinition) -> Result<ResolvedType> {
    let storage = match column.column_type {
        ColumnType::Character if column.length == 1 => ValueType::Char,
        ColumnType::Character if column.length > 1 => ValueType::Text {
            max_length: column.length,
        },
        ColumnType::Date if column.length == 8 => ValueType::Date,
        ColumnType::Numeric => {
            let scale = column.scale.ok_or_else(|| Error::MalformedSchema {
                section: column.name.clone(),
                row: None,
                message: format!("NUMERIC column '{}' has no scale", column.name),
            })?;
            if scale > column.length {
                return Err(unsupported(column));
            }
            ValueType::Decimal {
                precision: column.length,
                scale,
            }
        }
        _ => return Err(unsupported(column)),
    };

    Ok(ResolvedType {
        storage,
        nullable: column.optional,
    })
}

fn unsupported(column: &ColumnDefinition) -> Error {
    Error::UnsupportedColumnType {
        column: column.name.clone(),
        column_type: column.column_type.to_string(),
        length: column.length,
        scale: column.scale,
        optional: column.optional,
    }
}
