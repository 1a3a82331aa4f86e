//! Generation directives for one layout.

use serde::{Deserialize, Serialize};

use crate::codegen::utils::{is_type_name, to_snake_case};
use crate::error::{Error, Result};
use crate::layout::LayoutSchema;

/// Default line-number field of line records.
pub const DEFAULT_LINE_NUMBER_FIELD: &str = "number";

/// Default name of the line record's back-reference to its header.
pub const DEFAULT_PARENT_FIELD: &str = "parent_claim";

/// Header field names taken by the line collection and its accessors.
pub const HEADER_RESERVED: &[&str] = &["lines", "add_line", "remove_line", "clear_lines"];

/// Line field names taken by the composite key accessor.
pub const LINE_RESERVED: &[&str] = &["key"];

/// Where the line scope begins: a column reference or a 0-based index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    Index(usize),
    Name(String),
}

/// Line record directives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSpec {
    pub type_name: String,
    pub table_name: String,
    /// Column holding the line number; part of the composite key
    pub line_number_column: String,
    /// First column of the line scope; the line number column when `None`
    pub first_line_column: Option<ColumnRef>,
    /// Field of the line record referring back to its header
    pub parent_field: String,
}

/// Directives pairing one layout with the record types generated from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingSpec {
    pub namespace: String,
    /// Section of the layout resource to read
    pub section: String,
    pub header_type: String,
    pub header_table: String,
    /// Column identifying a header record
    pub header_id_column: String,
    pub lines: Option<LineSpec>,
}

impl MappingSpec {
    pub fn new(namespace: impl Into<String>, section: impl Into<String>) -> Self {
        let section = section.into();
        Self {
            namespace: namespace.into(),
            header_type: section.clone(),
            header_table: section.clone(),
            section,
            header_id_column: String::new(),
            lines: None,
        }
    }

    pub fn with_header_type(mut self, header_type: impl Into<String>) -> Self {
        self.header_type = header_type.into();
        self
    }

    pub fn with_header_table(mut self, header_table: impl Into<String>) -> Self {
        self.header_table = header_table.into();
        self
    }

    pub fn with_header_id(mut self, column: impl Into<String>) -> Self {
        self.header_id_column = column.into();
        self
    }

    /// Enable line records with the default line type name
    /// (`<HeaderType>Line`), line number field and parent field.
    pub fn with_lines(mut self, line_table: impl Into<String>) -> Self {
        self.lines = Some(LineSpec {
            type_name: format!("{}Line", self.header_type),
            table_name: line_table.into(),
            line_number_column: DEFAULT_LINE_NUMBER_FIELD.to_string(),
            first_line_column: None,
            parent_field: DEFAULT_PARENT_FIELD.to_string(),
        });
        self
    }

    pub fn with_line_type(mut self, type_name: impl Into<String>) -> Self {
        if let Some(lines) = self.lines.as_mut() {
            lines.type_name = type_name.into();
        }
        self
    }

    pub fn with_line_number(mut self, column: impl Into<String>) -> Self {
        if let Some(lines) = self.lines.as_mut() {
            lines.line_number_column = column.into();
        }
        self
    }

    pub fn with_first_line_column(mut self, first: ColumnRef) -> Self {
        if let Some(lines) = self.lines.as_mut() {
            lines.first_line_column = Some(first);
        }
        self
    }

    pub fn with_parent_field(mut self, field: impl Into<String>) -> Self {
        if let Some(lines) = self.lines.as_mut() {
            lines.parent_field = field.into();
        }
        self
    }

    pub fn has_lines(&self) -> bool {
        self.lines.is_some()
    }

    /// Name of the generated column enumeration.
    pub fn column_enum(&self) -> String {
        format!("{}Column", self.header_type)
    }

    /// Name of the composite key type of line records.
    pub fn line_id_type(&self) -> Option<String> {
        self.lines.as_ref().map(|lines| format!("{}Id", lines.type_name))
    }

    /// Check these directives against `schema` and compute the column scopes.
    ///
    /// The boundary is exclusive on the header side: header fields are the
    /// columns before it, line fields the columns at or after it.
    pub fn validate(&self, schema: &LayoutSchema) -> Result<SpecLayout> {
        let invalid = |message: String| Error::InvalidMappingSpec {
            spec: self.header_type.clone(),
            message,
        };

        for (label, name) in [("header type", &self.header_type), ("header table", &self.header_table)] {
            if name.trim().is_empty() {
                return Err(invalid(format!("{} is empty", label)));
            }
        }
        if !is_type_name(&self.header_type) {
            return Err(invalid(format!("'{}' is not a valid type name", self.header_type)));
        }

        let header_id = schema
            .position(&self.header_id_column)
            .ok_or_else(|| invalid(format!("header id column '{}' is not in the layout", self.header_id_column)))?;
        if schema.column(header_id).is_some_and(|column| column.optional) {
            return Err(invalid(format!("header id column '{}' is optional", self.header_id_column)));
        }

        if let Some(column) = schema.columns().find(|column| column.resolved_field_name() == "new") {
            return Err(invalid(format!(
                "column '{}' uses the reserved field name 'new'",
                column.name
            )));
        }

        let check_setters = |scope: &str, fields: Vec<String>| match setter_clash(&fields) {
            Some(field) => Err(invalid(format!(
                "{} field '{}' collides with the setter of '{}'",
                scope,
                field,
                &field["set_".len()..]
            ))),
            None => Ok(()),
        };

        let Some(lines) = &self.lines else {
            check_setters("header", schema.columns().map(|column| column.resolved_field_name()).collect())?;
            return Ok(SpecLayout {
                header_id,
                line_number: None,
                boundary: schema.len(),
            });
        };

        if lines.table_name.trim().is_empty() {
            return Err(invalid("line table is empty".to_string()));
        }
        if !is_type_name(&lines.type_name) {
            return Err(invalid(format!("'{}' is not a valid type name", lines.type_name)));
        }
        if lines.type_name == self.header_type || lines.type_name == self.column_enum() {
            return Err(invalid(format!("line type '{}' collides with another generated type", lines.type_name)));
        }

        let line_number = schema.position(&lines.line_number_column).ok_or_else(|| {
            invalid(format!("line number column '{}' is not in the layout", lines.line_number_column))
        })?;
        if schema.column(line_number).is_some_and(|column| column.optional) {
            return Err(invalid(format!("line number column '{}' is optional", lines.line_number_column)));
        }

        let boundary = match &lines.first_line_column {
            None => line_number,
            Some(ColumnRef::Index(index)) => *index,
            Some(ColumnRef::Name(name)) => schema
                .position(name)
                .ok_or_else(|| invalid(format!("first line column '{}' is not in the layout", name)))?,
        };

        if boundary == 0 || boundary >= schema.len() {
            return Err(invalid(format!(
                "line scope boundary {} must fall within 1..{}",
                boundary,
                schema.len()
            )));
        }
        if header_id >= boundary {
            return Err(invalid(format!(
                "header id column '{}' (index {}) falls in the line scope starting at {}",
                self.header_id_column, header_id, boundary
            )));
        }
        if line_number < boundary {
            return Err(invalid(format!(
                "line number column '{}' (index {}) falls in the header scope ending before {}",
                lines.line_number_column, line_number, boundary
            )));
        }

        let parent_field = to_snake_case(&lines.parent_field);
        if parent_field.is_empty() {
            return Err(invalid("parent field is empty".to_string()));
        }
        let clash = schema
            .columns()
            .skip(boundary)
            .find(|column| column.resolved_field_name() == parent_field);
        if let Some(column) = clash {
            return Err(invalid(format!(
                "parent field '{}' collides with line column '{}'",
                parent_field, column.name
            )));
        }

        for (scope, reserved, columns) in [
            ("header", HEADER_RESERVED, schema.columns().take(boundary).collect::<Vec<_>>()),
            ("line", LINE_RESERVED, schema.columns().skip(boundary).collect::<Vec<_>>()),
        ] {
            if let Some(column) = columns
                .iter()
                .find(|column| reserved.contains(&column.resolved_field_name().as_str()))
            {
                return Err(invalid(format!(
                    "{} column '{}' uses the reserved field name '{}'",
                    scope,
                    column.name,
                    column.resolved_field_name()
                )));
            }
        }

        check_setters(
            "header",
            schema.columns().take(boundary).map(|column| column.resolved_field_name()).collect(),
        )?;
        check_setters(
            "line",
            schema
                .columns()
                .skip(boundary)
                .map(|column| column.resolved_field_name())
                .chain(std::iter::once(parent_field))
                .collect(),
        )?;

        Ok(SpecLayout {
            header_id,
            line_number: Some(line_number),
            boundary,
        })
    }
}

/// First field named `set_<other>` where `<other>` is a field of the same record.
fn setter_clash(fields: &[String]) -> Option<&str> {
    fields.iter().map(String::as_str).find(|field| {
        field
            .strip_prefix("set_")
            .is_some_and(|rest| fields.iter().any(|other| other == rest))
    })
}

/// Column scopes of a validated spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecLayout {
    pub header_id: usize,
    pub line_number: Option<usize>,
    /// Index of the first line-scope column; the column count without lines
    pub boundary: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{ColumnDefinition, ColumnType};

    fn claim_layout() -> LayoutSchema {
        LayoutSchema::new(
            "Carrier",
            vec![
                ColumnDefinition::new("claimId", ColumnType::Numeric, 9).with_scale(0),
                ColumnDefinition::new("lineCount", ColumnType::Numeric, 3).with_scale(0).optional(),
                ColumnDefinition::new("lineNumber", ColumnType::Numeric, 2).with_scale(0),
                ColumnDefinition::new("amount", ColumnType::Numeric, 10).with_scale(2).optional(),
            ],
        )
        .unwrap()
    }

    fn claim_spec() -> MappingSpec {
        MappingSpec::new("rif", "Carrier")
            .with_header_type("CarrierClaim")
            .with_header_table("CarrierClaims")
            .with_header_id("claimId")
            .with_lines("CarrierClaimLines")
            .with_line_number("lineNumber")
    }

    #[test]
    fn test_defaults() {
        let spec = claim_spec();
        assert_eq!(spec.column_enum(), "CarrierClaimColumn");
        assert_eq!(spec.lines.as_ref().unwrap().type_name, "CarrierClaimLine");
        assert_eq!(spec.line_id_type().as_deref(), Some("CarrierClaimLineId"));
        assert_eq!(spec.lines.as_ref().unwrap().parent_field, DEFAULT_PARENT_FIELD);
    }

    #[test]
    fn test_boundary_defaults_to_line_number() {
        let layout = claim_spec().validate(&claim_layout()).unwrap();
        assert_eq!(
            layout,
            SpecLayout {
                header_id: 0,
                line_number: Some(2),
                boundary: 2
            }
        );
    }

    #[test]
    fn test_header_only_boundary_is_column_count() {
        let spec = MappingSpec::new("rif", "Carrier")
            .with_header_type("CarrierClaim")
            .with_header_id("claimId");
        let layout = spec.validate(&claim_layout()).unwrap();
        assert_eq!(layout.boundary, 4);
        assert_eq!(layout.line_number, None);
    }

    #[test]
    fn test_explicit_boundary_by_index_and_name() {
        let layout = claim_spec()
            .with_first_line_column(ColumnRef::Index(1))
            .validate(&claim_layout())
            .unwrap();
        assert_eq!(layout.boundary, 1);

        let layout = claim_spec()
            .with_first_line_column(ColumnRef::Name("lineCount".to_string()))
            .validate(&claim_layout())
            .unwrap();
        assert_eq!(layout.boundary, 1);
    }

    #[test]
    fn test_boundary_must_not_separate_keys() {
        // line number before the boundary
        let err = claim_spec()
            .with_first_line_column(ColumnRef::Index(3))
            .validate(&claim_layout())
            .unwrap_err();
        assert!(err.to_string().contains("header scope"));

        // header id at the boundary
        let err = claim_spec()
            .with_first_line_column(ColumnRef::Index(0))
            .validate(&claim_layout())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidMappingSpec { .. }));
    }

    #[test]
    fn test_missing_and_optional_key_columns() {
        let err = claim_spec().with_header_id("nope").validate(&claim_layout()).unwrap_err();
        assert!(err.to_string().contains("not in the layout"));

        let err = claim_spec().with_header_id("lineCount").validate(&claim_layout()).unwrap_err();
        assert!(err.to_string().contains("optional"));

        let err = claim_spec().with_line_number("amount").validate(&claim_layout()).unwrap_err();
        assert!(err.to_string().contains("optional"));
    }

    #[test]
    fn test_type_name_checks() {
        let err = claim_spec().with_line_type("CarrierClaim").validate(&claim_layout()).unwrap_err();
        assert!(err.to_string().contains("collides"));

        let err = claim_spec()
            .with_header_type("carrier claim")
            .validate(&claim_layout())
            .unwrap_err();
        assert!(err.to_string().contains("not a valid type name"));
    }

    #[test]
    fn test_reserved_field_names() {
        let layout = LayoutSchema::new(
            "Carrier",
            vec![
                ColumnDefinition::new("claimId", ColumnType::Numeric, 9).with_scale(0),
                ColumnDefinition::new("lines", ColumnType::Numeric, 3).with_scale(0),
                ColumnDefinition::new("lineNumber", ColumnType::Numeric, 2).with_scale(0),
            ],
        )
        .unwrap();
        let err = claim_spec().validate(&layout).unwrap_err();
        assert!(err.to_string().contains("reserved field name 'lines'"));

        // Without line records the name is free.
        let spec = MappingSpec::new("rif", "Carrier")
            .with_header_type("CarrierClaim")
            .with_header_id("claimId");
        assert!(spec.validate(&layout).is_ok());
    }

    #[test]
    fn test_parent_field_collision() {
        let err = claim_spec()
            .with_parent_field("amount")
            .validate(&claim_layout())
            .unwrap_err();
        assert!(err.to_string().contains("collides with line column"));
    }

    #[test]
    fn test_constructor_name_is_reserved() {
        let layout = LayoutSchema::new(
            "Carrier",
            vec![
                ColumnDefinition::new("claimId", ColumnType::Numeric, 9).with_scale(0),
                ColumnDefinition::new("NEW", ColumnType::Character, 1),
            ],
        )
        .unwrap();
        let spec = MappingSpec::new("rif", "Carrier").with_header_id("claimId");
        let err = spec.validate(&layout).unwrap_err();
        assert!(err.to_string().contains("reserved field name 'new'"));
    }

    #[test]
    fn test_setter_name_collisions() {
        let layout = LayoutSchema::new(
            "Carrier",
            vec![
                ColumnDefinition::new("id", ColumnType::Character, 5),
                ColumnDefinition::new("amount", ColumnType::Numeric, 5).with_scale(2).optional(),
                ColumnDefinition::new("set_amount", ColumnType::Character, 4).optional(),
            ],
        )
        .unwrap();
        let spec = MappingSpec::new("rif", "Carrier").with_header_id("id");
        let err = spec.validate(&layout).unwrap_err();
        assert!(matches!(err, Error::InvalidMappingSpec { .. }));
        assert!(err.to_string().contains("header field 'set_amount' collides with the setter of 'amount'"));

        // Split across the two records the names no longer meet.
        let spec = spec.with_lines("CarrierLines").with_line_number("set_amount");
        let layout = LayoutSchema::new(
            "Carrier",
            vec![
                ColumnDefinition::new("id", ColumnType::Character, 5),
                ColumnDefinition::new("amount", ColumnType::Numeric, 5).with_scale(2).optional(),
                ColumnDefinition::new("set_amount", ColumnType::Character, 4),
            ],
        )
        .unwrap();
        assert!(spec.validate(&layout).is_ok());
    }

    #[test]
    fn test_line_field_collides_with_parent_setter() {
        let layout = LayoutSchema::new(
            "Carrier",
            vec![
                ColumnDefinition::new("claimId", ColumnType::Numeric, 9).with_scale(0),
                ColumnDefinition::new("lineNumber", ColumnType::Numeric, 2).with_scale(0),
                ColumnDefinition::new("setParentClaim", ColumnType::Character, 1).optional(),
            ],
        )
        .unwrap();
        let err = claim_spec().validate(&layout).unwrap_err();
        assert!(err.to_string().contains("line field 'set_parent_claim' collides with the setter of 'parent_claim'"));
    }
}
