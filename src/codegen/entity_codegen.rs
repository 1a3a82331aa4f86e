//! Record type generation from a layout and its mapping spec.
//!
//! Produces, in order, the column enumeration, the line record type (when the
//! layout has repeating lines) and the header record type. The output is the
//! language-neutral description in [`crate::codegen::artifact`].

use tracing::debug;

use crate::codegen::artifact::{
    ColumnMeta, EnumArtifact, FieldSpec, KeyPart, KeySpec, LayoutArtifacts, LineCollection,
    ParentRef, RecordArtifact, RecordKind,
};
use crate::codegen::mapping_spec::{LineSpec, MappingSpec, SpecLayout};
use crate::codegen::type_resolver::resolve;
use crate::codegen::utils::to_snake_case;
use crate::error::{Error, Result};
use crate::layout::{ColumnType, LayoutSchema};

/// Name of the header field holding its line records.
pub const LINES_FIELD: &str = "lines";

/// Generates the record artifacts of one layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityCodeGenerator;

impl EntityCodeGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate all artifacts for `spec` from `schema`.
    ///
    /// Any failure is returned as [`Error::Generation`] scoped to the spec;
    /// nothing is produced for a spec that fails.
    pub fn generate(&self, schema: &LayoutSchema, spec: &MappingSpec) -> Result<LayoutArtifacts> {
        self.generate_inner(schema, spec)
            .map_err(|e| e.in_spec(spec.header_type.clone()))
    }

    fn generate_inner(&self, schema: &LayoutSchema, spec: &MappingSpec) -> Result<LayoutArtifacts> {
        let scopes = spec.validate(schema)?;

        let column_enum = generate_column_enum(schema, spec);

        let line = match &spec.lines {
            Some(lines) => Some(generate_line_record(schema, spec, lines, &scopes)?),
            None => None,
        };

        let header = generate_header_record(schema, spec, &scopes, line.as_ref())?;

        debug!(
            spec = %spec.header_type,
            header_fields = header.fields.len(),
            line_fields = line.as_ref().map(|line| line.fields.len()).unwrap_or(0),
            "generated record artifacts"
        );

        Ok(LayoutArtifacts {
            namespace: spec.namespace.clone(),
            section: schema.section().to_string(),
            column_enum,
            line,
            header,
        })
    }
}

/// Generate the artifacts of `spec` with the default generator.
pub fn generate_layout(schema: &LayoutSchema, spec: &MappingSpec) -> Result<LayoutArtifacts> {
    EntityCodeGenerator::new().generate(schema, spec)
}

fn generate_column_enum(schema: &LayoutSchema, spec: &MappingSpec) -> EnumArtifact {
    EnumArtifact {
        name: spec.column_enum(),
        entries: schema.columns().map(|column| column.symbol()).collect(),
    }
}

fn build_field(schema: &LayoutSchema, index: usize, key: bool) -> Result<FieldSpec> {
    let column = schema.column(index).ok_or_else(|| Error::MalformedSchema {
        section: schema.section().to_string(),
        row: None,
        message: format!("no column at index {}", index),
    })?;

    let resolved = resolve(column).map_err(|e| match e {
        // The resolver does not know which section it is looking at.
        Error::MalformedSchema { message, .. } => Error::MalformedSchema {
            section: schema.section().to_string(),
            row: Some(column.source_row(index)),
            message,
        },
        other => other,
    })?;

    let meta = ColumnMeta {
        name: column.name.clone(),
        column_type: column.column_type,
        nullable: column.optional,
        length: (column.column_type == ColumnType::Character).then_some(column.length),
        precision: (column.column_type == ColumnType::Numeric).then_some(column.length),
        scale: if column.column_type == ColumnType::Numeric {
            column.scale
        } else {
            None
        },
    };

    Ok(FieldSpec {
        name: column.resolved_field_name(),
        column: column.symbol(),
        column_index: index,
        storage: resolved.storage,
        accessor: resolved.accessor(),
        key,
        meta,
        doc: column.label.clone(),
    })
}

fn generate_line_record(
    schema: &LayoutSchema,
    spec: &MappingSpec,
    lines: &LineSpec,
    scopes: &SpecLayout,
) -> Result<RecordArtifact> {
    let header_id = build_field(schema, scopes.header_id, true)?;
    let line_number_index = scopes.line_number.ok_or_else(|| Error::InvalidMappingSpec {
        spec: spec.header_type.clone(),
        message: "line records need a line number column".to_string(),
    })?;

    let mut fields = Vec::with_capacity(schema.len() - scopes.boundary);
    for index in scopes.boundary..schema.len() {
        fields.push(build_field(schema, index, index == line_number_index)?);
    }

    let line_number = fields
        .iter()
        .find(|field| field.column_index == line_number_index)
        .map(|field| KeyPart {
            name: field.name.clone(),
            value: field.storage,
        })
        .ok_or_else(|| Error::InvalidMappingSpec {
            spec: spec.header_type.clone(),
            message: "line number column is outside the line scope".to_string(),
        })?;

    let parent_field = to_snake_case(&lines.parent_field);
    let key = KeySpec {
        name: format!("{}Id", lines.type_name),
        parent: KeyPart {
            name: parent_field.clone(),
            value: header_id.storage,
        },
        line_number,
    };

    Ok(RecordArtifact {
        name: lines.type_name.clone(),
        kind: RecordKind::Line,
        table: lines.table_name.clone(),
        fields,
        id_field: None,
        key: Some(key),
        parent: Some(ParentRef {
            field: parent_field,
            header_type: spec.header_type.clone(),
            header_id_field: header_id.name,
            value: header_id.storage,
        }),
        lines: None,
    })
}

fn generate_header_record(
    schema: &LayoutSchema,
    spec: &MappingSpec,
    scopes: &SpecLayout,
    line: Option<&RecordArtifact>,
) -> Result<RecordArtifact> {
    let mut fields = Vec::with_capacity(scopes.boundary);
    for index in 0..scopes.boundary {
        fields.push(build_field(schema, index, index == scopes.header_id)?);
    }

    let id_field = fields
        .iter()
        .find(|field| field.key)
        .map(|field| field.name.clone());

    let lines = line.and_then(|line| {
        let key = line.key.as_ref()?;
        Some(LineCollection {
            field: LINES_FIELD.to_string(),
            line_type: line.name.clone(),
            order_by: key.line_number.name.clone(),
            order_by_value: key.line_number.value,
            parent_field: key.parent.name.clone(),
        })
    });

    Ok(RecordArtifact {
        name: spec.header_type.clone(),
        kind: RecordKind::Header,
        table: spec.header_table.clone(),
        fields,
        id_field,
        key: None,
        parent: None,
        lines,
    })
}
