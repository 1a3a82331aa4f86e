//! Error taxonomy for layout parsing and record generation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading layouts, validating mapping specs, or
/// producing artifacts.
#[derive(Debug, Error)]
pub enum Error {
    /// The layout resource, or a named section inside it, does not exist.
    #[error("schema not found: '{resource}'{}", section_suffix(.section))]
    SchemaNotFound {
        resource: String,
        section: Option<String>,
    },

    /// A row cannot be turned into a column definition.
    #[error("malformed schema in section '{section}'{}: {message}", row_suffix(.row))]
    MalformedSchema {
        section: String,
        /// 1-based spreadsheet row number, when the failure is tied to a row
        row: Option<usize>,
        message: String,
    },

    /// The column's type/length/optionality combination has no mapping.
    #[error(
        "unsupported column type for '{column}': type={column_type}, length={length}, scale={scale:?}, optional={optional}"
    )]
    UnsupportedColumnType {
        column: String,
        column_type: String,
        length: u32,
        scale: Option<u32>,
        optional: bool,
    },

    /// The mapping spec disagrees with the layout it is paired with.
    #[error("invalid mapping spec '{spec}': {message}")]
    InvalidMappingSpec { spec: String, message: String },

    /// Any failure scoped to the generation of one mapping spec.
    #[error("generation failed for '{spec}': {source}")]
    Generation {
        spec: String,
        #[source]
        source: Box<Error>,
    },

    /// Two artifacts were routed to the same output slot in one run.
    #[error("output '{name}' was already written in this run")]
    DuplicateOutput { name: String },

    #[error("invalid configuration '{}': {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

fn section_suffix(section: &Option<String>) -> String {
    match section {
        Some(section) => format!(" (section '{}')", section),
        None => String::new(),
    }
}

fn row_suffix(row: &Option<usize>) -> String {
    match row {
        Some(row) => format!(" at row {}", row),
        None => String::new(),
    }
}

impl Error {
    /// Wrap this error as a generation failure of the named spec.
    ///
    /// Already-wrapped errors are returned unchanged so that the spec name
    /// is never nested twice.
    pub fn in_spec(self, spec: impl Into<String>) -> Self {
        match self {
            Error::Generation { .. } => self,
            other => Error::Generation {
                spec: spec.into(),
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, looking through `Generation` wrappers.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Generation { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// The schema element this error is attributed to, if known.
    pub fn schema_element(&self) -> Option<String> {
        match self {
            Error::SchemaNotFound { resource, section } => Some(match section {
                Some(section) => format!("{}#{}", resource, section),
                None => resource.clone(),
            }),
            Error::MalformedSchema { section, row, .. } => Some(match row {
                Some(row) => format!("{}!row {}", section, row),
                None => section.clone(),
            }),
            Error::UnsupportedColumnType { column, .. } => Some(column.clone()),
            Error::InvalidMappingSpec { spec, .. } => Some(spec.clone()),
            Error::Generation { spec, source } => match source.schema_element() {
                Some(inner) => Some(format!("{}/{}", spec, inner)),
                None => Some(spec.clone()),
            },
            Error::DuplicateOutput { name } => Some(name.clone()),
            Error::Config { path, .. } => Some(path.display().to_string()),
            _ => None,
        }
    }

    /// True for the schema-authoring failures of the layout taxonomy.
    pub fn is_malformed_schema(&self) -> bool {
        matches!(self.root_cause(), Error::MalformedSchema { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_spec_does_not_double_wrap() {
        let err = Error::MalformedSchema {
            section: "Carrier".to_string(),
            row: Some(4),
            message: "missing scale".to_string(),
        }
        .in_spec("CarrierClaim")
        .in_spec("Other");

        match &err {
            Error::Generation { spec, .. } => assert_eq!(spec, "CarrierClaim"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_malformed_schema());
        assert_eq!(err.schema_element().as_deref(), Some("CarrierClaim/Carrier!row 4"));
    }

    #[test]
    fn test_display_messages() {
        let err = Error::SchemaNotFound {
            resource: "layout.xlsx".to_string(),
            section: Some("Beneficiary".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "schema not found: 'layout.xlsx' (section 'Beneficiary')"
        );

        let err = Error::MalformedSchema {
            section: "Carrier".to_string(),
            row: None,
            message: "empty".to_string(),
        };
        assert_eq!(err.to_string(), "malformed schema in section 'Carrier': empty");
    }
}
