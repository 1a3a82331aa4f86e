//! Layout section parsing.
//!
//! Expected row shape (the first row of a section is a header and skipped):
//!
//! | cell | content                        | required |
//! |------|--------------------------------|----------|
//! | 0    | column name                    | yes      |
//! | 1    | type code                      | yes      |
//! | 2    | length                         | yes      |
//! | 3    | scale (NUMERIC only)           | no       |
//! | 4    | optional flag (`Y`/`N`, ...)   | no       |
//! | 5    | field name                     | no       |
//! | 6    | label                          | no       |

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::layout::{ColumnDefinition, ColumnType, LayoutSchema, LayoutSource};

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("identifier pattern"));

const NAME: usize = 0;
const TYPE_CODE: usize = 1;
const LENGTH: usize = 2;
const SCALE: usize = 3;
const OPTIONAL: usize = 4;
const FIELD_NAME: usize = 5;
const LABEL: usize = 6;

/// Turns layout sections into [`LayoutSchema`]s.
#[derive(Debug, Clone)]
pub struct LayoutParser {
    header_rows: usize,
}

impl Default for LayoutParser {
    fn default() -> Self {
        Self { header_rows: 1 }
    }
}

impl LayoutParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `section` from `source` and parse it.
    pub fn parse(&self, source: &dyn LayoutSource, section: &str) -> Result<LayoutSchema> {
        let rows = source.section_rows(section)?;
        self.parse_rows(section, &rows)
    }

    /// Parse already-loaded rows of one section.
    ///
    /// Rows are consumed in order; entirely blank rows are skipped.
    pub fn parse_rows(&self, section: &str, rows: &[Vec<String>]) -> Result<LayoutSchema> {
        if rows.len() < self.header_rows {
            return Err(Error::MalformedSchema {
                section: section.to_string(),
                row: None,
                message: "section has no header row".to_string(),
            });
        }

        let mut columns = Vec::new();
        for (offset, cells) in rows.iter().enumerate().skip(self.header_rows) {
            if cells.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            let row = offset + 1;
            columns.push(parse_row(section, row, cells)?);
        }

        if columns.is_empty() {
            return Err(Error::MalformedSchema {
                section: section.to_string(),
                row: None,
                message: "section defines no columns".to_string(),
            });
        }

        debug!(section, columns = columns.len(), "parsed layout section");
        LayoutSchema::new(section, columns)
    }
}

/// Parse `section` of `source` with the default parser.
pub fn parse_layout(source: &dyn LayoutSource, section: &str) -> Result<LayoutSchema> {
    LayoutParser::new().parse(source, section)
}

fn cell(cells: &[String], index: usize) -> Option<&str> {
    cells
        .get(index)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn parse_row(section: &str, row: usize, cells: &[String]) -> Result<ColumnDefinition> {
    let malformed = |message: String| Error::MalformedSchema {
        section: section.to_string(),
        row: Some(row),
        message,
    };

    let name = cell(cells, NAME).ok_or_else(|| malformed("missing column name".to_string()))?;
    if !IDENTIFIER.is_match(name) {
        return Err(malformed(format!("column name '{}' is not an identifier", name)));
    }

    let type_code = cell(cells, TYPE_CODE)
        .ok_or_else(|| malformed(format!("column '{}' has no type code", name)))?;
    let column_type = ColumnType::from_code(type_code)
        .ok_or_else(|| malformed(format!("column '{}' has unrecognized type code '{}'", name, type_code)))?;

    let length = cell(cells, LENGTH)
        .ok_or_else(|| malformed(format!("column '{}' has no length", name)))
        .and_then(|raw| {
            parse_count(raw).ok_or_else(|| malformed(format!("column '{}' has invalid length '{}'", name, raw)))
        })?;
    if length == 0 {
        return Err(malformed(format!("column '{}' has zero length", name)));
    }

    let scale = match cell(cells, SCALE) {
        Some(raw) => Some(
            parse_count(raw)
                .ok_or_else(|| malformed(format!("column '{}' has invalid scale '{}'", name, raw)))?,
        ),
        None => None,
    };
    if column_type == ColumnType::Numeric && scale.is_none() {
        return Err(malformed(format!("NUMERIC column '{}' has no scale", name)));
    }

    let optional = match cell(cells, OPTIONAL) {
        Some(raw) => parse_flag(raw)
            .ok_or_else(|| malformed(format!("column '{}' has invalid optional flag '{}'", name, raw)))?,
        None => false,
    };

    let field_name = match cell(cells, FIELD_NAME) {
        Some(field_name) if IDENTIFIER.is_match(field_name) => Some(field_name.to_string()),
        Some(field_name) => {
            return Err(malformed(format!(
                "field name '{}' of column '{}' is not an identifier",
                field_name, name
            )))
        }
        None => None,
    };

    Ok(ColumnDefinition {
        name: name.to_string(),
        column_type,
        length,
        scale,
        optional,
        field_name,
        label: cell(cells, LABEL).map(str::to_string),
        row: Some(row),
    })
}

/// Non-negative whole number. Spreadsheet numeric cells may come through as
/// `"9.0"`, which is accepted.
fn parse_count(raw: &str) -> Option<u32> {
    if let Ok(value) = raw.parse::<u32>() {
        return Some(value);
    }
    let value = raw.parse::<f64>().ok()?;
    if value.fract() == 0.0 && value >= 0.0 && value <= f64::from(u32::MAX) {
        Some(value as u32)
    } else {
        None
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_uppercase().as_str() {
        "Y" | "YES" | "TRUE" | "1" => Some(true),
        "N" | "NO" | "FALSE" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    const HEADER: &[&str] = &["Name", "Type", "Length", "Scale", "Optional"];

    #[test]
    fn test_parse_skips_header_and_keeps_order() {
        let schema = LayoutParser::new()
            .parse_rows(
                "Carrier",
                &rows(&[
                    HEADER,
                    &["claimId", "NUM", "9", "0", "N"],
                    &["lineNumber", "NUM", "2", "0", ""],
                    &["amount", "NUMERIC", "10", "2", "Y"],
                    &["serviceDate", "DATE", "8", "", "Y", "", "Date of service"],
                ]),
            )
            .unwrap();

        let names: Vec<_> = schema.columns().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["claimId", "lineNumber", "amount", "serviceDate"]);

        let amount = schema.find("amount").unwrap();
        assert_eq!(amount.column_type, ColumnType::Numeric);
        assert_eq!(amount.length, 10);
        assert_eq!(amount.scale, Some(2));
        assert!(amount.optional);

        let date = schema.find("serviceDate").unwrap();
        assert_eq!(date.label.as_deref(), Some("Date of service"));
        assert!(!schema.find("lineNumber").unwrap().optional);
    }

    #[test]
    fn test_parse_accepts_float_lengths_and_field_names() {
        let schema = LayoutParser::new()
            .parse_rows(
                "Beneficiary",
                &rows(&[HEADER, &["BENE_ID", "CHAR", "15.0", "", "N", "beneficiaryId"]]),
            )
            .unwrap();

        let column = schema.column(0).unwrap();
        assert_eq!(column.length, 15);
        assert_eq!(column.resolved_field_name(), "beneficiary_id");
    }

    #[test]
    fn test_parse_skips_blank_rows() {
        let schema = LayoutParser::new()
            .parse_rows(
                "Beneficiary",
                &rows(&[HEADER, &["id", "NUM", "9", "0", "N"], &["", "", "", "", ""]]),
            )
            .unwrap();
        assert_eq!(schema.len(), 1);
    }

    #[test]
    fn test_rows_after_blank_row_keep_their_position() {
        let err = LayoutParser::new()
            .parse_rows(
                "Carrier",
                &rows(&[
                    HEADER,
                    &["claimId", "NUM", "9", "0", "N"],
                    &["", "", "", "", ""],
                    &["amount", "NUM", "10", "2", "Y"],
                    &["claimId", "CHAR", "4", "", "Y"],
                ]),
            )
            .unwrap_err();

        match err {
            Error::MalformedSchema { row, message, .. } => {
                assert_eq!(row, Some(5));
                assert!(message.contains("duplicate column name 'claimId'"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let schema = LayoutParser::new()
            .parse_rows(
                "Carrier",
                &rows(&[HEADER, &[], &["claimId", "NUM", "9", "0", "N"]]),
            )
            .unwrap();
        assert_eq!(schema.column(0).unwrap().row, Some(3));
    }

    #[test]
    fn test_unrecognized_type_code_identifies_row() {
        let err = LayoutParser::new()
            .parse_rows(
                "Carrier",
                &rows(&[HEADER, &["claimId", "NUM", "9", "0", "N"], &["flag", "BOOL", "1", "", "N"]]),
            )
            .unwrap_err();

        match err {
            Error::MalformedSchema { section, row, message } => {
                assert_eq!(section, "Carrier");
                assert_eq!(row, Some(3));
                assert!(message.contains("BOOL"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_numeric_without_scale_is_malformed() {
        let err = LayoutParser::new()
            .parse_rows("Carrier", &rows(&[HEADER, &["amount", "NUM", "10", "", "Y"]]))
            .unwrap_err();

        match err {
            Error::MalformedSchema { row, message, .. } => {
                assert_eq!(row, Some(2));
                assert!(message.contains("no scale"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_cells_are_malformed() {
        let parser = LayoutParser::new();
        for bad in [
            &["claimId", "NUM", "nine", "0", "N"][..],
            &["claimId", "NUM", "0", "0", "N"][..],
            &["claimId", "NUM", "9", "-1", "N"][..],
            &["claimId", "NUM", "9", "0", "maybe"][..],
            &["claim id", "NUM", "9", "0", "N"][..],
            &["claimId", "", "9", "0", "N"][..],
        ] {
            let result = parser.parse_rows("Carrier", &rows(&[HEADER, bad]));
            assert!(
                matches!(result, Err(Error::MalformedSchema { .. })),
                "expected malformed schema for {bad:?}"
            );
        }
    }

    #[test]
    fn test_empty_section_is_malformed() {
        let parser = LayoutParser::new();
        assert!(parser.parse_rows("Empty", &[]).is_err());
        assert!(parser.parse_rows("Empty", &rows(&[HEADER])).is_err());
    }

    #[test]
    fn test_parse_flag_vocabulary() {
        assert_eq!(parse_flag("y"), Some(true));
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("No"), Some(false));
        assert_eq!(parse_flag("x"), None);
    }
}
