//! # rifgen: record types from tabular layouts
//!
//! rifgen reads column layouts of fixed-format data files from a spreadsheet
//! (one worksheet or CSV file per layout section) and generates strongly
//! typed record types for them: a column enumeration, a header record, and
//! optionally a line record keyed by (header id, line number) for layouts
//! with repeating lines.
//!
//! ## Layout section
//!
//! ```text
//! name,        type,      length, scale, optional, field,   label
//! claimId,     NUMERIC,   9,      0,     N
//! claimType,   CHARACTER, 1,      ,      Y
//! lineNumber,  NUMERIC,   2,      0,     N
//! serviceDate, DATE,      8,      ,      Y,        ,        Date of service
//! ```
//!
//! ## Project configuration
//!
//! ```yaml
//! namespace: bluebutton::rif
//! resource: layouts
//! output: src/generated
//! layouts:
//!   - section: Carrier
//!     header_type: CarrierClaim
//!     header_id: claimId
//!     lines:
//!       line_table: CarrierClaimLines
//!       line_number: lineNumber
//! ```
//!
//! A run never aborts on a bad layout: failures are collected in
//! [`Diagnostics`] per mapping spec and the remaining specs are still
//! generated.

pub mod codegen;
pub mod diagnostics;
pub mod error;
pub mod layout;
pub mod logging;

// Re-export key types
pub use codegen::{
    generate_from_config, process, BatchReport, Emitter, LayoutArtifacts, MappingSpec, OutputSink,
    ProjectConfig,
};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{Error, Result};
pub use layout::{parse_layout, ColumnDefinition, ColumnType, LayoutParser, LayoutSchema, LayoutSource, Workbook};
