//! Project configuration schema for `layouts.yaml`.
//!
//! This module defines the project-level configuration that drives a
//! generation run: where the layout resource lives, which layouts to
//! generate, and which emitters to run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codegen::emitter::{Emitter, EmitterKind};
use crate::codegen::mapping_spec::{ColumnRef, MappingSpec};
use crate::codegen::rust_codegen::RustCodegenConfig;
use crate::codegen::utils::is_type_name;
use crate::error::{Error, Result};

/// Top-level project configuration from `layouts.yaml`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Default namespace of generated records
    #[serde(default)]
    pub namespace: String,
    /// Layout resource, relative to the config file
    pub resource: String,
    /// Output directory, relative to the config file
    #[serde(default = "default_output_dir")]
    pub output: String,
    #[serde(default = "default_emitters")]
    pub emit: Vec<EmitterKind>,
    /// Write the diagnostics transcript at the end of the run
    #[serde(default = "default_true")]
    pub transcript: bool,
    #[serde(default)]
    pub rust: RustCodegenConfig,
    pub layouts: Vec<LayoutConfig>,
}

/// One layout to generate
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    pub section: String,
    /// Defaults to the section name
    #[serde(default)]
    pub header_type: Option<String>,
    /// Defaults to the header type
    #[serde(default)]
    pub header_table: Option<String>,
    pub header_id: String,
    #[serde(default)]
    pub lines: Option<LinesConfig>,
    /// Overrides the project namespace
    #[serde(default)]
    pub namespace: Option<String>,
}

/// Line records of a layout
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LinesConfig {
    pub line_table: String,
    #[serde(default)]
    pub line_number: Option<String>,
    #[serde(default)]
    pub line_type: Option<String>,
    #[serde(default)]
    pub first_line_column: Option<ColumnRef>,
    #[serde(default)]
    pub parent_field: Option<String>,
}

fn default_output_dir() -> String {
    "generated".to_string()
}

fn default_emitters() -> Vec<EmitterKind> {
    vec![EmitterKind::Rust]
}

fn default_true() -> bool {
    true
}

impl ProjectConfig {
    /// Load project configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: format!("failed to read: {}", e),
        })?;
        Self::from_yaml(&contents).map_err(|e| match e {
            Error::Yaml(e) => Error::Config {
                path: path.to_path_buf(),
                message: format!("failed to parse: {}", e),
            },
            other => other,
        })
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Check names before any layout is read.
    ///
    /// Column-level checks happen later, against the parsed layout.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.resource.trim().is_empty() {
            return Err("resource is empty".to_string());
        }
        if self.layouts.is_empty() {
            return Err("no layouts configured".to_string());
        }
        if self.emit.is_empty() {
            return Err("no emitters configured".to_string());
        }

        let mut header_types = HashSet::new();
        for (index, layout) in self.layouts.iter().enumerate() {
            if layout.section.trim().is_empty() {
                return Err(format!("layout {}: section is empty", index));
            }
            if layout.header_id.trim().is_empty() {
                return Err(format!("layout '{}': header_id is empty", layout.section));
            }

            let header_type = layout.header_type();
            if !is_type_name(header_type) {
                return Err(format!(
                    "layout '{}': '{}' is not a valid type name",
                    layout.section, header_type
                ));
            }
            if !header_types.insert(header_type.to_string()) {
                return Err(format!("header type '{}' is configured twice", header_type));
            }

            if let Some(lines) = &layout.lines {
                if lines.line_table.trim().is_empty() {
                    return Err(format!("layout '{}': line_table is empty", layout.section));
                }
                if let Some(line_type) = &lines.line_type {
                    if !is_type_name(line_type) {
                        return Err(format!(
                            "layout '{}': '{}' is not a valid type name",
                            layout.section, line_type
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Mapping specs of every configured layout, in configuration order.
    pub fn to_jobs(&self) -> Vec<MappingSpec> {
        self.layouts
            .iter()
            .map(|layout| layout.to_spec(&self.namespace))
            .collect()
    }

    /// Emitters to run, in configuration order.
    pub fn emitters(&self) -> Vec<Box<dyn Emitter>> {
        self.emit.iter().map(|kind| kind.build(&self.rust)).collect()
    }

    /// Layout resource location, resolved against `base_dir`.
    pub fn resource_path(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.resource)
    }

    /// Output directory, resolved against `base_dir`.
    pub fn output_path(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.output)
    }
}

impl LayoutConfig {
    pub fn header_type(&self) -> &str {
        self.header_type.as_deref().unwrap_or(&self.section)
    }

    pub fn to_spec(&self, default_namespace: &str) -> MappingSpec {
        let header_type = self.header_type().to_string();
        let header_table = self.header_table.clone().unwrap_or_else(|| header_type.clone());
        let namespace = self.namespace.as_deref().unwrap_or(default_namespace);

        let mut spec = MappingSpec::new(namespace, self.section.clone())
            .with_header_type(header_type)
            .with_header_table(header_table)
            .with_header_id(self.header_id.clone());

        if let Some(lines) = &self.lines {
            spec = spec.with_lines(lines.line_table.clone());
            if let Some(line_type) = &lines.line_type {
                spec = spec.with_line_type(line_type.clone());
            }
            if let Some(line_number) = &lines.line_number {
                spec = spec.with_line_number(line_number.clone());
            }
            if let Some(first) = &lines.first_line_column {
                spec = spec.with_first_line_column(first.clone());
            }
            if let Some(parent_field) = &lines.parent_field {
                spec = spec.with_parent_field(parent_field.clone());
            }
        }
        spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::mapping_spec::{DEFAULT_LINE_NUMBER_FIELD, DEFAULT_PARENT_FIELD};
    use std::fs;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
namespace: bluebutton::rif
resource: rif-layout.xlsx
output: src/generated
emit: [rust, manifest]
layouts:
  - section: Beneficiary
    header_table: Beneficiaries
    header_id: beneficiaryId
  - section: Carrier
    header_type: CarrierClaim
    header_table: CarrierClaims
    header_id: claimId
    lines:
      line_table: CarrierClaimLines
      line_number: lineNumber
      first_line_column: 3
    namespace: bluebutton::rif::carrier
"#;

    #[test]
    fn test_parse_and_jobs() {
        let config = ProjectConfig::from_yaml(CONFIG).unwrap();
        config.validate().unwrap();
        assert!(config.transcript);
        assert_eq!(config.emit, vec![EmitterKind::Rust, EmitterKind::Manifest]);

        let jobs = config.to_jobs();
        assert_eq!(jobs.len(), 2);

        assert_eq!(jobs[0].header_type, "Beneficiary");
        assert_eq!(jobs[0].header_table, "Beneficiaries");
        assert_eq!(jobs[0].namespace, "bluebutton::rif");
        assert!(!jobs[0].has_lines());

        let lines = jobs[1].lines.as_ref().unwrap();
        assert_eq!(jobs[1].namespace, "bluebutton::rif::carrier");
        assert_eq!(lines.type_name, "CarrierClaimLine");
        assert_eq!(lines.line_number_column, "lineNumber");
        assert_eq!(lines.first_line_column, Some(ColumnRef::Index(3)));
        assert_eq!(lines.parent_field, DEFAULT_PARENT_FIELD);
    }

    #[test]
    fn test_line_defaults() {
        let config = ProjectConfig::from_yaml(
            "resource: layouts\nlayouts:\n  - section: Carrier\n    header_id: id\n    lines:\n      line_table: Lines\n",
        )
        .unwrap();
        assert_eq!(config.output, "generated");
        assert_eq!(config.emit, vec![EmitterKind::Rust]);
        let jobs = config.to_jobs();
        assert_eq!(
            jobs[0].lines.as_ref().unwrap().line_number_column,
            DEFAULT_LINE_NUMBER_FIELD
        );
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(ProjectConfig::from_yaml("resource: x\nlayouts: []\nbogus: 1\n").is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_header_types() {
        let config = ProjectConfig::from_yaml(
            "resource: x\nlayouts:\n  - section: A\n    header_type: Claim\n    header_id: id\n  - section: B\n    header_type: Claim\n    header_id: id\n",
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("configured twice"));
    }

    #[test]
    fn test_validate_rejects_bad_type_name() {
        let config =
            ProjectConfig::from_yaml("resource: x\nlayouts:\n  - section: carrier claims\n    header_id: id\n").unwrap();
        assert!(config.validate().unwrap_err().contains("not a valid type name"));
    }

    #[test]
    fn test_from_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("layouts.yaml");
        fs::write(&path, "resource: [unclosed").unwrap();

        match ProjectConfig::from_file(&path).unwrap_err() {
            Error::Config { path: reported, message } => {
                assert_eq!(reported, path);
                assert!(message.starts_with("failed to parse"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(
            ProjectConfig::from_file(dir.path().join("missing.yaml")),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_paths_resolve_against_config_dir() {
        let config = ProjectConfig::from_yaml(CONFIG).unwrap();
        let base = Path::new("/project");
        assert_eq!(config.resource_path(base), PathBuf::from("/project/rif-layout.xlsx"));
        assert_eq!(config.output_path(base), PathBuf::from("/project/src/generated"));
    }
}
