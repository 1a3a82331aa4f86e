//! JSON manifest of the generated artifacts.
//!
//! One `<header>.layout.json` per layout, describing the column enumeration
//! and both record types. Useful for tooling that loads records without the
//! generated Rust source.

use crate::codegen::artifact::LayoutArtifacts;
use crate::codegen::emitter::{Emitter, RenderedFile};
use crate::codegen::utils::{namespace_to_path, to_snake_case};
use crate::error::Result;

/// Emits `<header>.layout.json` next to the generated source.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestEmitter;

impl Emitter for ManifestEmitter {
    fn id(&self) -> &'static str {
        "manifest"
    }

    fn render(&self, artifacts: &LayoutArtifacts) -> Result<Vec<RenderedFile>> {
        let file = format!("{}.layout.json", to_snake_case(&artifacts.header.name));
        let name = match namespace_to_path(&artifacts.namespace) {
            dir if dir.is_empty() => file,
            dir => format!("{}/{}", dir, file),
        };
        let mut contents = serde_json::to_string_pretty(artifacts)?;
        contents.push('\n');
        Ok(vec![RenderedFile::new(name, contents)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::entity_codegen::generate_layout;
    use crate::codegen::mapping_spec::MappingSpec;
    use crate::layout::{ColumnDefinition, ColumnType, LayoutSchema};

    #[test]
    fn test_manifest_describes_records() {
        let schema = LayoutSchema::new(
            "Carrier",
            vec![
                ColumnDefinition::new("claimId", ColumnType::Numeric, 9).with_scale(0),
                ColumnDefinition::new("lineNumber", ColumnType::Numeric, 2).with_scale(0),
                ColumnDefinition::new("amount", ColumnType::Numeric, 10).with_scale(2).optional(),
            ],
        )
        .unwrap();
        let spec = MappingSpec::new("bluebutton::rif", "Carrier")
            .with_header_type("CarrierClaim")
            .with_header_id("claimId")
            .with_lines("CarrierClaimLines")
            .with_line_number("lineNumber");
        let artifacts = generate_layout(&schema, &spec).unwrap();

        let files = ManifestEmitter.render(&artifacts).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "bluebutton/rif/carrier_claim.layout.json");

        let manifest: serde_json::Value = serde_json::from_str(&files[0].contents).unwrap();
        assert_eq!(manifest["column_enum"]["entries"][2], "AMOUNT");
        assert_eq!(manifest["header"]["kind"], "header");
        assert_eq!(manifest["header"]["lines"]["order_by"], "line_number");
        assert_eq!(manifest["line"]["key"]["name"], "CarrierClaimLineId");
        assert_eq!(manifest["line"]["fields"][1]["meta"]["nullable"], true);
    }
}
