//! Emitters render artifact descriptions into concrete output files.
//!
//! The generator decides which enumerations, fields and keys exist; an
//! emitter decides how to print them. Several emitters can run over the same
//! artifacts in one batch.

use serde::{Deserialize, Serialize};

use crate::codegen::artifact::LayoutArtifacts;
use crate::codegen::manifest::ManifestEmitter;
use crate::codegen::rust_codegen::{RustCodegenConfig, RustEmitter};
use crate::error::Result;

/// One file produced by an emitter, addressed by its output slot name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    /// Relative output name, e.g. `bluebutton/rif/carrier_claim.rs`
    pub name: String,
    pub contents: String,
}

impl RenderedFile {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// Renders the artifacts of a layout into files.
pub trait Emitter {
    /// Short identifier used in logs.
    fn id(&self) -> &'static str;

    /// Render one layout's artifacts.
    ///
    /// Files must come out in artifact order: enumeration, line type, header
    /// type.
    fn render(&self, artifacts: &LayoutArtifacts) -> Result<Vec<RenderedFile>>;

    /// Called once after every spec of a batch has been processed, with the
    /// artifacts that were generated successfully.
    ///
    /// Use this for files that index the whole batch, such as module lists.
    fn finish(&self, generated: &[LayoutArtifacts]) -> Result<Vec<RenderedFile>> {
        let _ = generated;
        Ok(Vec::new())
    }
}

/// Emitters selectable from project configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmitterKind {
    /// Rust structs and enums
    Rust,
    /// JSON description of the artifacts
    Manifest,
}

impl EmitterKind {
    pub fn build(&self, rust: &RustCodegenConfig) -> Box<dyn Emitter> {
        match self {
            EmitterKind::Rust => Box::new(RustEmitter::new(rust.clone())),
            EmitterKind::Manifest => Box::new(ManifestEmitter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silent;

    impl Emitter for Silent {
        fn id(&self) -> &'static str {
            "silent"
        }

        fn render(&self, _artifacts: &LayoutArtifacts) -> Result<Vec<RenderedFile>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_default_finish_is_empty() {
        assert!(Silent.finish(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_emitter_kinds() {
        let rust = RustCodegenConfig::default();
        assert_eq!(EmitterKind::Rust.build(&rust).id(), "rust");
        assert_eq!(EmitterKind::Manifest.build(&rust).id(), "manifest");
        let kinds: Vec<EmitterKind> = serde_yaml::from_str("[rust, manifest]").unwrap();
        assert_eq!(kinds, vec![EmitterKind::Rust, EmitterKind::Manifest]);
    }
}
