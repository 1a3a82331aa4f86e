//! Record type generation for tabular layouts.
//!
//! A layout is paired with a [`MappingSpec`], resolved into language-neutral
//! [`LayoutArtifacts`] and rendered by one or more [`Emitter`]s into named
//! output slots.

pub mod artifact;
pub mod emitter;
pub mod entity_codegen;
pub mod manifest;
pub mod mapping_spec;
pub mod orchestration;
pub mod output;
pub mod project_config;
pub mod rust_codegen;
pub mod type_resolver;
pub mod utils;

// Re-export key types
pub use artifact::{EnumArtifact, FieldSpec, KeySpec, LayoutArtifacts, RecordArtifact, RecordKind};
pub use emitter::{Emitter, EmitterKind, RenderedFile};
pub use entity_codegen::{generate_layout, EntityCodeGenerator};
pub use manifest::ManifestEmitter;
pub use mapping_spec::{ColumnRef, LineSpec, MappingSpec};
pub use orchestration::{generate_from_config, process, validate_config, BatchGenerator, BatchReport};
pub use output::{DirectorySink, MemorySink, OutputSink};
pub use project_config::{LayoutConfig, LinesConfig, ProjectConfig};
pub use rust_codegen::{RustCodegenConfig, RustEmitter};
pub use type_resolver::{resolve, AccessorType, ResolvedType, ValueType};
