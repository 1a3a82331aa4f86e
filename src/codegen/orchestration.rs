//! Batch generation: the top-level entry point of a run.
//!
//! Specs are processed in the order supplied. A failing spec is reported
//! through [`Diagnostics`] and writes nothing; the batch moves on to the next
//! spec. The entry point itself never fails.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! fn main() {
//!     let report = rifgen::codegen::generate_from_config(Path::new("layouts.yaml"), None)
//!         .expect("unreadable config");
//!     for diagnostic in report.diagnostics.entries() {
//!         println!("{}", diagnostic);
//!     }
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::codegen::artifact::LayoutArtifacts;
use crate::codegen::emitter::{Emitter, RenderedFile};
use crate::codegen::entity_codegen::EntityCodeGenerator;
use crate::codegen::mapping_spec::MappingSpec;
use crate::codegen::output::{DirectorySink, MemorySink, OutputSink};
use crate::codegen::project_config::ProjectConfig;
use crate::codegen::rust_codegen::RustEmitter;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::layout::{LayoutParser, LayoutSource, Workbook};

/// Outcome of one generation run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub diagnostics: Diagnostics,
    /// Header types generated successfully, in processing order
    pub generated: Vec<String>,
    /// Header types of the specs that failed
    pub failed: Vec<String>,
    /// Output slots written during the run
    pub outputs: Vec<String>,
}

impl BatchReport {
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty() && !self.diagnostics.has_errors()
    }
}

/// Runs a batch of mapping specs through the generator and emitters.
pub struct BatchGenerator {
    parser: LayoutParser,
    generator: EntityCodeGenerator,
    emitters: Vec<Box<dyn Emitter>>,
    transcript: bool,
}

impl Default for BatchGenerator {
    fn default() -> Self {
        Self::new(vec![Box::new(RustEmitter::default())])
    }
}

impl BatchGenerator {
    pub fn new(emitters: Vec<Box<dyn Emitter>>) -> Self {
        Self {
            parser: LayoutParser::new(),
            generator: EntityCodeGenerator::new(),
            emitters,
            transcript: true,
        }
    }

    /// Whether to write the diagnostics transcript at the end of the run.
    pub fn with_transcript(mut self, transcript: bool) -> Self {
        self.transcript = transcript;
        self
    }

    pub fn process(
        &self,
        specs: &[MappingSpec],
        source: &dyn LayoutSource,
        sink: &mut dyn OutputSink,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        let mut generated: Vec<LayoutArtifacts> = Vec::with_capacity(specs.len());

        info!(
            resource = source.resource_name(),
            specs = specs.len(),
            emitters = self.emitters.len(),
            "starting generation run"
        );

        for spec in specs {
            match self.process_spec(spec, source, sink, &mut report.outputs) {
                Ok(artifacts) => {
                    info!(spec = %spec.header_type, section = %spec.section, "generated layout");
                    report.generated.push(spec.header_type.clone());
                    generated.push(artifacts);
                }
                Err(e) => {
                    report.diagnostics.error_from(&e.in_spec(spec.header_type.clone()));
                    report.failed.push(spec.header_type.clone());
                }
            }
        }

        for emitter in &self.emitters {
            let committed = emitter
                .finish(&generated)
                .and_then(|files| commit(&files, sink, &mut report.outputs));
            if let Err(e) = committed {
                report.diagnostics.error_from(&e);
            }
        }

        self.close(report, sink)
    }

    /// Report every spec as failed without reading anything, e.g. when the
    /// layout resource itself cannot be opened.
    pub fn fail_all(&self, specs: &[MappingSpec], err: &Error, sink: &mut dyn OutputSink) -> BatchReport {
        let mut report = BatchReport::default();
        report.diagnostics.error_from(err);
        report.failed = specs.iter().map(|spec| spec.header_type.clone()).collect();
        self.close(report, sink)
    }

    fn close(&self, mut report: BatchReport, sink: &mut dyn OutputSink) -> BatchReport {
        report.diagnostics.note(
            None,
            format!(
                "generated {} of {} layouts, {} outputs",
                report.generated.len(),
                report.generated.len() + report.failed.len(),
                report.outputs.len()
            ),
        );

        if self.transcript {
            match report.diagnostics.write_transcript(sink) {
                Ok(()) => report.outputs.push(crate::diagnostics::TRANSCRIPT_NAME.to_string()),
                Err(e) => {
                    warn!(error = %e, "failed to write transcript");
                    report.diagnostics.error_from(&e);
                }
            }
        }
        report
    }

    /// Parse, generate and render one spec; write only if every step succeeds.
    fn process_spec(
        &self,
        spec: &MappingSpec,
        source: &dyn LayoutSource,
        sink: &mut dyn OutputSink,
        outputs: &mut Vec<String>,
    ) -> Result<LayoutArtifacts> {
        let schema = self.parser.parse(source, &spec.section)?;
        let artifacts = self.generator.generate(&schema, spec)?;

        let mut staged = Vec::new();
        for emitter in &self.emitters {
            let files = emitter.render(&artifacts)?;
            debug!(emitter = emitter.id(), files = files.len(), spec = %spec.header_type, "rendered");
            staged.extend(files);
        }

        commit(&staged, sink, outputs)?;
        Ok(artifacts)
    }
}

/// Write `files`, refusing the whole set if any slot is already taken.
fn commit(files: &[RenderedFile], sink: &mut dyn OutputSink, outputs: &mut Vec<String>) -> Result<()> {
    let mut names = HashSet::with_capacity(files.len());
    for file in files {
        if sink.contains(&file.name) || !names.insert(file.name.as_str()) {
            return Err(Error::DuplicateOutput {
                name: file.name.clone(),
            });
        }
    }
    for file in files {
        sink.write(&file.name, &file.contents)?;
        outputs.push(file.name.clone());
    }
    Ok(())
}

/// Run `specs` with the Rust emitter, writing the transcript.
pub fn process(specs: &[MappingSpec], source: &dyn LayoutSource, sink: &mut dyn OutputSink) -> BatchReport {
    BatchGenerator::default().process(specs, source, sink)
}

fn load_config(config_path: &Path) -> Result<ProjectConfig> {
    let config = ProjectConfig::from_file(config_path)?;
    config.validate().map_err(|message| Error::Config {
        path: config_path.to_path_buf(),
        message,
    })?;
    Ok(config)
}

fn config_dir(config_path: &Path) -> &Path {
    config_path.parent().unwrap_or_else(|| Path::new("."))
}

/// Generate everything a project config describes.
///
/// Fails only when the config itself cannot be loaded; every other failure
/// is reported in the returned [`BatchReport`]. `output` overrides the
/// configured output directory.
pub fn generate_from_config(config_path: &Path, output: Option<&Path>) -> Result<BatchReport> {
    let config = load_config(config_path)?;
    let base = config_dir(config_path);
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.output_path(base));

    info!(config = %config_path.display(), output = %output.display(), "loaded project config");

    let batch = BatchGenerator::new(config.emitters()).with_transcript(config.transcript);
    let specs = config.to_jobs();
    let mut sink = DirectorySink::new(output);

    let report = match Workbook::open(config.resource_path(base)) {
        Ok(workbook) => batch.process(&specs, &workbook, &mut sink),
        Err(e) => batch.fail_all(&specs, &e, &mut sink),
    };
    Ok(report)
}

/// Parse and generate every configured layout without writing files.
pub fn validate_config(config_path: &Path) -> Result<BatchReport> {
    let config = load_config(config_path)?;
    let base = config_dir(config_path);

    let batch = BatchGenerator::new(config.emitters()).with_transcript(false);
    let specs = config.to_jobs();
    let mut sink = MemorySink::new();

    let report = match Workbook::open(config.resource_path(base)) {
        Ok(workbook) => batch.process(&specs, &workbook, &mut sink),
        Err(e) => batch.fail_all(&specs, &e, &mut sink),
    };
    Ok(report)
}
