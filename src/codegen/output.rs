//! Destinations for generated files.
//!
//! Every output slot (relative file name) may be written once per run; a
//! second write to the same slot fails with [`Error::DuplicateOutput`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::error::{Error, Result};

/// Receives generated files by relative name.
pub trait OutputSink {
    fn write(&mut self, name: &str, contents: &str) -> Result<()>;

    /// True if `name` was already written during this run.
    fn contains(&self, name: &str) -> bool;
}

/// Keeps generated files in memory, in write order.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    files: IndexMap<String, String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn into_files(self) -> IndexMap<String, String> {
        self.files
    }
}

impl OutputSink for MemorySink {
    fn write(&mut self, name: &str, contents: &str) -> Result<()> {
        if self.files.contains_key(name) {
            return Err(Error::DuplicateOutput { name: name.to_string() });
        }
        self.files.insert(name.to_string(), contents.to_string());
        Ok(())
    }

    fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }
}

/// Writes generated files below a root directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
    written: IndexSet<String>,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            written: IndexSet::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names written so far, in write order.
    pub fn written(&self) -> impl Iterator<Item = &str> {
        self.written.iter().map(String::as_str)
    }
}

impl OutputSink for DirectorySink {
    fn write(&mut self, name: &str, contents: &str) -> Result<()> {
        if self.written.contains(name) {
            return Err(Error::DuplicateOutput { name: name.to_string() });
        }
        let path = self.root.join(name);
        write_file(&path, contents)?;
        debug!(path = %path.display(), bytes = contents.len(), "wrote output");
        self.written.insert(name.to_string());
        Ok(())
    }

    fn contains(&self, name: &str) -> bool {
        self.written.contains(name)
    }
}

/// Write `contents` to `path`, creating parent directories.
pub fn write_file(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}
