//! Tabular layout resources.
//!
//! A resource is a set of named sections, each a grid of text cells. Three
//! shapes are supported:
//!
//! - an `.xlsx` workbook, one section per worksheet
//! - a directory of `.csv` files, one section per file (named by file stem)
//! - an in-memory [`Workbook`] built by the caller

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, info};
use umya_spreadsheet::helper::coordinate::coordinate_from_index;

use crate::error::{Error, Result};

/// Read access to the sections of a layout resource.
pub trait LayoutSource {
    /// Display name of the resource, used in diagnostics.
    fn resource_name(&self) -> &str;

    /// All rows of `section`, header row included.
    ///
    /// Fails with [`Error::SchemaNotFound`] when the section does not exist.
    fn section_rows(&self, section: &str) -> Result<Vec<Vec<String>>>;

    fn section_names(&self) -> Vec<String>;
}

/// Layout resource held in memory.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    name: String,
    sections: IndexMap<String, Vec<Vec<String>>>,
}

impl Workbook {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sections: IndexMap::new(),
        }
    }

    /// Add (or replace) a section.
    pub fn with_section<R, C>(mut self, section: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        self.sections.insert(section.into(), rows);
        self
    }

    /// Open a layout resource from disk, choosing the reader by shape:
    /// directories are read as CSV sections, `.xlsx`/`.xlsm` files as
    /// workbooks, and a single `.csv` file as one section.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::SchemaNotFound {
                resource: path.display().to_string(),
                section: None,
            });
        }

        if path.is_dir() {
            return Self::from_csv_dir(path);
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("xlsx") | Some("xlsm") => Self::from_xlsx(path),
            Some("csv") => Self::from_csv_file(path),
            _ => Err(Error::SchemaNotFound {
                resource: path.display().to_string(),
                section: None,
            }),
        }
    }

    /// Load every worksheet of an `.xlsx` workbook.
    pub fn from_xlsx(path: &Path) -> Result<Self> {
        let book = umya_spreadsheet::reader::xlsx::read(path)
            .map_err(|e| Error::Spreadsheet(format!("{}: {}", path.display(), e)))?;

        let mut workbook = Self::new(path.display().to_string());
        for sheet in book.get_sheet_collection() {
            let (max_col, max_row) = sheet.get_highest_column_and_row();
            let mut rows = Vec::with_capacity(max_row as usize);
            for row in 1..=max_row {
                let cells = (1..=max_col)
                    .map(|col| {
                        let address = coordinate_from_index(&col, &row);
                        sheet
                            .get_cell(address.as_str())
                            .map(|cell| cell.get_value().to_string())
                            .unwrap_or_default()
                    })
                    .collect();
                rows.push(cells);
            }
            debug!(sheet = sheet.get_name(), rows = rows.len(), "loaded worksheet");
            workbook.sections.insert(sheet.get_name().to_string(), rows);
        }

        info!(resource = %path.display(), sections = workbook.sections.len(), "opened layout workbook");
        Ok(workbook)
    }

    /// Load every `.csv` file in `dir`, in file name order.
    pub fn from_csv_dir(dir: &Path) -> Result<Self> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
            })
            .collect();
        paths.sort();

        let mut workbook = Self::new(dir.display().to_string());
        for path in paths {
            let section = section_name(&path);
            workbook.sections.insert(section, read_csv_rows(&path)?);
        }

        info!(resource = %dir.display(), sections = workbook.sections.len(), "opened layout directory");
        Ok(workbook)
    }

    pub fn from_csv_file(path: &Path) -> Result<Self> {
        let mut workbook = Self::new(path.display().to_string());
        workbook.sections.insert(section_name(path), read_csv_rows(path)?);
        Ok(workbook)
    }
}

impl LayoutSource for Workbook {
    fn resource_name(&self) -> &str {
        &self.name
    }

    fn section_rows(&self, section: &str) -> Result<Vec<Vec<String>>> {
        self.sections
            .get(section)
            .cloned()
            .ok_or_else(|| Error::SchemaNotFound {
                resource: self.name.clone(),
                section: Some(section.to_string()),
            })
    }

    fn section_names(&self) -> Vec<String> {
        self.sections.keys().cloned().collect()
    }
}

fn section_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn read_csv_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|cell| cell.trim_start_matches('\u{feff}').to_string())
                .collect(),
        );
    }
    Ok(rows)
}
