// src/config/options.rs
use std::path::{Path, PathBuf};

use super::consts::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Tsv,
}

impl ExportFormat {
    pub fn ext(&self) -> &'static str {
        match self { ExportFormat::Csv => "csv", ExportFormat::Tsv => "tsv" }
    }
    pub fn delim(&self) -> char {
        match self { ExportFormat::Csv => ',', ExportFormat::Tsv => '\t' }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    /// Directory holding batch JSON/CSV files; outputs land here unless a
    /// command is given an explicit path.
    pub dir: PathBuf,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Csv,
            dir: PathBuf::from("."),
        }
    }
}

impl ExportOptions {
    pub fn delim(&self) -> char {
        self.format.delim()
    }

    /// `<dir>/<stem>.<ext>`; the extension follows the export format.
    pub fn path_for(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{stem}.{}", self.format.ext()))
    }

    pub fn group_results_path(&self, group: u32) -> PathBuf {
        self.dir.join(group_results_file(group))
    }

    /// Batch files are always comma-separated; merge reads them back.
    pub fn group_data_path(&self, group: u32) -> PathBuf {
        self.dir.join(group_data_file(group))
    }

    pub fn base_data_path(&self) -> PathBuf {
        self.dir.join(BASE_DATA_FILE)
    }

    pub fn merged_data_path(&self) -> PathBuf {
        self.path_for(MERGED_DATA_STEM)
    }

    /// Resolve a user-supplied path: absolute paths are kept, relative ones
    /// are taken relative to `dir`.
    pub fn resolve(&self, p: &Path) -> PathBuf {
        if p.is_absolute() { p.to_path_buf() } else { self.dir.join(p) }
    }
}
