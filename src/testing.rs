// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Fixtures shared by the unit tests

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::metadata::{MetadataReader, PhotoRecord};
use crate::{PhotoViewError, Result};

/// Reader that serves canned records by file name
#[derive(Debug, Default, Clone)]
pub struct FakeReader {
    records: HashMap<String, PhotoRecord>,
    failing: HashSet<String>,
}

impl FakeReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, record: PhotoRecord) -> Self {
        self.records.insert(record.file_name.clone(), record);
        self
    }

    /// Extraction for this file name fails
    pub fn failing(mut self, file_name: &str) -> Self {
        self.failing.insert(file_name.to_string());
        self
    }
}

impl MetadataReader for FakeReader {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn read(&self, path: &Path) -> Result<PhotoRecord> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        if self.failing.contains(&name) {
            return Err(PhotoViewError::metadata(name, "corrupt header"));
        }
        self.records
            .get(&name)
            .cloned()
            .ok_or(PhotoViewError::UnsupportedFileType(name))
    }
}

/// Temporary directory containing one empty file per name
pub fn photo_dir(names: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for name in names {
        std::fs::write(dir.path().join(name), b"").unwrap();
    }
    dir
}

/// Directory plus a reader that knows a plain record for every name
pub fn plain_photos(names: &[&str]) -> (TempDir, FakeReader) {
    let dir = photo_dir(names);
    let reader = names
        .iter()
        .fold(FakeReader::new(), |r, n| r.with(PhotoRecord::degraded(*n)));
    (dir, reader)
}

pub fn file_names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(String::from))
        .collect()
}
