// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Copy photos to another directory, optionally renaming them
//!
//! A file name template has the form `prefix[digits][.suffix]`, e.g.
//! `Scotland2012-005.jpg`. Exported files are numbered after the digits
//! (`Scotland2012-006.jpg`, `Scotland2012-007.jpg`, ...). Without digits the
//! counter starts at 1; without a suffix each copy keeps its source
//! extension.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::report::ErrorReporter;
use crate::PhotoViewError;

#[derive(Debug, Clone, PartialEq, Eq)]
struct NameTemplate {
    prefix: String,
    suffix: Option<String>,
    width: usize,
    next_index: u64,
}

impl NameTemplate {
    fn parse(template: &str) -> Self {
        let (stem, suffix) = match template.rfind('.') {
            Some(pos) => (&template[..pos], Some(template[pos..].to_string())),
            None => (template, None),
        };
        let prefix = stem.trim_end_matches(|c: char| c.is_ascii_digit());
        let digits = &stem[prefix.len()..];
        let next_index = digits.parse::<u64>().map(|n| n + 1).unwrap_or(1);

        Self {
            prefix: prefix.to_string(),
            suffix,
            width: digits.len(),
            next_index,
        }
    }

    fn next_name(&mut self, source_name: &str) -> String {
        let mut name = format!("{}{:0width$}", self.prefix, self.next_index, width = self.width);
        self.next_index += 1;
        match &self.suffix {
            Some(suffix) => name.push_str(suffix),
            None => {
                if let Some(pos) = source_name.rfind('.') {
                    name.push_str(&source_name[pos..]);
                }
            }
        }
        name
    }
}

/// Copies files into a destination directory
#[derive(Debug, Clone)]
pub struct PhotoExporter {
    dest_dir: PathBuf,
    template: Option<NameTemplate>,
}

impl PhotoExporter {
    /// An empty or missing template keeps the source file names
    pub fn new(dest_dir: impl Into<PathBuf>, template: Option<&str>) -> Self {
        Self {
            dest_dir: dest_dir.into(),
            template: template.filter(|t| !t.is_empty()).map(NameTemplate::parse),
        }
    }

    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    /// Copy all files, never overwriting existing ones.
    ///
    /// Failures are reported as warnings and skipped. Returns the number of
    /// files copied.
    pub fn copy_files(&mut self, files: &[PathBuf], reporter: &dyn ErrorReporter) -> usize {
        if let Some(template) = self.template.as_mut() {
            let needed = files.len().to_string().len();
            if !files.is_empty() && template.width < needed {
                template.width = needed;
            }
        }

        let mut copied = 0;
        for file in files {
            let source_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let dest_name = self.dest_file_name(&source_name);
            let dest = self.dest_dir.join(&dest_name);

            match copy_new(file, &dest) {
                Ok(bytes) => {
                    debug!("Copied {:?} to {:?} ({} bytes)", file, dest, bytes);
                    copied += 1;
                }
                Err(e) => reporter.warning(&PhotoViewError::Export {
                    file: source_name,
                    reason: e.to_string(),
                }),
            }
        }
        info!("Exported {} of {} files to {:?}", copied, files.len(), self.dest_dir);
        copied
    }

    fn dest_file_name(&mut self, source_name: &str) -> String {
        match self.template.as_mut() {
            Some(template) => template.next_name(source_name),
            None => source_name.to_string(),
        }
    }
}

fn copy_new(source: &Path, dest: &Path) -> io::Result<u64> {
    let mut input = File::open(source)?;
    let mut output = OpenOptions::new().write(true).create_new(true).open(dest)?;
    io::copy(&mut input, &mut output)
}
