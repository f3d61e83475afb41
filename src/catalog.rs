// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Photo catalog for the current directory
//!
//! The catalog collects metadata for all photos of one directory, keeps them
//! in a selectable order (file name or EXIF date), filters them by rating and
//! keyword expression, and navigates circularly through the visible subset.
//!
//! Records live in a map keyed by file name. The ordering is a separate vector
//! of file names, so a record's index is simply its position in that vector.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::geo::IndexedGeoPoint;
use crate::keywords::KeywordExpression;
use crate::metadata::{MetadataReader, PhotoRecord};
use crate::report::ErrorReporter;
use crate::PhotoViewError;

/// Ordering criterion for the photos of a directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    FileName,
    /// EXIF date ascending, undated photos last
    Date,
}

impl SortOrder {
    pub fn from_sort_by_date(sort_by_date: bool) -> Self {
        if sort_by_date {
            Self::Date
        } else {
            Self::FileName
        }
    }

    pub fn is_by_date(self) -> bool {
        self == Self::Date
    }

    fn compare(self, a: &PhotoRecord, b: &PhotoRecord) -> Ordering {
        match self {
            Self::FileName => a.file_name.cmp(&b.file_name),
            Self::Date => match (&a.date, &b.date) {
                (Some(x), Some(y)) => x.cmp(y).then_with(|| a.file_name.cmp(&b.file_name)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => a.file_name.cmp(&b.file_name),
            },
        }
    }
}

/// Geo position of a visible photo together with its catalog index
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoPosition {
    pub index: usize,
    pub file_name: String,
    pub lat: f64,
    pub lon: f64,
}

impl IndexedGeoPoint for PhotoPosition {
    fn index(&self) -> usize {
        self.index
    }

    fn lat(&self) -> f64 {
        self.lat
    }

    fn lon(&self) -> f64 {
        self.lon
    }
}

/// Complete result of scanning one directory.
///
/// A scan is built off to the side and installed in one step, so a catalog
/// never exposes a partially scanned directory.
#[derive(Debug, Clone)]
pub struct DirectoryScan {
    directory: PathBuf,
    records: Vec<PhotoRecord>,
    keywords: Vec<String>,
    keyword_counts: Vec<usize>,
}

impl DirectoryScan {
    fn empty(directory: PathBuf) -> Self {
        Self {
            directory,
            records: Vec::new(),
            keywords: Vec::new(),
            keyword_counts: Vec::new(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn records(&self) -> &[PhotoRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Read metadata for every file in `dir`.
///
/// Files whose metadata cannot be read are kept as degraded records when they
/// have a supported image format and skipped otherwise. An unreadable
/// directory yields an empty scan.
pub fn scan_directory(
    dir: &Path,
    reader: &dyn MetadataReader,
    reporter: &dyn ErrorReporter,
) -> DirectoryScan {
    let mut scan = DirectoryScan::empty(dir.to_path_buf());

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            reporter.warning(&PhotoViewError::FileSystem(e));
            return scan;
        }
    };

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!("Skipping unreadable entry in {:?}: {}", dir, e);
                continue;
            }
        };
        if path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
            warn!("Skipping file with non UTF-8 name: {:?}", path);
            continue;
        };

        match reader.read(&path) {
            Ok(mut record) => {
                record.file_name = name;
                for keyword in &record.keywords {
                    *counts.entry(keyword.clone()).or_insert(0) += 1;
                }
                scan.records.push(record);
            }
            Err(e) => {
                if reader.is_image_format_supported(&path) {
                    let err = match e {
                        PhotoViewError::Metadata { .. } => e,
                        other => PhotoViewError::metadata(name.clone(), other),
                    };
                    reporter.warning(&err);
                    scan.records.push(PhotoRecord::degraded(name));
                } else {
                    debug!("Skipping non-image file: {:?}", path);
                }
            }
        }
    }

    let (keywords, keyword_counts) = counts.into_iter().unzip();
    scan.keywords = keywords;
    scan.keyword_counts = keyword_counts;

    info!("Scanned {:?}: {} photos, {} keywords", dir, scan.records.len(), scan.keywords.len());
    scan
}

/// [`scan_directory`] on the blocking thread pool
pub async fn scan_directory_async(
    dir: PathBuf,
    reader: Arc<dyn MetadataReader>,
    reporter: Arc<dyn ErrorReporter>,
) -> DirectoryScan {
    let fallback = dir.clone();
    let task_reporter = reporter.clone();
    let task = tokio::task::spawn_blocking(move || {
        scan_directory(&dir, reader.as_ref(), task_reporter.as_ref())
    });
    match task.await {
        Ok(scan) => scan,
        Err(e) => {
            reporter.error(&PhotoViewError::metadata(fallback.display().to_string(), e));
            DirectoryScan::empty(fallback)
        }
    }
}

/// Ordered, filterable collection of the photos in one directory
#[derive(Debug, Default)]
pub struct PhotoCatalog {
    directory: Option<PathBuf>,
    records: HashMap<String, PhotoRecord>,
    /// File names in the active order; position = index
    order: Vec<String>,
    positions: HashMap<String, usize>,
    visible: HashSet<String>,
    all_keywords: Vec<String>,
    keyword_counts: Vec<usize>,
    selected: Option<String>,
    sort_order: SortOrder,
    min_rating: u8,
    expression: KeywordExpression,
}

impl PhotoCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch to `dir`, rescanning only if it differs from the current one.
    ///
    /// Always clears the selection and applies `order`. A rescan resets the
    /// visibility filter. Returns true if the directory changed.
    pub fn set_directory(
        &mut self,
        dir: &Path,
        order: SortOrder,
        reader: &dyn MetadataReader,
        reporter: &dyn ErrorReporter,
    ) -> bool {
        self.clear_selection();
        let changed = self.directory.as_deref() != Some(dir);
        if changed {
            let scan = scan_directory(dir, reader, reporter);
            self.install_scan(scan);
        }
        self.set_sort_order(order);
        changed
    }

    /// Replace the whole catalog with a finished scan
    pub fn install_scan(&mut self, scan: DirectoryScan) {
        let DirectoryScan {
            directory,
            records,
            keywords,
            keyword_counts,
        } = scan;

        self.order = records.iter().map(|r| r.file_name.clone()).collect();
        self.records = records.into_iter().map(|r| (r.file_name.clone(), r)).collect();
        self.all_keywords = keywords;
        self.keyword_counts = keyword_counts;
        self.directory = Some(directory);
        self.selected = None;
        self.sort();
        self.set_visibility(0, KeywordExpression::new());
    }

    pub fn set_sort_order(&mut self, order: SortOrder) {
        self.sort_order = order;
        self.sort();
    }

    fn sort(&mut self) {
        let records = &self.records;
        let order = self.sort_order;
        self.order
            .sort_by(|a, b| match (records.get(a), records.get(b)) {
                (Some(ra), Some(rb)) => order.compare(ra, rb),
                _ => a.cmp(b),
            });
        self.reindex();
    }

    fn reindex(&mut self) {
        self.positions = self
            .order
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
    }

    /// Recompute the visible subset: rating at least `min_rating` and
    /// keywords accepted by `expression`
    pub fn set_visibility(&mut self, min_rating: u8, expression: KeywordExpression) {
        self.min_rating = min_rating;
        self.expression = expression;
        self.visible = self
            .records
            .values()
            .filter(|r| r.rating >= min_rating && self.expression.evaluate(&r.keywords))
            .map(|r| r.file_name.clone())
            .collect();
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn select_first(&mut self) -> Option<PathBuf> {
        self.selected = None;
        self.select_next()
    }

    pub fn select_next(&mut self) -> Option<PathBuf> {
        self.step(true)
    }

    pub fn select_previous(&mut self) -> Option<PathBuf> {
        self.step(false)
    }

    /// Walk the full order circularly from the selection and stop at the
    /// first visible photo
    fn step(&mut self, forward: bool) -> Option<PathBuf> {
        let n = self.order.len();
        let mut candidate = self.selected_index();
        let mut found = None;
        if !self.visible.is_empty() {
            for _ in 0..n {
                let next = match (candidate, forward) {
                    (None, true) => 0,
                    (None, false) => n - 1,
                    (Some(i), true) => (i + 1) % n,
                    (Some(i), false) => (i + n - 1) % n,
                };
                candidate = Some(next);
                if self.visible.contains(&self.order[next]) {
                    found = Some(next);
                    break;
                }
            }
        }
        self.selected = found.map(|i| self.order[i].clone());
        self.selected_file()
    }

    /// Select by exact file name. Keeps the previous selection if not found.
    pub fn select_by_file_name(&mut self, file_name: &str) -> Option<PathBuf> {
        if self.records.contains_key(file_name) {
            self.selected = Some(file_name.to_string());
            self.selected_file()
        } else {
            None
        }
    }

    /// Delete the selected photo from disk and from the catalog, then move on
    /// to the next visible photo. Returns true if a file was deleted.
    pub fn delete_selected(&mut self, reporter: &dyn ErrorReporter) -> bool {
        let (Some(index), Some(path)) = (self.selected_index(), self.selected_file()) else {
            return false;
        };

        if let Err(e) = std::fs::remove_file(&path) {
            reporter.warning(&PhotoViewError::Delete {
                path,
                reason: e.to_string(),
            });
            return false;
        }
        info!("Deleted {:?}", path);

        let name = self.order.remove(index);
        self.visible.remove(&name);
        if let Some(record) = self.records.remove(&name) {
            for keyword in &record.keywords {
                if let Ok(pos) = self.all_keywords.binary_search(keyword) {
                    self.keyword_counts[pos] = self.keyword_counts[pos].saturating_sub(1);
                }
            }
        }
        self.reindex();

        // Start from the predecessor so the next photo takes the deleted one's place.
        self.selected = None;
        if !self.visible.is_empty() {
            if index > 0 {
                self.selected = Some(self.order[index - 1].clone());
            }
            self.select_next();
        }
        true
    }

    pub fn current_directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn min_rating(&self) -> u8 {
        self.min_rating
    }

    pub fn visibility_expression(&self) -> &KeywordExpression {
        &self.expression
    }

    pub fn visible_photo_count(&self) -> usize {
        self.visible.len()
    }

    pub fn is_visible(&self, file_name: &str) -> bool {
        self.visible.contains(file_name)
    }

    /// Files of all visible photos in the active order
    pub fn visible_photos(&self) -> Vec<PathBuf> {
        self.order
            .iter()
            .filter(|name| self.visible.contains(*name))
            .filter_map(|name| self.path_of(name))
            .collect()
    }

    /// Positions of all visible photos in the active order. Photos without
    /// GPS data carry NaN coordinates.
    pub fn visible_photo_positions(&self) -> Vec<PhotoPosition> {
        self.order
            .iter()
            .enumerate()
            .filter(|(_, name)| self.visible.contains(*name))
            .filter_map(|(index, name)| {
                self.records.get(name).map(|r| PhotoPosition {
                    index,
                    file_name: r.file_name.clone(),
                    lat: r.lat,
                    lon: r.lon,
                })
            })
            .collect()
    }

    /// All keywords of the directory, sorted
    pub fn all_keywords(&self) -> &[String] {
        &self.all_keywords
    }

    /// Occurrence count for each entry of [`all_keywords`](Self::all_keywords)
    pub fn keyword_counts(&self) -> &[usize] {
        &self.keyword_counts
    }

    pub fn current_record(&self) -> Option<&PhotoRecord> {
        self.selected.as_ref().and_then(|n| self.records.get(n))
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected.as_ref().and_then(|n| self.positions.get(n).copied())
    }

    pub fn selected_file(&self) -> Option<PathBuf> {
        self.selected.as_ref().and_then(|n| self.path_of(n))
    }

    pub fn record(&self, file_name: &str) -> Option<&PhotoRecord> {
        self.records.get(file_name)
    }

    pub fn index_of(&self, file_name: &str) -> Option<usize> {
        self.positions.get(file_name).copied()
    }

    /// Records in the active order
    pub fn records(&self) -> impl Iterator<Item = &PhotoRecord> + '_ {
        self.order.iter().filter_map(|name| self.records.get(name))
    }

    fn path_of(&self, file_name: &str) -> Option<PathBuf> {
        self.directory.as_ref().map(|d| d.join(file_name))
    }
}
