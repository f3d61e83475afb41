// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Photo metadata records and the readers that produce them

pub mod container;
pub mod iptc;
pub mod reader;
pub mod xmp;

use chrono::NaiveDateTime;
use std::collections::BTreeSet;
use std::path::Path;

use crate::Result;

pub use self::reader::ExifMetadataReader;

/// Selected metadata of one photo in the current directory.
///
/// Identity is the file name. The position of a record in the active ordering
/// is owned by the catalog, not by the record.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoRecord {
    pub file_name: String,
    pub caption: Option<String>,
    /// 0 to 5
    pub rating: u8,
    /// EXIF DateTimeOriginal
    pub date: Option<NaiveDateTime>,
    pub camera_model: Option<String>,
    /// EXIF orientation tag, 0 if unknown
    pub orientation: u16,
    /// Latitude in degrees, NaN if unknown
    pub lat: f64,
    /// Longitude in degrees, NaN if unknown
    pub lon: f64,
    pub keywords: BTreeSet<String>,
}

impl PhotoRecord {
    /// Record carrying nothing but the file name, used when extraction fails
    pub fn degraded(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            caption: None,
            rating: 0,
            date: None,
            camera_model: None,
            orientation: 0,
            lat: f64::NAN,
            lon: f64::NAN,
            keywords: BTreeSet::new(),
        }
    }

    /// True if both latitude and longitude are known
    pub fn has_position(&self) -> bool {
        !self.lat.is_nan() && !self.lon.is_nan()
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_position(mut self, lat: f64, lon: f64) -> Self {
        self.lat = lat;
        self.lon = lon;
        self
    }
}

/// Source of photo metadata, queried once per file during a directory scan
pub trait MetadataReader: Send + Sync {
    /// Name of this reader
    fn name(&self) -> &'static str;

    /// Extract metadata for a single file
    fn read(&self, path: &Path) -> Result<PhotoRecord>;

    /// Whether the file has an image format the application can show.
    ///
    /// Files for which [`read`](Self::read) fails are kept as degraded
    /// records only when this returns true.
    fn is_image_format_supported(&self, path: &Path) -> bool {
        decoder_supports(path)
    }
}

/// Registry of image formats, backed by the `image` crate decoders plus
/// configured extra extensions
#[derive(Debug, Clone, Default)]
pub struct FormatRegistry {
    extra_extensions: Vec<String>,
}

impl FormatRegistry {
    pub fn new<I, S>(extra_extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extra_extensions: extra_extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    pub fn is_supported(&self, path: &Path) -> bool {
        if decoder_supports(path) {
            return true;
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => self
                .extra_extensions
                .iter()
                .any(|e| e.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }

    pub fn extra_extensions(&self) -> &[String] {
        &self.extra_extensions
    }
}

fn decoder_supports(path: &Path) -> bool {
    image::ImageFormat::from_path(path)
        .map(|f| f.reading_enabled())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degraded_record_is_empty() {
        let record = PhotoRecord::degraded("IMG_0001.jpg");
        assert_eq!(record.file_name, "IMG_0001.jpg");
        assert_eq!(record.rating, 0);
        assert!(record.caption.is_none());
        assert!(record.date.is_none());
        assert!(record.keywords.is_empty());
        assert!(!record.has_position());
    }

    #[test]
    fn test_position_requires_both_coordinates() {
        let record = PhotoRecord::degraded("a.jpg").with_position(48.1, f64::NAN);
        assert!(!record.has_position());
        let record = record.with_position(48.1, 11.5);
        assert!(record.has_position());
    }

    #[test]
    fn test_format_registry() {
        let registry = FormatRegistry::new([".HEIC", "dng"]);
        assert!(registry.is_supported(Path::new("/photos/a.jpg")));
        assert!(registry.is_supported(Path::new("/photos/a.PNG")));
        assert!(registry.is_supported(Path::new("/photos/a.heic")));
        assert!(registry.is_supported(Path::new("/photos/a.DNG")));
        assert!(!registry.is_supported(Path::new("/photos/notes.txt")));
        assert!(!registry.is_supported(Path::new("/photos/README")));
    }
}
