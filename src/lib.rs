// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! photoview: model layer of a geo-aware photo viewer
//!
//! Browses the photos of one directory ordered by name or EXIF date, filters
//! them by rating and keyword expressions, and places them on geo-referenced
//! map images. Front ends drive a [`ViewportModel`] and follow its
//! [`ModelEvent`]s.

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod geo;
pub mod keywords;
pub mod metadata;
pub mod model;
pub mod report;
pub mod session;
pub mod slideshow;

#[cfg(test)]
mod testing;

pub use catalog::{PhotoCatalog, PhotoPosition, SortOrder};
pub use config::AppConfig;
pub use error::{PhotoViewError, Result};
pub use geo::{GeoRefPoint, GeoReferenceEngine, LookupStore, MapParams};
pub use keywords::{KeywordExpression, Literal};
pub use metadata::{ExifMetadataReader, MetadataReader, PhotoRecord};
pub use model::{ModelEvent, ViewportModel};
pub use report::{ErrorReporter, Severity};
