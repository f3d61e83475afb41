// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for photoview

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for photoview operations
pub type Result<T> = std::result::Result<T, PhotoViewError>;

/// photoview error types
#[derive(Error, Debug)]
pub enum PhotoViewError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Could not read metadata of file {file}: {reason}")]
    Metadata { file: String, reason: String },

    #[error("EXIF error: {0}")]
    Exif(#[from] exif::Error),

    #[error("XMP error: {0}")]
    Xmp(#[from] quick_xml::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not read map image from file {path:?}: {reason}")]
    MapUnavailable { path: PathBuf, reason: String },

    #[error("Could not delete file {path:?}: {reason}")]
    Delete { path: PathBuf, reason: String },

    #[error("Could not copy file {file}: {reason}")]
    Export { file: String, reason: String },

    #[error("Slide show error: {0}")]
    SlideShow(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),
}

impl PhotoViewError {
    /// Build a metadata error for the given file
    pub fn metadata(file: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Metadata {
            file: file.into(),
            reason: reason.to_string(),
        }
    }
}
