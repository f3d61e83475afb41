// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for photoview

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// Directory scanning and ordering
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Map display and hit testing
    #[serde(default)]
    pub map: MapConfig,

    /// Slide show settings
    #[serde(default)]
    pub slideshow: SlideShowConfig,

    /// Where session state is kept
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CatalogConfig {
    /// Extensions treated as images in addition to those the decoders know
    #[serde(default = "default_extra_extensions")]
    pub extra_image_extensions: Vec<String>,
    #[serde(default)]
    pub sort_by_date: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MapConfig {
    /// Maximum distance in image pixels for hits on markers
    #[serde(default = "default_hit_radius")]
    pub hit_radius: f64,
    /// Extra distance within which clustered photo markers count as one hit
    #[serde(default = "default_cluster_tolerance")]
    pub cluster_tolerance: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SlideShowConfig {
    #[serde(default = "default_slideshow_secs")]
    pub interval_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    /// SQLite file holding the map parameter lookup table
    #[serde(default = "default_lookup_path")]
    pub map_lookup_path: String,
    /// JSON file holding session properties
    #[serde(default = "default_session_path")]
    pub session_path: String,
}

// Default value functions
fn default_hit_radius() -> f64 { 10.0 }
fn default_cluster_tolerance() -> f64 { 4.0 }
fn default_slideshow_secs() -> u64 { 5 }
fn default_lookup_path() -> String { "photoview_maps.db".to_string() }
fn default_session_path() -> String { "photoview_session.json".to_string() }

fn default_extra_extensions() -> Vec<String> {
    vec!["jpe", "jfif", "heic", "heif"]
        .into_iter().map(String::from).collect()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            extra_image_extensions: default_extra_extensions(),
            sort_by_date: false,
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            hit_radius: default_hit_radius(),
            cluster_tolerance: default_cluster_tolerance(),
        }
    }
}

impl Default for SlideShowConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_slideshow_secs(),
        }
    }
}

impl SlideShowConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            map_lookup_path: default_lookup_path(),
            session_path: default_session_path(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::PhotoViewError::Config(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
