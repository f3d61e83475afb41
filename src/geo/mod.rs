// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Geo-referencing of map images
//!
//! A map image plus at least two reference points relating image pixels to
//! latitude/longitude is enough to place photo markers on the map. The engine
//! also keeps a lookup table with the reference points of every map used so
//! far, which can be stored and loaded as a whole.

pub mod transform;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::{PhotoViewError, Result};

/// Ordered latitude/longitude pair, e.g. a photo position with its catalog
/// index
pub trait IndexedGeoPoint {
    fn index(&self) -> usize;
    fn lat(&self) -> f64;
    fn lon(&self) -> f64;
}

/// Relates a point in image coordinates to a geographic position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoRefPoint {
    x_image: f64,
    y_image: f64,
    lat: f64,
    lon: f64,
}

impl GeoRefPoint {
    pub fn new(x_image: f64, y_image: f64, lat: f64, lon: f64) -> Self {
        Self {
            x_image,
            y_image,
            lat,
            lon,
        }
    }

    pub fn x_image(&self) -> f64 {
        self.x_image
    }

    pub fn y_image(&self) -> f64 {
        self.y_image
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    fn geo_distance_sq(&self, lat: f64, lon: f64) -> f64 {
        (self.lat - lat).powi(2) + (self.lon - lon).powi(2)
    }

    fn image_distance(&self, x: f64, y: f64) -> f64 {
        (self.x_image - x).hypot(self.y_image - y)
    }
}

/// Reference points of one map image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapParams {
    file: PathBuf,
    ref_points: Vec<GeoRefPoint>,
}

impl MapParams {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            ref_points: Vec::new(),
        }
    }

    pub fn with_ref_points(mut self, ref_points: Vec<GeoRefPoint>) -> Self {
        self.ref_points = ref_points;
        self
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn ref_points(&self) -> &[GeoRefPoint] {
        &self.ref_points
    }

    /// At least two reference points are needed for a transform
    pub fn has_data(&self) -> bool {
        self.ref_points.len() >= 2
    }

    /// Key the lookup table is sorted by
    pub fn file_name(&self) -> String {
        self.file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Whole-table persistence for the map lookup
pub trait LookupStore {
    fn load_lookup(&self) -> Result<Vec<MapParams>>;
    fn save_lookup(&self, table: &[MapParams]) -> Result<()>;
}

/// Current map, its reference points and the lookup table of known maps
#[derive(Debug, Default)]
pub struct GeoReferenceEngine {
    /// Sorted by file name
    lookup: Vec<MapParams>,
    current: Option<PathBuf>,
    dimensions: Option<(u32, u32)>,
}

impl GeoReferenceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a map image, or deselect with `None`.
    ///
    /// Unknown files get a new lookup entry. If the image cannot be read the
    /// entry is evicted, no map is selected and an error is returned.
    pub fn set_map(&mut self, file: Option<&Path>) -> Result<()> {
        self.deselect_map();
        let Some(file) = file else {
            return Ok(());
        };

        match image::image_dimensions(file) {
            Ok(dimensions) => {
                if self.position(file).is_none() {
                    self.insert_sorted(MapParams::new(file));
                    debug!("New map entry: {:?}", file);
                }
                self.current = Some(file.to_path_buf());
                self.dimensions = Some(dimensions);
                info!("Map selected: {:?} ({}x{})", file, dimensions.0, dimensions.1);
                Ok(())
            }
            Err(e) => {
                if let Some(pos) = self.position(file) {
                    self.lookup.remove(pos);
                    info!("Removed stale map entry: {:?}", file);
                }
                Err(PhotoViewError::MapUnavailable {
                    path: file.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Deselect the current map, keeping its lookup entry
    pub fn deselect_map(&mut self) {
        self.current = None;
        self.dimensions = None;
    }

    /// Deselect the current map and drop its reference points
    pub fn clear_current_map(&mut self) {
        if let Some(file) = self.current.take() {
            if let Some(pos) = self.position(&file) {
                self.lookup.remove(pos);
            }
            self.dimensions = None;
        }
    }

    pub fn current_map_file(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    /// Pixel size of the current map image
    pub fn map_dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }

    pub fn current_params(&self) -> Option<&MapParams> {
        let file = self.current.as_deref()?;
        self.position(file).map(|pos| &self.lookup[pos])
    }

    fn current_params_mut(&mut self) -> Option<&mut MapParams> {
        let file = self.current.clone()?;
        let pos = self.position(&file)?;
        self.lookup.get_mut(pos)
    }

    /// True if a map is selected and owns at least two reference points
    pub fn has_data(&self) -> bool {
        self.current_params().map(MapParams::has_data).unwrap_or(false)
    }

    pub fn ref_points(&self) -> &[GeoRefPoint] {
        self.current_params().map(MapParams::ref_points).unwrap_or(&[])
    }

    /// Returns false if no map is selected
    pub fn add_ref_point(&mut self, point: GeoRefPoint) -> bool {
        match self.current_params_mut() {
            Some(params) => {
                params.ref_points.push(point);
                true
            }
            None => false,
        }
    }

    /// Remove the first reference point equal to `point`
    pub fn remove_ref_point(&mut self, point: &GeoRefPoint) -> bool {
        let Some(params) = self.current_params_mut() else {
            return false;
        };
        match params.ref_points.iter().position(|p| p == point) {
            Some(pos) => {
                params.ref_points.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn remove_ref_point_at(&mut self, index: usize) -> bool {
        match self.current_params_mut() {
            Some(params) if index < params.ref_points.len() => {
                params.ref_points.remove(index);
                true
            }
            _ => false,
        }
    }

    /// Image position for a geographic position, `None` without map data
    pub fn lat_lon_to_image_pos(&self, lat: f64, lon: f64) -> Option<(f64, f64)> {
        if !self.has_data() {
            return None;
        }
        transform::lat_lon_to_image_pos(self.ref_points(), lat, lon)
    }

    /// Reference point nearest to `(x, y)` in image coordinates, if within
    /// `radius`
    pub fn find_ref_point_at(&self, x: f64, y: f64, radius: f64) -> Option<GeoRefPoint> {
        let mut best: Option<(f64, GeoRefPoint)> = None;
        for point in self.ref_points() {
            let dist = point.image_distance(x, y);
            if best.map_or(true, |(d, _)| dist < d) {
                best = Some((dist, *point));
            }
        }
        best.filter(|(d, _)| *d <= radius).map(|(_, p)| p)
    }

    /// Photo position whose marker is hit at `(x, y)`.
    ///
    /// Finds the minimum marker distance, then returns the point with the
    /// smallest index among all markers within that distance plus
    /// `tolerance`, so clicks on a cluster always pick the same photo.
    pub fn find_photo_position_at<'a, P: IndexedGeoPoint>(
        &self,
        points: &'a [P],
        x: f64,
        y: f64,
        radius: f64,
        tolerance: f64,
    ) -> Option<&'a P> {
        if !self.has_data() {
            return None;
        }

        let distances: Vec<(&'a P, f64)> = points
            .iter()
            .filter(|p| p.lat().is_finite() && p.lon().is_finite())
            .filter_map(|p| {
                let (px, py) = self.lat_lon_to_image_pos(p.lat(), p.lon())?;
                let dist = (px - x).hypot(py - y);
                dist.is_finite().then_some((p, dist))
            })
            .collect();

        let min_dist = distances.iter().map(|(_, d)| *d).reduce(f64::min)?;
        if min_dist > radius {
            return None;
        }

        distances
            .into_iter()
            .filter(|(_, d)| *d <= min_dist + tolerance)
            .map(|(p, _)| p)
            .min_by_key(|p| p.index())
    }

    /// Files of all known maps, sorted by name
    pub fn all_map_files(&self) -> Vec<PathBuf> {
        self.lookup.iter().map(|p| p.file.clone()).collect()
    }

    pub fn lookup(&self) -> &[MapParams] {
        &self.lookup
    }

    pub fn save_lookup(&self, store: &dyn LookupStore) -> Result<()> {
        store.save_lookup(&self.lookup)?;
        debug!("Saved {} map entries", self.lookup.len());
        Ok(())
    }

    /// Replace the lookup table with the stored one
    pub fn load_lookup(&mut self, store: &dyn LookupStore) -> Result<()> {
        let mut table = store.load_lookup()?;
        table.retain(|p| !p.file_name().is_empty());
        table.sort_by_key(MapParams::file_name);
        self.lookup = table;

        if let Some(file) = self.current.clone() {
            if self.position(&file).is_none() {
                self.current = None;
                self.dimensions = None;
            }
        }
        info!("Loaded {} map entries", self.lookup.len());
        Ok(())
    }

    fn position(&self, file: &Path) -> Option<usize> {
        self.lookup.iter().position(|p| p.file == file)
    }

    fn insert_sorted(&mut self, params: MapParams) {
        let key = params.file_name();
        let pos = self.lookup.partition_point(|p| p.file_name() <= key);
        self.lookup.insert(pos, params);
    }
}
