// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Viewport model: the facade a viewer front end talks to
//!
//! Combines the photo catalog and the geo-reference engine. Every mutating
//! call emits [`ModelEvent`]s on a broadcast channel so any number of views
//! can follow the state.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

use crate::catalog::{scan_directory_async, PhotoCatalog, PhotoPosition, SortOrder};
use crate::config::AppConfig;
use crate::db::Database;
use crate::export::PhotoExporter;
use crate::geo::{GeoRefPoint, GeoReferenceEngine, LookupStore};
use crate::keywords::KeywordExpression;
use crate::metadata::{ExifMetadataReader, MetadataReader, PhotoRecord};
use crate::report::{ErrorReporter, TracingReporter};
use crate::session::{self, SessionProperties};
use crate::slideshow::{SlideShow, SlideShowTick};
use crate::Result;

const EVENT_CAPACITY: usize = 64;

/// Kind of state change, sent after each mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelEvent {
    /// Directory, order, filter or record set changed
    MetadataChanged,
    SelectionChanged,
    /// Another map image (or none) is selected. Also sent after the
    /// `MetadataChanged` of a directory change that dropped the map.
    MapChanged,
    /// Reference points of the current map changed
    MapDataChanged,
}

pub struct ViewportModel {
    config: AppConfig,
    catalog: PhotoCatalog,
    engine: GeoReferenceEngine,
    reader: Arc<dyn MetadataReader>,
    reporter: Arc<dyn ErrorReporter>,
    events: broadcast::Sender<ModelEvent>,
    slide_show: Option<SlideShow>,
    slide_show_generation: u64,
    slide_show_interval: Duration,
    tick_tx: mpsc::UnboundedSender<SlideShowTick>,
    tick_rx: Option<mpsc::UnboundedReceiver<SlideShowTick>>,
}

impl ViewportModel {
    pub fn new(
        config: AppConfig,
        reader: Arc<dyn MetadataReader>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let slide_show_interval = config.slideshow.interval();
        Self {
            config,
            catalog: PhotoCatalog::new(),
            engine: GeoReferenceEngine::new(),
            reader,
            reporter,
            events,
            slide_show: None,
            slide_show_generation: 0,
            slide_show_interval,
            tick_tx,
            tick_rx: Some(tick_rx),
        }
    }

    /// Model reading EXIF/XMP metadata and logging failures
    pub fn with_defaults(config: AppConfig) -> Self {
        let reader = Arc::new(ExifMetadataReader::from_config(&config.catalog));
        Self::new(config, reader, Arc::new(TracingReporter))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ModelEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: ModelEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    // ---- photos -------------------------------------------------------

    /// Show `path`, a photo file or a directory of photos.
    ///
    /// Entering another directory stops the slide show, deselects the map
    /// and rescans. A file is selected by name, a directory selects its first
    /// visible photo. Returns true if the directory changed.
    pub fn select_photo(&mut self, path: &Path, order: SortOrder) -> bool {
        let (dir, file_name) = split_target(path);
        let mut map_dropped = false;
        if self.catalog.current_directory() != Some(dir.as_path()) {
            map_dropped = self.leave_directory();
        }
        let changed =
            self.catalog
                .set_directory(&dir, order, self.reader.as_ref(), self.reporter.as_ref());
        self.select_initial(file_name.as_deref());
        self.emit(ModelEvent::MetadataChanged);
        if map_dropped {
            self.emit(ModelEvent::MapChanged);
        }
        changed
    }

    /// Like [`select_photo`](Self::select_photo), scanning on the blocking
    /// thread pool
    pub async fn select_photo_async(&mut self, path: &Path, order: SortOrder) -> bool {
        let (dir, file_name) = split_target(path);
        let changed = self.catalog.current_directory() != Some(dir.as_path());
        let mut map_dropped = false;
        if changed {
            map_dropped = self.leave_directory();
            let scan =
                scan_directory_async(dir, self.reader.clone(), self.reporter.clone()).await;
            self.catalog.install_scan(scan);
        }
        self.catalog.clear_selection();
        self.catalog.set_sort_order(order);
        self.select_initial(file_name.as_deref());
        self.emit(ModelEvent::MetadataChanged);
        if map_dropped {
            self.emit(ModelEvent::MapChanged);
        }
        changed
    }

    /// Returns true if a map was selected
    fn leave_directory(&mut self) -> bool {
        self.stop_slide_show();
        let had_map = self.engine.current_map_file().is_some();
        self.engine.deselect_map();
        had_map
    }

    fn select_initial(&mut self, file_name: Option<&str>) {
        match file_name {
            Some(name) => {
                self.catalog.select_by_file_name(name);
            }
            None => {
                if self.catalog.visible_photo_count() > 0 {
                    self.catalog.select_first();
                }
            }
        }
        debug!("Selected {:?}", self.catalog.selected_file());
    }

    pub fn set_visibility(&mut self, min_rating: u8, expression: KeywordExpression) {
        self.catalog.set_visibility(min_rating, expression);
        self.emit(ModelEvent::MetadataChanged);
    }

    pub fn set_sort_order(&mut self, order: SortOrder) {
        self.catalog.set_sort_order(order);
        self.emit(ModelEvent::MetadataChanged);
    }

    pub fn select_first(&mut self) -> Option<PathBuf> {
        let file = self.catalog.select_first();
        self.emit(ModelEvent::SelectionChanged);
        file
    }

    pub fn select_next(&mut self) -> Option<PathBuf> {
        let file = self.catalog.select_next();
        self.emit(ModelEvent::SelectionChanged);
        file
    }

    pub fn select_previous(&mut self) -> Option<PathBuf> {
        let file = self.catalog.select_previous();
        self.emit(ModelEvent::SelectionChanged);
        file
    }

    /// Select the photo behind a map marker
    pub fn select_position(&mut self, position: &PhotoPosition) -> Option<PathBuf> {
        let file = self.catalog.select_by_file_name(&position.file_name)?;
        self.emit(ModelEvent::SelectionChanged);
        Some(file)
    }

    /// Delete the selected photo from disk. Returns true on success.
    pub fn delete_selected_photo(&mut self) -> bool {
        let deleted = self.catalog.delete_selected(self.reporter.as_ref());
        self.emit(ModelEvent::MetadataChanged);
        deleted
    }

    pub fn export_photos(&self, photos: &[PathBuf], dest_dir: &Path, template: Option<&str>) -> usize {
        PhotoExporter::new(dest_dir, template).copy_files(photos, self.reporter.as_ref())
    }

    // ---- map ----------------------------------------------------------

    /// Select a map image or none. Failures are reported; returns true if
    /// the map could be selected.
    pub fn set_map(&mut self, file: Option<&Path>) -> bool {
        let ok = match self.engine.set_map(file) {
            Ok(()) => true,
            Err(e) => {
                self.reporter.error(&e);
                false
            }
        };
        self.emit(ModelEvent::MapChanged);
        ok
    }

    pub fn clear_current_map(&mut self) {
        self.engine.clear_current_map();
        self.emit(ModelEvent::MapChanged);
    }

    pub fn add_ref_point(&mut self, point: GeoRefPoint) -> bool {
        let added = self.engine.add_ref_point(point);
        if added {
            self.emit(ModelEvent::MapDataChanged);
        }
        added
    }

    pub fn remove_ref_point(&mut self, point: &GeoRefPoint) -> bool {
        let removed = self.engine.remove_ref_point(point);
        if removed {
            self.emit(ModelEvent::MapDataChanged);
        }
        removed
    }

    pub fn load_map_lookup(&mut self, store: &dyn LookupStore) {
        match self.engine.load_lookup(store) {
            Ok(()) => self.emit(ModelEvent::MapDataChanged),
            Err(e) => self.reporter.error(&e),
        }
    }

    pub fn save_map_lookup(&self, store: &dyn LookupStore) {
        if let Err(e) = self.engine.save_lookup(store) {
            self.reporter.error(&e);
        }
    }

    /// Visible photo whose map marker is at image position `(x, y)`
    pub fn find_photo_at(&self, x: f64, y: f64) -> Option<PhotoPosition> {
        let positions = self.catalog.visible_photo_positions();
        self.engine
            .find_photo_position_at(
                &positions,
                x,
                y,
                self.config.map.hit_radius,
                self.config.map.cluster_tolerance,
            )
            .cloned()
    }

    pub fn find_ref_point_at(&self, x: f64, y: f64) -> Option<GeoRefPoint> {
        self.engine.find_ref_point_at(x, y, self.config.map.hit_radius)
    }

    // ---- slide show ---------------------------------------------------

    /// Receiver for slide show ticks; the event loop feeds them back into
    /// [`handle_slide_show_tick`](Self::handle_slide_show_tick). Available
    /// once.
    pub fn take_slide_show_ticks(&mut self) -> Option<mpsc::UnboundedReceiver<SlideShowTick>> {
        self.tick_rx.take()
    }

    /// Start (or restart) the slide show. Needs a tokio runtime.
    pub fn start_slide_show(&mut self, interval: Duration) -> Result<()> {
        self.stop_slide_show();
        self.slide_show_generation += 1;
        let show = SlideShow::start(interval, self.slide_show_generation, self.tick_tx.clone())?;
        self.slide_show_interval = interval;
        self.slide_show = Some(show);
        Ok(())
    }

    pub fn stop_slide_show(&mut self) {
        if let Some(show) = self.slide_show.take() {
            show.cancel();
            info!("Slide show {} stopped", show.generation());
        }
    }

    pub fn is_slide_show_running(&self) -> bool {
        self.slide_show.is_some()
    }

    pub fn slide_show_interval(&self) -> Duration {
        self.slide_show_interval
    }

    /// Advance to the next photo if `tick` belongs to the running slide
    /// show. Stops the show when nothing is left to show. Returns true if
    /// the tick was applied.
    pub fn handle_slide_show_tick(&mut self, tick: SlideShowTick) -> bool {
        let current = self.slide_show.as_ref().map(SlideShow::generation);
        if current != Some(tick.generation) {
            debug!("Ignoring stale slide show tick {}", tick.generation);
            return false;
        }
        if self.select_next().is_none() {
            self.stop_slide_show();
        }
        true
    }

    // ---- session ------------------------------------------------------

    pub fn save_session(&self, props: &mut SessionProperties) -> Result<()> {
        if let Some(file) = self.catalog.selected_file() {
            props.set(session::CURRENT_FILE, file.to_string_lossy().into_owned());
        }
        let map = self
            .engine
            .current_map_file()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        props.set(session::CURRENT_MAP_FILE, map);
        props.set(session::SORT_BY_DATE, self.catalog.sort_order().is_by_date());
        props.set(session::SLIDE_SHOW_SECS, self.slide_show_interval.as_secs());
        props.set(session::MIN_RATING, self.catalog.min_rating());
        props.set_json(session::VISIBILITY, self.catalog.visibility_expression())?;
        Ok(())
    }

    /// Reopen the photo, filter and map of a saved session. Entries whose
    /// files are gone are skipped.
    pub fn restore_session(&mut self, props: &SessionProperties) {
        if let Some(secs) = props.get_int(session::SLIDE_SHOW_SECS) {
            self.slide_show_interval = Duration::from_secs(secs.max(1) as u64);
        }
        let order = SortOrder::from_sort_by_date(
            props
                .get_bool(session::SORT_BY_DATE)
                .unwrap_or(self.config.catalog.sort_by_date),
        );

        // The photo goes first: entering its directory deselects the map.
        match props.get_path(session::CURRENT_FILE) {
            Some(file) if self.catalog.current_directory().is_none() && file.exists() => {
                self.select_photo(&file, order);
            }
            _ => self.set_sort_order(order),
        }

        let min_rating = props
            .get_int(session::MIN_RATING)
            .map(|r| r.clamp(0, 5) as u8)
            .unwrap_or(0);
        let expression = props
            .get_json::<KeywordExpression>(session::VISIBILITY)
            .unwrap_or_default();
        if min_rating > 0 || !expression.is_trivial() {
            self.set_visibility(min_rating, expression);
        }

        if let Some(map) = props.get_path(session::CURRENT_MAP_FILE) {
            if map.exists() {
                self.set_map(Some(map.as_path()));
            }
        }
    }

    /// Restore map lookup and session from the configured storage files
    pub fn open_session(&mut self) -> Result<()> {
        let db = Database::open(&self.config.storage.map_lookup_path)?;
        self.load_map_lookup(&db);
        let props = SessionProperties::load(Path::new(&self.config.storage.session_path))?;
        self.restore_session(&props);
        Ok(())
    }

    /// Write map lookup and session to the configured storage files. Keys
    /// set by others in the session file are kept.
    pub fn close_session(&mut self) -> Result<()> {
        self.stop_slide_show();
        let db = Database::open(&self.config.storage.map_lookup_path)?;
        self.save_map_lookup(&db);

        let path = Path::new(&self.config.storage.session_path);
        let mut props = SessionProperties::load(path).unwrap_or_else(|e| {
            self.reporter.warning(&e);
            SessionProperties::new()
        });
        self.save_session(&mut props)?;
        props.save(path)?;
        info!("Session stored to {:?}", path);
        Ok(())
    }

    // ---- read access --------------------------------------------------

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn catalog(&self) -> &PhotoCatalog {
        &self.catalog
    }

    pub fn geo_engine(&self) -> &GeoReferenceEngine {
        &self.engine
    }

    pub fn current_directory(&self) -> Option<&Path> {
        self.catalog.current_directory()
    }

    pub fn selected_file(&self) -> Option<PathBuf> {
        self.catalog.selected_file()
    }

    pub fn selected_record(&self) -> Option<&PhotoRecord> {
        self.catalog.current_record()
    }

    pub fn visible_photos(&self) -> Vec<PathBuf> {
        self.catalog.visible_photos()
    }

    pub fn visible_photo_positions(&self) -> Vec<PhotoPosition> {
        self.catalog.visible_photo_positions()
    }

    pub fn visible_photo_count(&self) -> usize {
        self.catalog.visible_photo_count()
    }

    pub fn all_keywords(&self) -> &[String] {
        self.catalog.all_keywords()
    }

    pub fn keyword_counts(&self) -> &[usize] {
        self.catalog.keyword_counts()
    }

    pub fn map_file(&self) -> Option<&Path> {
        self.engine.current_map_file()
    }

    pub fn map_dimensions(&self) -> Option<(u32, u32)> {
        self.engine.map_dimensions()
    }

    pub fn has_map_data(&self) -> bool {
        self.engine.has_data()
    }

    pub fn lat_lon_to_image_pos(&self, lat: f64, lon: f64) -> Option<(f64, f64)> {
        self.engine.lat_lon_to_image_pos(lat, lon)
    }
}

/// Directory to scan and, for a file, the name to select
fn split_target(path: &Path) -> (PathBuf, Option<String>) {
    if path.is_dir() {
        return (path.to_path_buf(), None);
    }
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
    (dir, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{CollectingReporter, Severity};
    use crate::testing::{file_names, photo_dir, plain_photos, FakeReader};
    use tempfile::TempDir;
    use tokio::time::timeout;

    fn model(reader: FakeReader, reporter: &CollectingReporter) -> ViewportModel {
        ViewportModel::new(AppConfig::default(), Arc::new(reader), Arc::new(reporter.clone()))
    }

    fn drain(rx: &mut broadcast::Receiver<ModelEvent>) -> Vec<ModelEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn map_image(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        image::RgbImage::new(200, 100).save(&path).unwrap();
        path
    }

    fn rated(name: &str, rating: u8) -> PhotoRecord {
        let mut record = PhotoRecord::degraded(name);
        record.rating = rating;
        record
    }

    #[test]
    fn test_select_directory_selects_first_visible() {
        let (dir, reader) = plain_photos(&["b.jpg", "a.jpg", "c.jpg"]);
        let reporter = CollectingReporter::new();
        let mut model = model(reader, &reporter);
        let mut rx = model.subscribe();

        assert!(model.select_photo(dir.path(), SortOrder::FileName));
        assert_eq!(drain(&mut rx), vec![ModelEvent::MetadataChanged]);
        assert_eq!(model.selected_file(), Some(dir.path().join("a.jpg")));
        assert_eq!(file_names(&model.visible_photos()), vec!["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[test]
    fn test_select_file_in_same_directory_keeps_scan() {
        let (dir, reader) = plain_photos(&["a.jpg", "b.jpg"]);
        let reporter = CollectingReporter::new();
        let mut model = model(reader, &reporter);

        assert!(model.select_photo(&dir.path().join("b.jpg"), SortOrder::FileName));
        assert_eq!(model.selected_file(), Some(dir.path().join("b.jpg")));

        model.set_visibility(3, KeywordExpression::new());
        assert!(!model.select_photo(&dir.path().join("a.jpg"), SortOrder::FileName));
        assert_eq!(model.selected_file(), Some(dir.path().join("a.jpg")));
        // filter survives because nothing was rescanned
        assert_eq!(model.catalog().min_rating(), 3);
    }

    #[test]
    fn test_navigation_emits_selection_events() {
        let dir = photo_dir(&["a.jpg", "b.jpg", "c.jpg"]);
        let reader = FakeReader::new()
            .with(rated("a.jpg", 4))
            .with(rated("b.jpg", 1))
            .with(rated("c.jpg", 5));
        let reporter = CollectingReporter::new();
        let mut model = model(reader, &reporter);
        model.select_photo(dir.path(), SortOrder::FileName);
        model.set_visibility(3, KeywordExpression::new());
        let mut rx = model.subscribe();

        assert_eq!(model.select_next(), Some(dir.path().join("c.jpg")));
        assert_eq!(model.select_next(), Some(dir.path().join("a.jpg")));
        assert_eq!(model.select_previous(), Some(dir.path().join("c.jpg")));
        assert_eq!(model.select_first(), Some(dir.path().join("a.jpg")));
        assert_eq!(drain(&mut rx), vec![ModelEvent::SelectionChanged; 4]);
    }

    #[test]
    fn test_select_position_from_map_marker() {
        let dir = photo_dir(&["a.jpg", "b.jpg"]);
        let reader = FakeReader::new()
            .with(PhotoRecord::degraded("a.jpg").with_position(5.0, 5.0))
            .with(PhotoRecord::degraded("b.jpg").with_position(2.0, 8.0));
        let reporter = CollectingReporter::new();
        let mut model = model(reader, &reporter);
        model.select_photo(dir.path(), SortOrder::FileName);

        let maps = TempDir::new().unwrap();
        assert!(model.set_map(Some(&map_image(maps.path(), "map.png"))));
        model.add_ref_point(GeoRefPoint::new(0.0, 0.0, 0.0, 0.0));
        model.add_ref_point(GeoRefPoint::new(100.0, 100.0, 10.0, 10.0));

        // b.jpg is drawn at (80, 20)
        let hit = model.find_photo_at(78.0, 21.0).unwrap();
        assert_eq!(hit.file_name, "b.jpg");
        assert!(model.find_photo_at(30.0, 90.0).is_none());

        let mut rx = model.subscribe();
        assert_eq!(model.select_position(&hit), Some(dir.path().join("b.jpg")));
        assert_eq!(drain(&mut rx), vec![ModelEvent::SelectionChanged]);
    }

    #[test]
    fn test_directory_change_deselects_map_and_resets_filter() {
        let (first, reader) = plain_photos(&["a.jpg"]);
        let second = photo_dir(&["z.jpg"]);
        let reader = reader.with(PhotoRecord::degraded("z.jpg"));
        let reporter = CollectingReporter::new();
        let mut model = model(reader, &reporter);
        let maps = TempDir::new().unwrap();

        model.select_photo(first.path(), SortOrder::FileName);
        model.set_map(Some(&map_image(maps.path(), "map.png")));
        model.set_visibility(2, KeywordExpression::new());

        let mut rx = model.subscribe();
        assert!(model.select_photo(second.path(), SortOrder::FileName));
        assert_eq!(
            drain(&mut rx),
            vec![ModelEvent::MetadataChanged, ModelEvent::MapChanged]
        );
        assert!(model.map_file().is_none());
        assert_eq!(model.geo_engine().all_map_files().len(), 1);
        assert_eq!(model.catalog().min_rating(), 0);
        assert_eq!(model.selected_file(), Some(second.path().join("z.jpg")));
    }

    #[test]
    fn test_missing_map_is_reported() {
        let reporter = CollectingReporter::new();
        let mut model = model(FakeReader::new(), &reporter);
        let mut rx = model.subscribe();
        let dir = TempDir::new().unwrap();

        assert!(!model.set_map(Some(&dir.path().join("nowhere.png"))));
        assert_eq!(reporter.count(Severity::Error), 1);
        assert!(model.map_file().is_none());
        assert_eq!(drain(&mut rx), vec![ModelEvent::MapChanged]);
    }

    #[test]
    fn test_reference_point_events() {
        let reporter = CollectingReporter::new();
        let mut model = model(FakeReader::new(), &reporter);
        let point = GeoRefPoint::new(1.0, 2.0, 3.0, 4.0);
        let mut rx = model.subscribe();

        // no map yet
        assert!(!model.add_ref_point(point));
        assert!(drain(&mut rx).is_empty());

        let maps = TempDir::new().unwrap();
        model.set_map(Some(&map_image(maps.path(), "map.png")));
        assert!(model.add_ref_point(point));
        assert!(model.remove_ref_point(&point));
        assert!(!model.remove_ref_point(&point));
        assert_eq!(
            drain(&mut rx),
            vec![ModelEvent::MapChanged, ModelEvent::MapDataChanged, ModelEvent::MapDataChanged]
        );

        model.clear_current_map();
        assert!(model.geo_engine().all_map_files().is_empty());
        assert_eq!(drain(&mut rx), vec![ModelEvent::MapChanged]);
    }

    #[test]
    fn test_map_lookup_round_trip_through_database() {
        let reporter = CollectingReporter::new();
        let db = Database::in_memory().unwrap();
        let maps = TempDir::new().unwrap();
        let map = map_image(maps.path(), "map.png");

        let mut model_a = model(FakeReader::new(), &reporter);
        model_a.set_map(Some(&map));
        model_a.add_ref_point(GeoRefPoint::new(0.0, 0.0, 0.0, 0.0));
        model_a.add_ref_point(GeoRefPoint::new(10.0, 10.0, 1.0, 1.0));
        model_a.save_map_lookup(&db);

        let mut model_b = model(FakeReader::new(), &reporter);
        model_b.load_map_lookup(&db);
        model_b.set_map(Some(&map));
        assert!(model_b.has_map_data());
        assert_eq!(model_b.lat_lon_to_image_pos(0.5, 0.5), Some((5.0, 5.0)));
        assert!(reporter.entries().is_empty());
    }

    #[test]
    fn test_delete_selected_photo() {
        let (dir, reader) = plain_photos(&["a.jpg", "b.jpg"]);
        let reporter = CollectingReporter::new();
        let mut model = model(reader, &reporter);
        model.select_photo(&dir.path().join("a.jpg"), SortOrder::FileName);
        let mut rx = model.subscribe();

        assert!(model.delete_selected_photo());
        assert!(!dir.path().join("a.jpg").exists());
        assert_eq!(model.selected_file(), Some(dir.path().join("b.jpg")));
        assert_eq!(model.visible_photo_count(), 1);
        assert_eq!(drain(&mut rx), vec![ModelEvent::MetadataChanged]);
    }

    #[test]
    fn test_export_visible_photos() {
        let (dir, reader) = plain_photos(&["a.jpg", "b.jpg"]);
        let reporter = CollectingReporter::new();
        let mut model = model(reader, &reporter);
        model.select_photo(dir.path(), SortOrder::FileName);

        let dest = TempDir::new().unwrap();
        let photos = model.visible_photos();
        assert_eq!(model.export_photos(&photos, dest.path(), Some("trip-.jpg")), 2);
        assert!(dest.path().join("trip-1.jpg").exists());
        assert!(dest.path().join("trip-2.jpg").exists());
    }

    #[test]
    fn test_session_round_trip() {
        let dir = photo_dir(&["a.jpg", "b.jpg"]);
        let reader = FakeReader::new()
            .with(rated("a.jpg", 1).with_keywords(["beach"]))
            .with(rated("b.jpg", 4).with_keywords(["beach", "dog"]));
        let reporter = CollectingReporter::new();
        let maps = TempDir::new().unwrap();
        let map = map_image(maps.path(), "map.png");

        let mut expr = KeywordExpression::new();
        expr.add_literal("dog", false);

        let mut saved = model(reader.clone(), &reporter);
        saved.select_photo(&dir.path().join("b.jpg"), SortOrder::Date);
        saved.set_visibility(2, expr.clone());
        saved.set_map(Some(&map));
        let mut props = SessionProperties::new();
        saved.save_session(&mut props).unwrap();
        assert_eq!(props.get_int(session::SLIDE_SHOW_SECS), Some(5));

        let mut restored = model(reader, &reporter);
        restored.restore_session(&props);
        assert_eq!(restored.selected_file(), Some(dir.path().join("b.jpg")));
        assert_eq!(restored.catalog().sort_order(), SortOrder::Date);
        assert_eq!(restored.catalog().min_rating(), 2);
        assert_eq!(restored.catalog().visibility_expression(), &expr);
        assert_eq!(restored.visible_photo_count(), 1);
        assert_eq!(restored.map_file(), Some(map.as_path()));
    }

    #[test]
    fn test_restore_skips_missing_files() {
        let reporter = CollectingReporter::new();
        let mut props = SessionProperties::new();
        props.set(session::CURRENT_FILE, "/no/such/dir/a.jpg");
        props.set(session::CURRENT_MAP_FILE, "/no/such/map.png");
        props.set(session::SLIDE_SHOW_SECS, 9);

        let mut model = model(FakeReader::new(), &reporter);
        model.restore_session(&props);
        assert!(model.current_directory().is_none());
        assert!(model.map_file().is_none());
        assert_eq!(model.slide_show_interval(), Duration::from_secs(9));
        assert!(reporter.entries().is_empty());
    }

    #[test]
    fn test_open_and_close_configured_session() {
        let (dir, reader) = plain_photos(&["a.jpg", "b.jpg"]);
        let storage = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.storage.map_lookup_path = storage.path().join("maps.db").display().to_string();
        config.storage.session_path = storage.path().join("session.json").display().to_string();
        let reporter = CollectingReporter::new();
        let map = map_image(storage.path(), "map.png");

        let mut first = ViewportModel::new(config.clone(), Arc::new(reader.clone()), Arc::new(reporter.clone()));
        first.open_session().unwrap();
        assert!(first.current_directory().is_none());
        first.select_photo(&dir.path().join("b.jpg"), SortOrder::FileName);
        first.set_map(Some(&map));
        first.add_ref_point(GeoRefPoint::new(0.0, 0.0, 0.0, 0.0));
        first.add_ref_point(GeoRefPoint::new(10.0, 10.0, 1.0, 1.0));
        first.close_session().unwrap();

        let mut second = ViewportModel::new(config, Arc::new(reader), Arc::new(reporter.clone()));
        second.open_session().unwrap();
        assert_eq!(second.selected_file(), Some(dir.path().join("b.jpg")));
        assert_eq!(second.map_file(), Some(map.as_path()));
        assert!(second.has_map_data());
        assert!(reporter.entries().is_empty());
    }

    #[tokio::test]
    async fn test_slide_show_advances_on_ticks() {
        let (dir, reader) = plain_photos(&["a.jpg", "b.jpg"]);
        let reporter = CollectingReporter::new();
        let mut model = model(reader, &reporter);
        model.select_photo(dir.path(), SortOrder::FileName);
        let mut ticks = model.take_slide_show_ticks().unwrap();
        assert!(model.take_slide_show_ticks().is_none());

        model.start_slide_show(Duration::from_millis(10)).unwrap();
        let tick = timeout(Duration::from_secs(5), ticks.recv()).await.unwrap().unwrap();
        assert!(model.handle_slide_show_tick(tick));
        assert_eq!(model.selected_file(), Some(dir.path().join("b.jpg")));

        model.stop_slide_show();
        assert!(!model.is_slide_show_running());
        assert!(!model.handle_slide_show_tick(tick));

        // A restarted show ignores ticks of the previous one.
        model.start_slide_show(Duration::from_millis(10)).unwrap();
        assert!(!model.handle_slide_show_tick(tick));
        assert_eq!(model.selected_file(), Some(dir.path().join("b.jpg")));
    }

    #[tokio::test]
    async fn test_rescan_stops_slide_show() {
        let (first, reader) = plain_photos(&["a.jpg"]);
        let second = photo_dir(&["z.jpg"]);
        let reader = reader.with(PhotoRecord::degraded("z.jpg"));
        let reporter = CollectingReporter::new();
        let mut model = model(reader, &reporter);

        model.select_photo(first.path(), SortOrder::FileName);
        model.start_slide_show(Duration::from_secs(60)).unwrap();
        model.select_photo(second.path(), SortOrder::FileName);
        assert!(!model.is_slide_show_running());
    }

    #[tokio::test]
    async fn test_slide_show_stops_without_visible_photos() {
        let (dir, reader) = plain_photos(&["a.jpg"]);
        let reporter = CollectingReporter::new();
        let mut model = model(reader, &reporter);
        model.select_photo(dir.path(), SortOrder::FileName);
        model.set_visibility(5, KeywordExpression::new());

        model.start_slide_show(Duration::from_secs(60)).unwrap();
        let generation = model.slide_show_generation;
        assert!(model.handle_slide_show_tick(SlideShowTick { generation }));
        assert!(!model.is_slide_show_running());
    }

    #[tokio::test]
    async fn test_async_select_matches_blocking_select() {
        let (dir, reader) = plain_photos(&["b.jpg", "a.jpg"]);
        let reporter = CollectingReporter::new();
        let mut model = model(reader, &reporter);
        let mut rx = model.subscribe();

        assert!(model.select_photo_async(&dir.path().join("b.jpg"), SortOrder::FileName).await);
        assert_eq!(model.selected_file(), Some(dir.path().join("b.jpg")));
        assert!(!model.select_photo_async(dir.path(), SortOrder::FileName).await);
        assert_eq!(model.selected_file(), Some(dir.path().join("a.jpg")));
        assert_eq!(drain(&mut rx), vec![ModelEvent::MetadataChanged; 2]);
    }
}
