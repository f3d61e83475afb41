// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Database module for the map parameter lookup table

use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::geo::{GeoRefPoint, LookupStore, MapParams};
use crate::{PhotoViewError, Result};

/// Lookup table storage (thread-safe wrapper)
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.initialize()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.initialize()?;
        Ok(db)
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| PhotoViewError::Config("Database lock poisoned".to_string()))
    }

    /// Initialize database schema
    fn initialize(&self) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute_batch(r#"
            CREATE TABLE IF NOT EXISTS maps (
                file TEXT PRIMARY KEY,
                name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS ref_points (
                map_file TEXT NOT NULL,
                seq INTEGER NOT NULL,
                x_image REAL NOT NULL,
                y_image REAL NOT NULL,
                lat REAL NOT NULL,
                lon REAL NOT NULL,
                PRIMARY KEY (map_file, seq)
            );

            CREATE INDEX IF NOT EXISTS idx_maps_name ON maps(name);
        "#)?;
        Ok(())
    }
}

impl LookupStore for Database {
    fn load_lookup(&self) -> Result<Vec<MapParams>> {
        let conn = self.lock_conn()?;

        let mut points: BTreeMap<String, Vec<GeoRefPoint>> = BTreeMap::new();
        let mut stmt = conn.prepare(
            "SELECT map_file, x_image, y_image, lat, lon FROM ref_points ORDER BY map_file, seq",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                GeoRefPoint::new(row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?),
            ))
        })?;
        for row in rows {
            let (file, point) = row?;
            points.entry(file).or_default().push(point);
        }

        let mut stmt = conn.prepare("SELECT file FROM maps ORDER BY name")?;
        let table = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .map(|file| {
                let file = file?;
                let ref_points = points.remove(&file).unwrap_or_default();
                Ok(MapParams::new(PathBuf::from(file)).with_ref_points(ref_points))
            })
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(table)
    }

    fn save_lookup(&self, table: &[MapParams]) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM ref_points", [])?;
        tx.execute("DELETE FROM maps", [])?;

        for map in table {
            let file = map.file().to_string_lossy().into_owned();
            tx.execute(
                "INSERT OR REPLACE INTO maps (file, name) VALUES (?1, ?2)",
                params![file, map.file_name()],
            )?;
            for (seq, p) in map.ref_points().iter().enumerate() {
                tx.execute(
                    r#"INSERT OR REPLACE INTO ref_points (map_file, seq, x_image, y_image, lat, lon)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
                    params![file, seq as i64, p.x_image(), p.y_image(), p.lat(), p.lon()],
                )?;
            }
        }
        tx.commit()?;
        debug!("Stored {} maps", table.len());
        Ok(())
    }
}
