// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Session properties persisted between runs

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::Result;

/// Property key of the selected photo
pub const CURRENT_FILE: &str = "model.currfile";
/// Property key of the selected map image
pub const CURRENT_MAP_FILE: &str = "model.currmapfile";
pub const SORT_BY_DATE: &str = "gui.sortbydate";
pub const SLIDE_SHOW_SECS: &str = "gui.slideshowsec";
pub const MIN_RATING: &str = "model.minrating";
/// Property key of the keyword filter
pub const VISIBILITY: &str = "model.visibility";

/// Flat key/value store written as one JSON object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionProperties {
    values: BTreeMap<String, Value>,
}

impl SessionProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read properties from a file; a missing file gives an empty set
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No session file at {:?}", path);
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let values = serde_json::from_str(&content)?;
        Ok(Self { values })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.values)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn set_json<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        self.values.insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn get_path(&self, key: &str) -> Option<PathBuf> {
        self.get_string(key).filter(|s| !s.is_empty()).map(PathBuf::from)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.values.get(key).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(Value::as_bool)
    }

    /// Typed value; `None` if the key is absent or does not parse
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.get(key)?.clone();
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Ignoring session property {}: {}", key, e);
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
