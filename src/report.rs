// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Severity-tagged reporting of recoverable failures
//!
//! Nothing in the model is fatal. Components hand every failure to an
//! [`ErrorReporter`] and keep their previous, consistent state.

use std::sync::{Arc, Mutex};
use tracing::{error, warn};

use crate::PhotoViewError;

/// How serious a reported failure is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// Receiver for recoverable failures
pub trait ErrorReporter: Send + Sync {
    fn report(&self, severity: Severity, err: &PhotoViewError);

    fn warning(&self, err: &PhotoViewError) {
        self.report(Severity::Warning, err);
    }

    fn error(&self, err: &PhotoViewError) {
        self.report(Severity::Error, err);
    }
}

/// Reporter that forwards everything to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, severity: Severity, err: &PhotoViewError) {
        match severity {
            Severity::Warning => warn!("{}", err),
            Severity::Error => error!("{}", err),
        }
    }
}

/// Reporter that keeps rendered messages in memory, e.g. for a status panel
#[derive(Debug, Default, Clone)]
pub struct CollectingReporter {
    entries: Arc<Mutex<Vec<(Severity, String)>>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far
    pub fn entries(&self) -> Vec<(Severity, String)> {
        match self.entries.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries().iter().filter(|(s, _)| *s == severity).count()
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.clear();
        }
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, severity: Severity, err: &PhotoViewError) {
        match self.entries.lock() {
            Ok(mut guard) => guard.push((severity, err.to_string())),
            Err(poisoned) => poisoned.into_inner().push((severity, err.to_string())),
        }
    }
}
