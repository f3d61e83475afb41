// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Slide show timer

use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::{PhotoViewError, Result};

/// Request to advance to the next photo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideShowTick {
    /// Identifies the slide show that sent the tick
    pub generation: u64,
}

/// Repeating timer task, stopped on `cancel` or drop
pub struct SlideShow {
    generation: u64,
    interval: Duration,
    cancel_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl SlideShow {
    /// Spawn the timer on the current tokio runtime.
    ///
    /// The first tick is sent one `interval` after start.
    pub fn start(
        interval: Duration,
        generation: u64,
        sender: mpsc::UnboundedSender<SlideShowTick>,
    ) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| PhotoViewError::SlideShow(format!("No async runtime: {}", e)))?;
        let (cancel_tx, mut cancel_rx) = watch::channel(false);

        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if sender.send(SlideShowTick { generation }).is_err() {
                            debug!("Slide show {} has no receiver", generation);
                            break;
                        }
                    }
                    changed = cancel_rx.changed() => {
                        if changed.is_err() || *cancel_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("Slide show {} finished", generation);
        });

        info!("Slide show {} started, interval {:?}", generation, interval);
        Ok(Self {
            generation,
            interval,
            cancel_tx,
            handle,
        })
    }

    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
        self.handle.abort();
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SlideShow {
    fn drop(&mut self) {
        self.cancel();
    }
}
