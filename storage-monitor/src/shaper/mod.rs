// SPDX-License-Identifier: GPL-3.0-only

//! Rate limiting and quiescence detection for file change notifications
//!
//! [`ChangeEventShaper`] is a plain state machine: callers pass the current
//! instant into every transition and ask it when it next needs to be woken.
//! [`FileMonitor`] drives one from a tokio task.
//!
//! The shaper keeps a single "last emitted" slot and a single quiescence
//! slot for the whole instance, not one per file. A burst on one file
//! therefore rate-limits and re-arms the hint for another.

mod driver;

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use storage_types::{FileEvent, FileEventKind};

pub use driver::FileMonitor;

pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(800);
pub const CHANGES_DONE_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaperConfig {
    /// Minimum spacing between two emitted `changed` events
    pub rate_limit: Duration,
    /// Silence after the last `changed` before a `changes_done_hint`
    pub changes_done_delay: Duration,
}

impl Default for ShaperConfig {
    fn default() -> Self {
        Self {
            rate_limit: DEFAULT_RATE_LIMIT,
            changes_done_delay: CHANGES_DONE_DELAY,
        }
    }
}

#[derive(Debug, Clone)]
struct Timer {
    file: PathBuf,
    deadline: Instant,
}

#[derive(Debug)]
pub struct ChangeEventShaper {
    config: ShaperConfig,
    cancelled: bool,
    last_sent: Option<(PathBuf, Instant)>,
    delayed_change: Option<Timer>,
    changes_done: Option<Timer>,
    out: VecDeque<FileEvent>,
}

impl Default for ChangeEventShaper {
    fn default() -> Self {
        Self::new(ShaperConfig::default())
    }
}

impl ChangeEventShaper {
    pub fn new(config: ShaperConfig) -> Self {
        Self {
            config,
            cancelled: false,
            last_sent: None,
            delayed_change: None,
            changes_done: None,
            out: VecDeque::new(),
        }
    }

    pub fn config(&self) -> ShaperConfig {
        self.config
    }

    /// Applies to the next `changed` event; an armed delayed emission keeps
    /// its deadline.
    pub fn set_rate_limit(&mut self, rate_limit: Duration) {
        self.config.rate_limit = rate_limit;
    }

    /// Feed one raw notification observed at `now`. Ignored once cancelled.
    pub fn feed(&mut self, event: FileEvent, now: Instant) {
        if self.cancelled {
            return;
        }

        match event.kind {
            FileEventKind::Changed => self.on_changed(event.file, now),
            _ => self.on_other(event),
        }
    }

    fn on_changed(&mut self, file: PathBuf, now: Instant) {
        let since_last = self
            .last_sent
            .as_ref()
            .map(|(_, sent_at)| now.saturating_duration_since(*sent_at));

        match since_last {
            Some(elapsed) if elapsed < self.config.rate_limit => {
                // first writer wins: an armed timer is never rescheduled
                if self.delayed_change.is_none() {
                    self.delayed_change = Some(Timer {
                        file: file.clone(),
                        deadline: now + (self.config.rate_limit - elapsed),
                    });
                }
            }
            _ => {
                self.delayed_change = None;
                self.send_changed(file.clone(), now);
            }
        }

        self.changes_done = Some(Timer {
            file,
            deadline: now + self.config.changes_done_delay,
        });
    }

    fn on_other(&mut self, event: FileEvent) {
        if let Some(timer) = self.delayed_change.take() {
            self.out.push_back(FileEvent::changed(timer.file));
        }
        self.last_sent = None;

        let pending_hint = self.changes_done.take();
        if event.kind != FileEventKind::ChangesDoneHint
            && let Some(timer) = pending_hint
        {
            self.out.push_back(FileEvent::changes_done(timer.file));
        }

        self.out.push_back(event);
    }

    fn send_changed(&mut self, file: PathBuf, now: Instant) {
        self.out.push_back(FileEvent::changed(file.clone()));
        self.last_sent = Some((file, now));
    }

    /// Earliest armed deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        let delayed = self.delayed_change.as_ref().map(|t| t.deadline);
        let hint = self.changes_done.as_ref().map(|t| t.deadline);
        match (delayed, hint) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fire every timer whose deadline is at or before `now`, earliest first.
    /// On a tie the delayed change goes before the hint.
    pub fn fire_due(&mut self, now: Instant) {
        if self.cancelled {
            return;
        }

        loop {
            let delayed = self.delayed_change.as_ref().filter(|t| t.deadline <= now);
            let hint = self.changes_done.as_ref().filter(|t| t.deadline <= now);

            let delayed_first = match (delayed, hint) {
                (None, None) => return,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (Some(d), Some(h)) => d.deadline <= h.deadline,
            };

            if delayed_first {
                if let Some(timer) = self.delayed_change.take() {
                    self.send_changed(timer.file, now);
                }
            } else if let Some(timer) = self.changes_done.take() {
                self.out.push_back(FileEvent::changes_done(timer.file));
            }
        }
    }

    /// Drop both timers and stop accepting events.
    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.delayed_change = None;
        self.changes_done = None;
        self.last_sent = None;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// File the quiescence timer is tracking, if armed.
    pub fn pending_hint_file(&self) -> Option<&Path> {
        self.changes_done.as_ref().map(|t| t.file.as_path())
    }

    pub fn drain_events(&mut self) -> Vec<FileEvent> {
        self.out.drain(..).collect()
    }
}
