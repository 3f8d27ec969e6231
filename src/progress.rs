//! Progress reporting for long scans
//!
//! The analysis core only calls a [`ProgressObserver`]; how (or whether)
//! progress is shown is up to the caller. The CLI plugs in [`ProgressReporter`],
//! an indicatif bar.

use indicatif::{ProgressBar, ProgressStyle};

/// One progress notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Rows between notifications
    pub interval: usize,
    /// Rows processed so far
    pub current: usize,
    /// Rows the scan will process
    pub total: usize,
}

/// Receives advisory progress callbacks; implementations must not block
pub trait ProgressObserver {
    fn on_progress(&mut self, update: ProgressUpdate);

    fn on_finish(&mut self, _message: &str) {}
}

/// Observer that discards every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _update: ProgressUpdate) {}
}

/// Rows between notifications: a hundredth of the scan, at least one row
pub fn progress_interval(total: usize) -> usize {
    total.div_ceil(100).max(1)
}

/// Fires the observer every `interval` rows and always on the final row
pub struct ProgressTicker<'a> {
    observer: &'a mut dyn ProgressObserver,
    interval: usize,
    total: usize,
}

impl<'a> ProgressTicker<'a> {
    pub fn new(observer: &'a mut dyn ProgressObserver, total: usize) -> Self {
        Self {
            observer,
            interval: progress_interval(total),
            total,
        }
    }

    pub fn tick(&mut self, current: usize) {
        if current % self.interval == 0 || current == self.total {
            self.observer.on_progress(ProgressUpdate {
                interval: self.interval,
                current,
                total: self.total,
            });
        }
    }

    pub fn finish(&mut self, message: &str) {
        self.observer.on_finish(message);
    }
}

/// Terminal progress bar for CLI scans
#[derive(Debug)]
pub struct ProgressReporter {
    rows_pb: Option<ProgressBar>,
    message: String,
    show_progress: bool,
}

impl ProgressReporter {
    pub fn new(message: &str) -> Self {
        Self {
            rows_pb: None,
            message: message.to_string(),
            show_progress: true,
        }
    }

    /// Create minimal progress reporter (no progress bars)
    pub fn new_minimal() -> Self {
        Self {
            rows_pb: None,
            message: String::new(),
            show_progress: false,
        }
    }

    /// Lazily create the rows bar once the total is known
    fn ensure_rows_pb(&mut self, total: u64) {
        if self.show_progress && self.rows_pb.is_none() {
            self.rows_pb = Some(create_progress_bar(total, &self.message));
        }
    }
}

impl ProgressObserver for ProgressReporter {
    fn on_progress(&mut self, update: ProgressUpdate) {
        self.ensure_rows_pb(update.total as u64);
        if let Some(pb) = &self.rows_pb {
            pb.set_position(update.current as u64);
        }
    }

    fn on_finish(&mut self, message: &str) {
        if let Some(pb) = self.rows_pb.take() {
            pb.finish_with_message(message.to_string());
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(pb) = self.rows_pb.take() {
            pb.finish_and_clear();
        }
    }
}

/// Create a progress bar with known total
fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>7}/{len:7} ({per_sec}) {eta} {msg}")
            .expect("Invalid progress template")
            .progress_chars("#>-"),
    );
    pb.set_message(message.to_string());
    pb
}
