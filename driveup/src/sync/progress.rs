use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};

pub const STAGE_INIT: f64 = 0.00;
pub const STAGE_CONNECT: f64 = 0.01;
pub const STAGE_INDEX: f64 = 0.02;
pub const STAGE_TREE: f64 = 0.03;
pub const STAGE_COMPARE: f64 = 0.04;
pub const STAGE_SYNC: f64 = 0.05;
pub const STAGE_DONE: f64 = 1.00;

/// Writes one status line to stdout; `overwrite` rewrites the current line
/// in place, otherwise a new line is started. The trailing spaces erase
/// leftovers of a longer previous line.
pub fn set_progress(fraction: f64, text: &str, overwrite: bool) {
    let mut out = io::stdout().lock();
    let _ = out.write_all(render(fraction, text, overwrite).as_bytes());
    let _ = out.flush();
}

pub fn render(fraction: f64, text: &str, overwrite: bool) -> String {
    let prefix = if overwrite { '\r' } else { '\n' };
    format!("{prefix}{:.2}% {text}          ", fraction * 100.0)
}

/// Shared transfer counters. The totals are fixed once comparison
/// finishes; the live counters only ever grow.
#[derive(Debug)]
pub struct TransferProgress {
    total_bytes: u64,
    total_files: u64,
    transferred: AtomicU64,
    completed: AtomicU64,
}

impl TransferProgress {
    pub fn new(total_bytes: u64, total_files: u64) -> Self {
        Self {
            total_bytes,
            total_files,
            transferred: AtomicU64::new(0),
            completed: AtomicU64::new(0),
        }
    }

    pub fn add_bytes(&self, bytes: u64) {
        self.transferred.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn complete_file(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn transferred(&self) -> u64 {
        self.transferred.load(Ordering::Relaxed)
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Maps transferred bytes into the synchronization band of the overall
    /// run, between `STAGE_SYNC` and done.
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return STAGE_DONE;
        }
        let ratio = self.transferred() as f64 / self.total_bytes as f64;
        STAGE_SYNC + ratio * (STAGE_DONE - STAGE_SYNC)
    }

    pub fn status(&self) -> String {
        format!("Synchronization... {}/{}", self.completed(), self.total_files)
    }
}
