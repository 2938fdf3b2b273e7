//! Logging utilities with colored output and progress display.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `debug!` macro, shown only with `--verbose`
//! - `ProgressLine` for single-line progress display with multiple counters
//!
//! # Example
//!
//! ```ignore
//! // Simple logging
//! log!("outline"; "board is {}mm wide", width);
//!
//! // Progress line for the pipeline
//! let progress = ProgressLine::new(&[("layer", 2), ("package", 2)]);
//! progress.inc("layer");
//! progress.finish();
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{StdoutLock, Write, stdout},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Whether a progress line currently owns the bottom terminal line.
static PROGRESS_ACTIVE: AtomicBool = AtomicBool::new(false);

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Output
// ============================================================================

/// Log a message with a colored module prefix.
///
/// An active progress line is wiped first and redrawn by its next update.
pub fn log(module: &str, message: &str) {
    let mut out = stdout().lock();
    if PROGRESS_ACTIVE.load(Ordering::SeqCst) {
        clear_line(&mut out);
    }
    writeln!(out, "{} {message}", prefix(module)).ok();
    out.flush().ok();
}

/// `[module]` colored by message kind.
fn prefix(module: &str) -> String {
    let tag = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "done" => tag.bright_green().bold().to_string(),
        "error" => tag.bright_red().bold().to_string(),
        "warning" => tag.bright_magenta().bold().to_string(),
        _ => tag.bright_yellow().bold().to_string(),
    }
}

fn clear_line(out: &mut StdoutLock<'_>) {
    execute!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
}

// ============================================================================
// Progress Line
// ============================================================================

/// In-place counters for the pipeline steps.
///
/// Displays: `[progress] layer(1/2) package(0/2)`
///
/// Workers call [`inc`](Self::inc) concurrently; a redraw is skipped when
/// another thread is drawing. [`finish`](Self::finish) leaves the final
/// counts on screen, dropping without it wipes the line.
pub struct ProgressLine {
    steps: Vec<Step>,
    draw: Mutex<()>,
    finished: AtomicBool,
}

struct Step {
    name: &'static str,
    total: usize,
    done: AtomicUsize,
}

impl ProgressLine {
    /// Start a progress display; steps with nothing to do are left out.
    pub fn new(steps: &[(&'static str, usize)]) -> Self {
        let progress = Self {
            steps: steps
                .iter()
                .filter(|(_, total)| *total > 0)
                .map(|&(name, total)| Step {
                    name,
                    total,
                    done: AtomicUsize::new(0),
                })
                .collect(),
            draw: Mutex::new(()),
            finished: AtomicBool::new(false),
        };
        PROGRESS_ACTIVE.store(true, Ordering::SeqCst);
        progress.render(false);
        progress
    }

    /// Count one finished item of `step`.
    pub fn inc(&self, step: &str) {
        let Some(found) = self.steps.iter().find(|s| s.name == step) else {
            return;
        };
        found.done.fetch_add(1, Ordering::Relaxed);
        if let Some(_guard) = self.draw.try_lock() {
            self.render(false);
        }
    }

    /// Counter text without the prefix.
    fn counters(&self) -> String {
        self.steps
            .iter()
            .map(|s| format!("{}({}/{})", s.name, s.done.load(Ordering::Relaxed), s.total))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn render(&self, newline: bool) {
        let mut out = stdout().lock();
        clear_line(&mut out);
        write!(out, "{} {}", prefix("progress"), self.counters()).ok();
        if newline {
            writeln!(out).ok();
        }
        out.flush().ok();
    }

    /// Print the final counts and release the line.
    pub fn finish(self) {
        let _guard = self.draw.lock();
        PROGRESS_ACTIVE.store(false, Ordering::SeqCst);
        self.render(true);
        self.finished.store(true, Ordering::SeqCst);
    }
}

impl Drop for ProgressLine {
    fn drop(&mut self) {
        if !self.finished.load(Ordering::SeqCst) {
            PROGRESS_ACTIVE.store(false, Ordering::SeqCst);
            clear_line(&mut stdout().lock());
        }
    }
}
