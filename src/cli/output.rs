//! Output formatting and progress indicators
//!
//! Display helpers for status messages, progress bars, and the single error
//! formatter the binary exits through. The quiet/json flags are applied once
//! at startup and consulted through the module-level getters.

use std::sync::atomic::{AtomicBool, Ordering};

use indicatif::{ProgressBar, ProgressStyle};

static QUIET: AtomicBool = AtomicBool::new(false);
static JSON: AtomicBool = AtomicBool::new(false);

/// Global output configuration from the CLI flags
#[derive(Debug, Clone, Copy)]
pub struct OutputConfig {
    /// Suppress everything except errors
    pub quiet: bool,
    /// Machine-readable output
    pub json: bool,
    /// Verbosity level (0 = warnings, 1 = info, 2+ = debug)
    pub verbose: u8,
}

impl OutputConfig {
    /// Create a new output configuration
    pub fn new(quiet: bool, json: bool, verbose: u8) -> Self {
        Self {
            quiet,
            json,
            verbose,
        }
    }

    /// Apply this configuration process-wide
    pub fn apply_global(self) {
        QUIET.store(self.quiet, Ordering::Relaxed);
        JSON.store(self.json, Ordering::Relaxed);
    }
}

/// Whether quiet mode is active
pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Whether JSON output mode is active
pub fn is_json() -> bool {
    JSON.load(Ordering::Relaxed)
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}

/// Print an informational message
pub fn print_info(message: &str) {
    if !is_quiet() && !is_json() {
        println!("{} {message}", status::INFO);
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    if !is_quiet() && !is_json() {
        println!("{} {message}", status::SUCCESS);
    }
}

/// Print a warning; warnings survive quiet mode
pub fn print_warning(message: &str) {
    if !is_json() {
        eprintln!("{} {message}", status::WARNING);
    }
}

/// Print an indented detail line under a previous message
pub fn print_detail(message: &str) {
    if !is_quiet() && !is_json() {
        println!("    {message}");
    }
}

/// Print a fatal error with its cause chain
pub fn display_error(error: &anyhow::Error) {
    eprintln!("{} {error}", status::ERROR);
    for cause in error.chain().skip(1) {
        eprintln!("    caused by: {cause}");
    }
}

/// Create a spinner for operations with unknown duration
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.blue} {msg}")
            .expect("Invalid spinner template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

/// Create a progress bar for downloads
pub fn create_download_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {msg:20} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .expect("Invalid progress bar template")
            .progress_chars("█▓▒░"),
    );
    pb.set_message(message.to_string());
    pb
}
