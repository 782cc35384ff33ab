//! Error types for scratchroot
//!
//! Domain-specific error types using thiserror. Fatal conditions surface as
//! these enums through the command layer; advisory conditions (a failed
//! download, a checksum mismatch) live in the fetch report instead.

use std::path::PathBuf;
use thiserror::Error;

/// Host environment probing errors
#[derive(Error, Debug)]
pub enum EnvironmentError {
    /// No installable disks were found
    #[error("No disk-type block devices found on this host")]
    NoDisksFound,

    /// Block device enumeration failed
    #[error("Failed to enumerate block devices: {error}")]
    ProbeFailed { error: String },

    /// Installer requires superuser privileges
    #[error("This operation must be run as root")]
    NotRoot,
}

/// Partition planning errors
#[derive(Error, Debug)]
pub enum PlanError {
    /// Disk selection was not a number or referenced no probed disk
    #[error("Invalid disk selection '{input}': expected a number between 1 and {count}")]
    InvalidSelection { input: String, count: usize },

    /// Disk is below the supported minimum and the operator declined to override
    #[error("Disk {device} is {size_mib} MiB, below the {min_mib} MiB minimum")]
    DiskTooSmall {
        device: String,
        size_mib: u64,
        min_mib: u64,
    },

    /// Swap request leaves no room for the root partition
    #[error("Swap size {swap_mib} MiB leaves no room for the root partition on {device}")]
    SwapTooLarge { device: String, swap_mib: u64 },
}

/// Operator interview errors
#[derive(Error, Debug)]
pub enum PromptError {
    /// A required answer was left empty
    #[error("'{field}' must not be empty")]
    EmptyInput { field: String },

    /// A menu answer was outside the offered choices
    #[error("'{input}' is not one of the offered choices for {field}")]
    InvalidChoice { field: String, input: String },

    /// Prompting attempted without a terminal
    #[error("stdin is not a terminal; use --answers to run non-interactively")]
    NotATerminal,

    /// Terminal read failed
    #[error("Failed to read operator input: {0}")]
    Io(#[from] std::io::Error),
}

/// Answer file errors
#[derive(Error, Debug)]
pub enum AnswerError {
    /// Answer file missing
    #[error("Answer file not found: {path}")]
    NotFound { path: PathBuf },

    /// Answer file unreadable
    #[error("Failed to read answer file '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Answer file does not parse as TOML
    #[error("Failed to parse answer file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Answer file parsed but a value is unusable
    #[error("Invalid answer for '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

/// Download errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Network error
    #[error("Network error downloading '{url}': {error}")]
    NetworkError { url: String, error: String },

    /// Checksum verification failed
    #[error("Checksum mismatch for '{file}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    /// IO error
    #[error("IO error for '{path}': {error}")]
    IoError { path: PathBuf, error: String },

    /// Max retries exceeded
    #[error("Download failed after {retries} retries: {url}")]
    MaxRetriesExceeded { url: String, retries: u32 },
}

/// Step and pipeline execution errors
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A child process could not be started
    #[error("Failed to start '{program}': {error}")]
    Spawn { program: String, error: String },

    /// A step exited non-zero; the whole run stops here
    #[error("Step '{program}' in phase '{phase}' failed with {status}")]
    StepFailed {
        phase: String,
        program: String,
        status: String,
    },

    /// A build phase needs an archive the fetch stage did not deliver
    #[error("Missing source archive '{archive}' required by phase '{phase}'")]
    MissingArchive { phase: String, archive: String },
}

/// Top-level installer error type
#[derive(Error, Debug)]
pub enum InstallerError {
    /// Environment error
    #[error("Environment error: {0}")]
    Environment(#[from] EnvironmentError),

    /// Planning error
    #[error("Planning error: {0}")]
    Plan(#[from] PlanError),

    /// Prompt error
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    /// Answer file error
    #[error("Answer file error: {0}")]
    Answers(#[from] AnswerError),

    /// Download error
    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    /// Pipeline error
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Run aborted by the operator at a confirmation gate
    #[error("Aborted: {0}")]
    Aborted(String),

    /// IO error
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}
