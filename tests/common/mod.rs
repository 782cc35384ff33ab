//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

use std::path::PathBuf;
use tempfile::TempDir;

/// Test workspace context
///
/// Creates a temporary directory for test runs and provides utilities for
/// setting up answer files and inspecting results.
pub struct TestWorkspace {
    /// Temporary directory for the test
    pub dir: TempDir,
}

impl TestWorkspace {
    /// Create a new test workspace in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the workspace directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the workspace, returning its path
    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// Check if a file exists in the workspace
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// A complete, valid answer file for testing
#[allow(dead_code)]
pub const SAMPLE_ANSWERS: &str = r#"
[system]
hostname = "scratch"
username = "alex"
root_password = "rootpw"
user_password = "userpw"

[build]
libc = "musl"
init_tools = "busybox"
install_x11 = false

[disk]
device = "/dev/vda"
swap_mib = 2048
"#;

/// An answer file with an empty username, which must be rejected
#[allow(dead_code)]
pub const INVALID_ANSWERS: &str = r#"
[system]
username = ""
root_password = "rootpw"
user_password = "userpw"

[build]
libc = "glibc"
init_tools = "coreutils"
"#;
