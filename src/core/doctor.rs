//! Host preflight checks
//!
//! Verifies the tools the install shells out to are present before anything
//! destructive happens, and reports issues with suggestions.

use crate::core::probe;

/// Tools the install cannot run without
const REQUIRED_TOOLS: &[(&str, &str)] = &[
    ("parted", "Install parted from your distribution's repositories"),
    ("mkfs.ext4", "Install e2fsprogs"),
    ("mkfs.vfat", "Install dosfstools"),
    ("mkswap", "Install util-linux"),
    ("swapon", "Install util-linux"),
    ("mount", "Install util-linux"),
    ("tar", "Install GNU tar"),
    ("make", "Install GNU make"),
    ("gcc", "Install gcc; the host compiler bootstraps the cross-toolchain"),
    ("chroot", "Install coreutils"),
    ("runuser", "Install util-linux"),
    ("grub-install", "Install grub2"),
];

/// Tools that improve the run but are not load-bearing
const OPTIONAL_TOOLS: &[(&str, &str)] = &[
    ("xz", "Install xz-utils to speed up archive extraction"),
    ("makeinfo", "Install texinfo; some packages skip documentation without it"),
];

/// Result of a single dependency check
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the dependency being checked
    pub name: String,
    /// Whether the check passed
    pub passed: bool,
    /// Version if available
    pub version: Option<String>,
    /// Error message if check failed
    pub error: Option<String>,
    /// Suggestion for fixing the issue
    pub suggestion: Option<String>,
    /// Whether this is a required or optional dependency
    pub required: bool,
}

impl CheckResult {
    /// Create a passing check result
    pub fn pass(name: &str, version: Option<String>, required: bool) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            version,
            error: None,
            suggestion: None,
            required,
        }
    }

    /// Create a failing check result
    pub fn fail(name: &str, error: &str, suggestion: Option<&str>, required: bool) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            version: None,
            error: Some(error.to_string()),
            suggestion: suggestion.map(String::from),
            required,
        }
    }
}

/// Overall preflight report
#[derive(Debug, Default)]
pub struct DoctorReport {
    /// Individual check results
    pub checks: Vec<CheckResult>,
}

impl DoctorReport {
    /// Create a new empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a check result
    pub fn add_check(&mut self, result: CheckResult) {
        self.checks.push(result);
    }

    /// Check if all required checks passed
    pub fn all_required_passed(&self) -> bool {
        self.checks.iter().filter(|c| c.required).all(|c| c.passed)
    }

    /// Check if all checks passed (including optional)
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    /// Count passed checks
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    /// Get all failed required checks
    pub fn failed_required(&self) -> Vec<&CheckResult> {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .collect()
    }
}

/// Check one external tool through PATH, probing its version when found
pub fn check_tool(name: &str, suggestion: &str, required: bool) -> CheckResult {
    match which::which(name) {
        Ok(_) => CheckResult::pass(name, probe_version(name), required),
        Err(_) => CheckResult::fail(
            name,
            &format!("'{name}' not found in PATH"),
            Some(suggestion),
            required,
        ),
    }
}

/// Best-effort `--version` probe; many of these tools print to stderr
fn probe_version(command: &str) -> Option<String> {
    std::process::Command::new(command)
        .arg("--version")
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                let combined = format!("{stdout}{stderr}");
                extract_version(&combined)
            } else {
                None
            }
        })
}

/// Extract a version string from command output
fn extract_version(output: &str) -> Option<String> {
    let version_regex = regex::Regex::new(r"v?(\d+\.\d+(?:\.\d+)?(?:-\w+)?)").ok()?;
    version_regex
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Check for superuser privileges
pub fn check_root() -> CheckResult {
    match probe::require_root() {
        Ok(()) => CheckResult::pass("superuser privileges", None, true),
        Err(_) => CheckResult::fail(
            "superuser privileges",
            "not running as root",
            Some("Re-run with sudo or as root"),
            true,
        ),
    }
}

/// Run every preflight check
pub fn run_doctor() -> DoctorReport {
    let mut report = DoctorReport::new();

    report.add_check(check_root());

    for (tool, suggestion) in REQUIRED_TOOLS {
        report.add_check(check_tool(tool, suggestion, true));
    }
    for (tool, suggestion) in OPTIONAL_TOOLS {
        report.add_check(check_tool(tool, suggestion, false));
    }

    report
}
