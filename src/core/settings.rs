//! Installation configuration
//!
//! The operator's answers, collected once at the start of a run and immutable
//! afterwards. Values come either from the interactive interview or from a
//! TOML answer file for unattended installs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::defaults;
use crate::error::AnswerError;

/// C library the final system is built against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Libc {
    /// GNU C library
    Glibc,
    /// musl libc
    Musl,
}

impl std::fmt::Display for Libc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Glibc => write!(f, "glibc"),
            Self::Musl => write!(f, "musl"),
        }
    }
}

/// Core userland the final system boots with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitTools {
    /// GNU coreutils
    Coreutils,
    /// BusyBox multi-call binary
    Busybox,
}

impl std::fmt::Display for InitTools {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Coreutils => write!(f, "coreutils"),
            Self::Busybox => write!(f, "busybox"),
        }
    }
}

/// Everything the interview collects
///
/// Created once, passed by reference into every later stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallConfig {
    /// Hostname of the installed system
    pub hostname: String,
    /// Login account to create
    pub username: String,
    /// Password for root
    pub root_password: String,
    /// Password for the created account
    pub user_password: String,
    /// C library choice
    pub libc: Libc,
    /// Core userland choice
    pub init_tools: InitTools,
    /// Whether to build the X11 stack on top of the base system
    pub install_x11: bool,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            hostname: defaults::DEFAULT_HOSTNAME.to_string(),
            username: String::new(),
            root_password: String::new(),
            user_password: String::new(),
            libc: Libc::Glibc,
            init_tools: InitTools::Coreutils,
            install_x11: false,
        }
    }
}

/// `[system]` section of an answer file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemAnswers {
    /// Hostname; falls back to the default when omitted
    pub hostname: Option<String>,
    /// Login account to create
    pub username: String,
    /// Password for root
    pub root_password: String,
    /// Password for the created account
    pub user_password: String,
}

/// `[build]` section of an answer file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildAnswers {
    /// C library choice
    pub libc: Libc,
    /// Core userland choice
    pub init_tools: InitTools,
    /// Whether to build the X11 stack
    #[serde(default)]
    pub install_x11: bool,
}

/// `[disk]` section of an answer file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiskAnswers {
    /// Target device path, e.g. `/dev/sda`
    pub device: Option<String>,
    /// Swap partition size in MiB
    pub swap_mib: Option<u64>,
    /// Accept a disk below the supported minimum
    #[serde(default)]
    pub allow_small_disk: bool,
}

/// A TOML answer file for unattended installs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerFile {
    /// System identity answers
    pub system: SystemAnswers,
    /// Build selection answers
    pub build: BuildAnswers,
    /// Disk answers; prompted for when omitted
    #[serde(default)]
    pub disk: Option<DiskAnswers>,
}

impl AnswerFile {
    /// Load and parse an answer file
    pub fn load(path: &Path) -> Result<Self, AnswerError> {
        if !path.exists() {
            return Err(AnswerError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| AnswerError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let answers: Self = toml::from_str(&content).map_err(|source| AnswerError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        answers.validate()?;
        Ok(answers)
    }

    /// Reject answers the interview would also reject
    fn validate(&self) -> Result<(), AnswerError> {
        if self.system.username.trim().is_empty() {
            return Err(AnswerError::Invalid {
                field: "system.username".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.system.root_password.is_empty() {
            return Err(AnswerError::Invalid {
                field: "system.root_password".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.system.user_password.is_empty() {
            return Err(AnswerError::Invalid {
                field: "system.user_password".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if let Some(hostname) = &self.system.hostname {
            if hostname.trim().is_empty() {
                return Err(AnswerError::Invalid {
                    field: "system.hostname".to_string(),
                    reason: "must not be empty when present".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Convert into the immutable install configuration
    pub fn into_config(self) -> InstallConfig {
        InstallConfig {
            hostname: self
                .system
                .hostname
                .unwrap_or_else(|| defaults::DEFAULT_HOSTNAME.to_string()),
            username: self.system.username,
            root_password: self.system.root_password,
            user_password: self.system.user_password,
            libc: self.build.libc,
            init_tools: self.build.init_tools,
            install_x11: self.build.install_x11,
        }
    }

    /// Disk answers, defaulted when the section is missing
    pub fn disk(&self) -> DiskAnswers {
        self.disk.clone().unwrap_or_default()
    }
}

/// Where downloaded source archives are cached between runs
///
/// Prefers the user cache directory so a re-run after a failed build does not
/// re-download gigabytes of sources; falls back to a dot directory in the
/// current directory when no cache dir exists.
pub fn source_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|d| d.join("scratchroot").join(defaults::SOURCES_DIR))
        .unwrap_or_else(|| PathBuf::from(".scratchroot-sources"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_ANSWERS: &str = r#"
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

    #[test]
    fn test_answer_file_parses() {
        let answers: AnswerFile = toml::from_str(SAMPLE_ANSWERS).unwrap();
        assert_eq!(answers.system.hostname.as_deref(), Some("scratch"));
        assert_eq!(answers.build.libc, Libc::Musl);
        assert_eq!(answers.build.init_tools, InitTools::Busybox);
        assert_eq!(answers.disk().device.as_deref(), Some("/dev/vda"));
        assert_eq!(answers.disk().swap_mib, Some(2048));
    }

    #[test]
    fn test_answer_file_into_config() {
        let answers: AnswerFile = toml::from_str(SAMPLE_ANSWERS).unwrap();
        let config = answers.into_config();
        assert_eq!(config.hostname, "scratch");
        assert_eq!(config.username, "alex");
        assert_eq!(config.libc, Libc::Musl);
        assert!(!config.install_x11);
    }

    #[test]
    fn test_hostname_defaults_when_omitted() {
        let toml = r#"
[system]
username = "alex"
root_password = "a"
user_password = "b"

[build]
libc = "glibc"
init_tools = "coreutils"
"#;
        let answers: AnswerFile = toml::from_str(toml).unwrap();
        let config = answers.into_config();
        assert_eq!(config.hostname, defaults::DEFAULT_HOSTNAME);
        assert_eq!(config.libc, Libc::Glibc);
    }

    #[test]
    fn test_empty_username_rejected() {
        let toml = r#"
[system]
username = "  "
root_password = "a"
user_password = "b"

[build]
libc = "glibc"
init_tools = "coreutils"
"#;
        let answers: AnswerFile = toml::from_str(toml).unwrap();
        assert!(matches!(
            answers.validate(),
            Err(AnswerError::Invalid { field, .. }) if field == "system.username"
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AnswerFile::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, AnswerError::NotFound { .. }));
    }
}
