//! Source archive fetching
//!
//! Downloads every archive in the resolved package set, one at a time. A
//! failed download or a checksum mismatch is advisory: it is recorded in the
//! report and the run continues, deferring the consequence to whichever build
//! phase needs the missing archive.

use std::path::{Path, PathBuf};

use crate::config::sources::SourceSpec;
use crate::core::packages::PackageSet;
use crate::error::DownloadError;
use crate::infra::download::{verify_checksum, DownloadManager, ProgressCallback};

/// Builds a byte-progress callback for one archive, or None for silent fetches
pub type ProgressFactory<'a> = &'a dyn Fn(&SourceSpec) -> Option<ProgressCallback>;

/// Outcome of fetching a package set
#[derive(Debug, Default)]
pub struct FetchReport {
    /// Archives downloaded this run
    pub fetched: Vec<String>,
    /// Archives already present with a good (or unverifiable) checksum
    pub skipped: Vec<String>,
    /// Downloads that failed, with the error message
    pub failed: Vec<(String, String)>,
    /// Archives whose checksum did not match the expected digest
    pub mismatched: Vec<String>,
}

impl FetchReport {
    /// Whether every archive came down (or was already present) clean
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.mismatched.is_empty()
    }

    /// Number of archives accounted for
    pub fn total(&self) -> usize {
        self.fetched.len() + self.skipped.len() + self.failed.len()
    }

    /// Summary for `--json` output
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "fetched": self.fetched,
            "skipped": self.skipped,
            "failed": self.failed.iter().map(|(name, error)| {
                serde_json::json!({ "name": name, "error": error })
            }).collect::<Vec<_>>(),
            "mismatched": self.mismatched,
        })
    }
}

/// Download every archive in the set into `dest`
///
/// Only the destination directory being unwritable is fatal; everything
/// per-archive is advisory and lands in the report.
pub async fn fetch_all(
    set: &PackageSet,
    dest: &Path,
    manager: &DownloadManager,
    progress: Option<ProgressFactory<'_>>,
) -> Result<FetchReport, DownloadError> {
    std::fs::create_dir_all(dest).map_err(|e| DownloadError::IoError {
        path: dest.to_path_buf(),
        error: e.to_string(),
    })?;

    let mut report = FetchReport::default();

    for spec in set.sources() {
        let target = archive_path(dest, spec);

        if can_skip(&target, spec) {
            tracing::debug!(package = spec.name, "archive already present, skipping");
            report.skipped.push(spec.name.to_string());
            continue;
        }

        let callback = progress.and_then(|factory| factory(spec));
        match manager.download(spec.url, &target, callback).await {
            Ok(result) => {
                report.fetched.push(spec.name.to_string());
                if let Some(expected) = spec.sha256 {
                    if result.checksum.to_lowercase() != expected.to_lowercase() {
                        tracing::warn!(
                            package = spec.name,
                            expected,
                            actual = %result.checksum,
                            "checksum mismatch, continuing"
                        );
                        report.mismatched.push(spec.name.to_string());
                    }
                }
            }
            Err(e) => {
                tracing::warn!(package = spec.name, error = %e, "download failed, continuing");
                report.failed.push((spec.name.to_string(), e.to_string()));
            }
        }
    }

    Ok(report)
}

/// Where one archive lands under the sources directory
pub fn archive_path(dest: &Path, spec: &SourceSpec) -> PathBuf {
    dest.join(spec.archive_name())
}

/// An archive on disk can be skipped when its checksum still matches, or when
/// there is no expected digest to check against
fn can_skip(target: &Path, spec: &SourceSpec) -> bool {
    if !target.exists() {
        return false;
    }
    match spec.sha256 {
        Some(expected) => verify_checksum(target, expected).unwrap_or(false),
        None => true,
    }
}

/// Total size in bytes of everything under the sources directory
pub fn sources_dir_size(dest: &Path) -> u64 {
    walkdir::WalkDir::new(dest)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|meta| meta.len())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::packages::resolve_package_set;
    use crate::core::settings::InstallConfig;

    #[test]
    fn test_archive_path_uses_url_file_name() {
        let config = InstallConfig::default();
        let set = resolve_package_set(&config);
        let spec = set.get("binutils").unwrap();

        let path = archive_path(Path::new("/mnt/lfs/sources"), spec);
        assert_eq!(
            path,
            PathBuf::from("/mnt/lfs/sources/binutils-2.42.tar.xz")
        );
    }

    #[test]
    fn test_report_clean_when_empty() {
        let report = FetchReport::default();
        assert!(report.is_clean());
        assert_eq!(report.total(), 0);
    }

    #[test]
    fn test_report_not_clean_with_failures() {
        let report = FetchReport {
            failed: vec![("gcc".to_string(), "HTTP 404".to_string())],
            ..FetchReport::default()
        };
        assert!(!report.is_clean());
    }

    #[test]
    fn test_sources_dir_size_sums_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.tar.xz"), vec![0u8; 100]).unwrap();
        std::fs::write(dir.path().join("b.tar.xz"), vec![0u8; 50]).unwrap();

        assert_eq!(sources_dir_size(dir.path()), 150);
    }
}
