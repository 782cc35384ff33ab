//! CLI command for `scratchroot fetch`
//!
//! Resolves the package set for a configuration and downloads the source
//! archives into a cache directory. Individual download failures are
//! warnings; the command only fails when the destination is unusable.

use std::path::PathBuf;

use anyhow::Result;

use crate::cli::output::{
    create_download_bar, is_json, is_quiet, print_detail, print_info, print_success,
    print_warning,
};
use crate::core::fetch::{fetch_all, sources_dir_size};
use crate::core::packages::resolve_package_set;
use crate::core::settings::{AnswerFile, InitTools, InstallConfig, Libc};
use crate::infra::download::{DownloadManager, ProgressCallback};

/// Options for the fetch command
#[derive(Debug)]
pub struct FetchOptions {
    /// Answer file supplying the build selections
    pub answers: Option<PathBuf>,
    /// C library choice when no answer file is given
    pub libc: Libc,
    /// Userland choice when no answer file is given
    pub init_tools: InitTools,
    /// Include the X11 stack
    pub install_x11: bool,
    /// Download directory override
    pub dest: Option<PathBuf>,
    /// Resolve and list only
    pub list: bool,
}

/// Execute the fetch command
pub async fn execute(options: FetchOptions) -> Result<()> {
    let config = match &options.answers {
        Some(path) => AnswerFile::load(path)?.into_config(),
        None => InstallConfig {
            libc: options.libc,
            init_tools: options.init_tools,
            install_x11: options.install_x11,
            // Identity fields are irrelevant for resolution
            username: "-".to_string(),
            root_password: "-".to_string(),
            user_password: "-".to_string(),
            ..InstallConfig::default()
        },
    };

    let set = resolve_package_set(&config);

    if options.list {
        if is_json() {
            println!("{}", serde_json::to_string_pretty(&set.to_json())?);
        } else {
            print_info(&format!(
                "{} source archives for libc={}, init-tools={}, x11={}:",
                set.len(),
                config.libc,
                config.init_tools,
                config.install_x11
            ));
            for spec in set.sources() {
                print_detail(&format!("{:<14}{:<10}{}", spec.name, spec.version, spec.url));
            }
        }
        return Ok(());
    }

    let dest = options
        .dest
        .unwrap_or_else(crate::core::settings::source_cache_dir);
    print_info(&format!(
        "Fetching {} archives into {}",
        set.len(),
        dest.display()
    ));

    let manager = DownloadManager::new();
    let make_progress = |spec: &crate::config::sources::SourceSpec| -> Option<ProgressCallback> {
        if is_quiet() || is_json() {
            return None;
        }
        let bar = create_download_bar(0, spec.archive_name());
        Some(Box::new(move |downloaded, total| {
            if total > 0 {
                bar.set_length(total);
            }
            bar.set_position(downloaded);
        }))
    };

    let report = fetch_all(&set, &dest, &manager, Some(&make_progress)).await?;

    if is_json() {
        println!("{}", serde_json::to_string_pretty(&report.to_json())?);
        return Ok(());
    }

    for (name, error) in &report.failed {
        print_warning(&format!("download failed for {name}: {error}"));
    }
    for name in &report.mismatched {
        print_warning(&format!("checksum mismatch for {name}; kept anyway"));
    }

    let size_mib = sources_dir_size(&dest) / (1024 * 1024);
    if report.is_clean() {
        print_success(&format!(
            "{} fetched, {} already present ({size_mib} MiB on disk)",
            report.fetched.len(),
            report.skipped.len()
        ));
    } else {
        print_warning(&format!(
            "{} fetched, {} already present, {} failed; missing archives will fail their build phase",
            report.fetched.len(),
            report.skipped.len(),
            report.failed.len()
        ));
    }

    Ok(())
}
