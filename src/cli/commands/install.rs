//! CLI command for `scratchroot install`
//!
//! The full run: preflight, interview, probe, partition, fetch, and the build
//! phase pipeline. Strictly linear; the first failure aborts everything, with
//! a best-effort mount teardown once the disk has been provisioned.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::cli::output::{
    create_download_bar, is_json, is_quiet, print_detail, print_info, print_success,
    print_warning,
};
use crate::cli::prompt;
use crate::config::defaults;
use crate::core::doctor::run_doctor;
use crate::core::fetch::fetch_all;
use crate::core::packages::resolve_package_set;
use crate::core::pipeline::InstallStage;
use crate::core::plan::{plan_partitions, DiskPlan};
use crate::core::probe::{detect_boot_mode, list_block_devices, require_root};
use crate::core::provision::{apply_plan, teardown, MountedLayout};
use crate::core::recipes::build_pipeline;
use crate::core::settings::{AnswerFile, DiskAnswers, InitTools, InstallConfig, Libc};
use crate::core::sysconfig;
use crate::error::{InstallerError, PlanError};
use crate::infra::download::{DownloadManager, ProgressCallback};
use crate::infra::process::HostRunner;

/// Options for the install command
#[derive(Debug)]
pub struct InstallOptions {
    /// Answer file for an unattended install
    pub answers: Option<PathBuf>,
    /// Skip the destructive-overwrite confirmation
    pub yes: bool,
    /// Swap size override in MiB
    pub swap_mib: Option<u64>,
}

/// Execute the install command
pub async fn execute(options: InstallOptions) -> Result<()> {
    // Init: privileges and host tools, before anything else
    stage(InstallStage::Init);
    require_root()?;
    preflight()?;

    // Configure
    stage(InstallStage::Configure);
    let (config, disk_answers) = collect_configuration(&options)?;

    let roadmap: Vec<&str> = InstallStage::sequence(config.install_x11)
        .iter()
        .map(|s| s.title())
        .collect();
    print_info(&format!("Run plan: {}", roadmap.join(" -> ")));

    // ProbeBootMode
    stage(InstallStage::ProbeBootMode);
    let boot_mode = detect_boot_mode();
    print_info(&format!("Firmware boot mode: {boot_mode}"));

    let devices = list_block_devices()?;
    let target = match &disk_answers.device {
        Some(path) => devices
            .iter()
            .find(|d| &d.path == path)
            .cloned()
            .with_context(|| format!("Answer file names '{path}' but no such disk was probed"))?,
        None => super::plan::choose_disk(&devices)?,
    };

    let swap_mib = options
        .swap_mib
        .or(disk_answers.swap_mib)
        .unwrap_or(defaults::DEFAULT_SWAP_MIB);

    let plan = match plan_partitions(&target, boot_mode, swap_mib, disk_answers.allow_small_disk)
    {
        Ok(plan) => plan,
        Err(PlanError::DiskTooSmall {
            device,
            size_mib,
            min_mib,
        }) => {
            print_warning(&format!(
                "{device} is {size_mib} MiB, below the {min_mib} MiB minimum"
            ));
            if !prompt::confirm("Continue with this disk anyway?", false)? {
                return Err(InstallerError::Aborted(
                    "undersized disk declined".to_string(),
                )
                .into());
            }
            plan_partitions(&target, boot_mode, swap_mib, true)?
        }
        Err(e) => return Err(e.into()),
    };

    super::plan::print_plan(&plan);

    // The last gate before anything irreversible
    if !options.yes {
        print_warning(&format!(
            "Everything on {} will be DESTROYED. This cannot be undone.",
            plan.device
        ));
        if !prompt::confirm(&format!("Erase {} and install?", plan.device), false)? {
            return Err(InstallerError::Aborted("overwrite declined".to_string()).into());
        }
    }

    // PartitionDisk
    stage(InstallStage::PartitionDisk);
    let install_root = Path::new(defaults::INSTALL_ROOT);
    let mut runner = HostRunner;
    let mut layout = apply_plan(&plan, install_root, &mut runner)?;

    // Everything after provisioning unwinds the mounts on failure
    match run_build(&config, &plan, &mut layout, install_root, &mut runner).await {
        Ok(()) => {
            stage(InstallStage::Complete);
            print_success(&format!(
                "Installation finished. '{}' is ready to reboot into.",
                config.hostname
            ));
            Ok(())
        }
        Err(e) => {
            teardown(&layout, &mut runner);
            Err(e)
        }
    }
}

/// Fetch, configure, and run the build phases against the mounted target
async fn run_build(
    config: &InstallConfig,
    plan: &DiskPlan,
    layout: &mut MountedLayout,
    install_root: &Path,
    runner: &mut HostRunner,
) -> Result<()> {
    // Fetch
    stage(InstallStage::Fetch);
    let set = resolve_package_set(config);
    let sources_dir = install_root.join(defaults::SOURCES_DIR);

    let manager = DownloadManager::new();
    let make_progress =
        |spec: &crate::config::sources::SourceSpec| -> Option<ProgressCallback> {
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
    let report = fetch_all(&set, &sources_dir, &manager, Some(&make_progress)).await?;

    for (name, error) in &report.failed {
        print_warning(&format!(
            "download failed for {name}: {error}; its build phase will fail"
        ));
    }
    for name in &report.mismatched {
        print_warning(&format!("checksum mismatch for {name}; kept anyway"));
    }
    print_info(&format!(
        "{} archives fetched, {} already present",
        report.fetched.len(),
        report.skipped.len()
    ));

    // Target configuration files; written before the chroot phases need them
    let kernel_version = set
        .get("linux")
        .map(|s| s.version)
        .unwrap_or("unknown");
    sysconfig::write_system_files(install_root, config, plan, kernel_version)?;

    // Build phases, fail-fast
    let pipeline = build_pipeline(config, &set, plan, install_root, num_cpus::get())?;
    print_info(&format!(
        "{} steps across {} build phases",
        pipeline.step_count(),
        pipeline.phases().len()
    ));
    pipeline.run(runner, |phase| {
        print_info(&format!("Phase: {}", phase.name));
    })?;

    layout.mark_virtual_filesystems(defaults::VIRTUAL_FILESYSTEMS);
    Ok(())
}

/// Run the required preflight checks, printing what failed
fn preflight() -> Result<()> {
    let report = run_doctor();
    if report.all_required_passed() {
        return Ok(());
    }

    for check in report.failed_required() {
        print_warning(&format!("missing required: {}", check.name));
        if let Some(suggestion) = &check.suggestion {
            print_detail(suggestion);
        }
    }
    bail!("Host is missing required tools; run 'scratchroot doctor' for details")
}

/// Load the answer file, or interview the operator
fn collect_configuration(options: &InstallOptions) -> Result<(InstallConfig, DiskAnswers)> {
    match &options.answers {
        Some(path) => {
            let answers = AnswerFile::load(path)?;
            let disk = answers.disk();
            print_info(&format!("Using answers from {}", path.display()));
            Ok((answers.into_config(), disk))
        }
        None => {
            let config = interview()?;
            Ok((config, DiskAnswers::default()))
        }
    }
}

/// The interactive interview: identity first, then build choices
fn interview() -> Result<InstallConfig> {
    print_info("Configure the system to install");

    let hostname = prompt::prompt_default("Hostname", defaults::DEFAULT_HOSTNAME)?;
    let username = prompt::prompt_required("username", "Username")?;
    let root_password = prompt::prompt_required("root password", "Root password")?;
    let user_password = prompt::prompt_required("user password", "User password")?;

    let libc = match prompt::prompt_choice("libc", "C library", &["glibc", "musl"])? {
        0 => Libc::Glibc,
        _ => Libc::Musl,
    };
    let init_tools = match prompt::prompt_choice(
        "init tools",
        "Core userland",
        &["coreutils", "busybox"],
    )? {
        0 => InitTools::Coreutils,
        _ => InitTools::Busybox,
    };
    let install_x11 = prompt::confirm("Install the X11 stack?", false)?;

    Ok(InstallConfig {
        hostname,
        username,
        root_password,
        user_password,
        libc,
        init_tools,
        install_x11,
    })
}

fn stage(stage: InstallStage) {
    print_info(&format!("=== {} ===", stage.title()));
}
