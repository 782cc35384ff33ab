//! Disk provisioning
//!
//! Applies a [`DiskPlan`] to real hardware: GPT label, partitions, filesystems,
//! swap, and the mounts the rest of the install builds into. Destructive and
//! deliberately dumb. The overwrite confirmation happens before this module
//! is ever called, and a failure mid-sequence leaves the disk as-is and aborts
//! the run.

use std::path::{Path, PathBuf};

use crate::core::plan::{DiskPlan, Filesystem, PartitionRole, PartitionSpec};
use crate::error::PipelineError;
use crate::infra::process::{Step, StepRunner};

const PHASE: &str = "partition-disk";

/// What `apply_plan` leaves mounted for the build stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountedLayout {
    /// Where the root filesystem is mounted
    pub root_mount: PathBuf,
    /// Where the ESP is mounted, under the root mount (UEFI only)
    pub esp_mount: Option<PathBuf>,
    /// Activated swap device
    pub swap_device: String,
    /// Virtual filesystems bound into the root, once the pipeline binds them
    pub bound: Vec<String>,
}

impl MountedLayout {
    /// Record the virtual filesystems the pipeline has bound
    pub fn mark_virtual_filesystems(&mut self, names: &[&str]) {
        self.bound = names.iter().map(|n| (*n).to_string()).collect();
    }
}

/// The exact steps `apply_plan` will run, in order
///
/// Split out so the steps can be inspected (and tested) without a disk.
pub fn provision_steps(plan: &DiskPlan, install_root: &Path) -> Vec<Step> {
    let mut steps = Vec::new();
    let root_mount = install_root.display().to_string();

    steps.push(Step::new(
        "parted",
        &["-s", plan.device.as_str(), "mklabel", "gpt"],
    ));

    for part in &plan.partitions {
        steps.push(mkpart_step(plan, part));
        if let Some(flag) = flag_for(part.role) {
            let number = part.number.to_string();
            steps.push(Step::new(
                "parted",
                &[
                    "-s",
                    plan.device.as_str(),
                    "set",
                    number.as_str(),
                    flag,
                    "on",
                ],
            ));
        }
    }

    for part in &plan.partitions {
        let device = plan.partition_device(part.number);
        match part.filesystem {
            Filesystem::None => {}
            Filesystem::Fat32 => {
                steps.push(Step::new("mkfs.vfat", &["-F32", device.as_str()]));
            }
            Filesystem::Ext4 => {
                steps.push(Step::new("mkfs.ext4", &["-F", device.as_str()]));
            }
            Filesystem::LinuxSwap => {
                steps.push(Step::new("mkswap", &[device.as_str()]));
            }
        }
    }

    steps.push(Step::new("swapon", &[plan.swap_device().as_str()]));
    steps.push(Step::new("mkdir", &["-p", root_mount.as_str()]));
    steps.push(Step::new(
        "mount",
        &[plan.root_device().as_str(), root_mount.as_str()],
    ));

    if let Some(esp_device) = plan.esp_device() {
        let esp_mount = format!("{root_mount}/boot/efi");
        steps.push(Step::new("mkdir", &["-p", esp_mount.as_str()]));
        steps.push(Step::new(
            "mount",
            &[esp_device.as_str(), esp_mount.as_str()],
        ));
    }

    steps
}

/// Apply the plan: partition, format, activate swap, mount
pub fn apply_plan(
    plan: &DiskPlan,
    install_root: &Path,
    runner: &mut dyn StepRunner,
) -> Result<MountedLayout, PipelineError> {
    tracing::info!(device = %plan.device, boot_mode = %plan.boot_mode, "provisioning disk");

    for step in provision_steps(plan, install_root) {
        runner.run(PHASE, &step)?;
    }

    Ok(MountedLayout {
        root_mount: install_root.to_path_buf(),
        esp_mount: plan
            .esp_device()
            .map(|_| install_root.join("boot").join("efi")),
        swap_device: plan.swap_device(),
        bound: Vec::new(),
    })
}

/// Best-effort unwind after a fatal error: deactivate swap, unmount the tree
///
/// Failures here are logged and ignored; the run is already aborting and the
/// partition table is not rolled back.
pub fn teardown(layout: &MountedLayout, runner: &mut dyn StepRunner) {
    tracing::info!(root = %layout.root_mount.display(), "tearing down mounts after abort");

    let swapoff = Step::new("swapoff", &[layout.swap_device.as_str()]);
    if let Err(e) = runner.run("teardown", &swapoff) {
        tracing::warn!(error = %e, "swapoff failed during teardown");
    }

    let root = layout.root_mount.display().to_string();
    let umount = Step::new("umount", &["-R", root.as_str()]);
    if let Err(e) = runner.run("teardown", &umount) {
        tracing::warn!(error = %e, "umount failed during teardown");
    }
}

fn mkpart_step(plan: &DiskPlan, part: &PartitionSpec) -> Step {
    let start = format!("{}MiB", part.start_mib);
    let end = if part.end_mib == plan.disk_mib {
        "100%".to_string()
    } else {
        format!("{}MiB", part.end_mib)
    };

    let mut args = vec![
        "-s".to_string(),
        plan.device.clone(),
        "mkpart".to_string(),
        label_for(part.role).to_string(),
    ];
    if let Some(fs) = part.filesystem.parted_name() {
        args.push(fs.to_string());
    }
    args.push(start);
    args.push(end);

    Step::new("parted", &args)
}

fn label_for(role: PartitionRole) -> &'static str {
    match role {
        PartitionRole::BiosBoot => "bios-boot",
        PartitionRole::Esp => "esp",
        PartitionRole::Root => "root",
        PartitionRole::Swap => "swap",
    }
}

fn flag_for(role: PartitionRole) -> Option<&'static str> {
    match role {
        PartitionRole::BiosBoot => Some("bios_grub"),
        PartitionRole::Esp => Some("esp"),
        PartitionRole::Root | PartitionRole::Swap => None,
    }
}
