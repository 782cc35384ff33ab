//! CLI command for `scratchroot plan`
//!
//! Probes the environment, computes the partition plan for a disk, and prints
//! it without touching anything.

use anyhow::{bail, Result};

use crate::cli::output::{is_json, print_detail, print_info, print_warning};
use crate::cli::prompt;
use crate::config::defaults;
use crate::core::plan::{plan_partitions, DiskPlan};
use crate::core::probe::{detect_boot_mode, list_block_devices, select_disk, DeviceInfo};
use crate::error::PlanError;

/// Execute the plan command
pub async fn execute(disk: Option<String>, swap_mib: Option<u64>, force_size: bool) -> Result<()> {
    let boot_mode = detect_boot_mode();
    let devices = list_block_devices()?;

    let target = match disk {
        Some(path) => devices
            .iter()
            .find(|d| d.path == path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("No disk-type block device at '{path}'"))?,
        None => choose_disk(&devices)?,
    };

    let swap_mib = swap_mib.unwrap_or(defaults::DEFAULT_SWAP_MIB);

    let plan = match plan_partitions(&target, boot_mode, swap_mib, force_size) {
        Ok(plan) => plan,
        Err(PlanError::DiskTooSmall {
            device,
            size_mib,
            min_mib,
        }) => {
            print_warning(&format!(
                "{device} is {size_mib} MiB, below the {min_mib} MiB minimum"
            ));
            if !prompt::confirm("Plan for it anyway?", false)? {
                bail!("Refusing to plan for an undersized disk");
            }
            plan_partitions(&target, boot_mode, swap_mib, true)?
        }
        Err(e) => return Err(e.into()),
    };

    if is_json() {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    print_plan(&plan);
    Ok(())
}

/// List the probed disks and ask for one
pub fn choose_disk(devices: &[DeviceInfo]) -> Result<DeviceInfo> {
    print_info("Detected disks:");
    for (i, device) in devices.iter().enumerate() {
        let model = device.model.as_deref().unwrap_or("unknown model");
        print_detail(&format!(
            "{}) {}  {} MiB  {model}",
            i + 1,
            device.path,
            device.size_mib
        ));
    }

    let input = prompt::prompt_raw(&format!("Select a disk [1-{}]: ", devices.len()))?;
    let selected = select_disk(devices, &input)?;
    Ok(selected.clone())
}

/// Human-readable plan rendering
pub fn print_plan(plan: &DiskPlan) {
    print_info(&format!(
        "Partition plan for {} ({} boot, {} MiB):",
        plan.device, plan.boot_mode, plan.disk_mib
    ));
    for part in &plan.partitions {
        print_detail(&format!(
            "{}  {:?}  {:?}  {}..{} MiB ({} MiB)",
            plan.partition_device(part.number),
            part.role,
            part.filesystem,
            part.start_mib,
            part.end_mib,
            part.size_mib(),
        ));
    }
}
