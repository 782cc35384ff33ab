//! Host environment probing
//!
//! Firmware boot-mode detection and block-device enumeration. Both happen
//! once, before any planning; the results feed the partition planner.

use std::path::Path;

use serde::Serialize;

use crate::error::{EnvironmentError, PlanError};
use crate::infra::process;

/// Firmware boot mode of the running host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BootMode {
    /// Legacy BIOS / CSM boot
    Bios,
    /// UEFI boot
    Uefi,
}

impl std::fmt::Display for BootMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bios => write!(f, "BIOS"),
            Self::Uefi => write!(f, "UEFI"),
        }
    }
}

/// Detect the firmware boot mode
///
/// UEFI iff the firmware exposes its efivars interface; anything else is
/// treated as BIOS. There is no failure mode.
pub fn detect_boot_mode() -> BootMode {
    boot_mode_from(Path::new("/sys/firmware/efi"))
}

fn boot_mode_from(efi_path: &Path) -> BootMode {
    if efi_path.exists() {
        BootMode::Uefi
    } else {
        BootMode::Bios
    }
}

/// One disk-type block device reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// Device path, e.g. `/dev/sda` or `/dev/nvme0n1`
    pub path: String,
    /// Capacity in MiB
    pub size_mib: u64,
    /// Hardware model string, when the kernel knows one
    pub model: Option<String>,
}

/// Enumerate disk-type block devices
///
/// Loopback devices, partitions, and removable media readers without media are
/// excluded by asking `lsblk` for whole disks only.
pub fn list_block_devices() -> Result<Vec<DeviceInfo>, EnvironmentError> {
    let output = process::capture("lsblk", &["-b", "-d", "-n", "-o", "NAME,SIZE,TYPE,MODEL"])
        .map_err(|e| EnvironmentError::ProbeFailed {
            error: e.to_string(),
        })?;

    let devices = parse_lsblk(&output);
    if devices.is_empty() {
        return Err(EnvironmentError::NoDisksFound);
    }
    Ok(devices)
}

/// Parse `lsblk -b -d -n -o NAME,SIZE,TYPE,MODEL` output
fn parse_lsblk(output: &str) -> Vec<DeviceInfo> {
    let mut devices = Vec::new();

    for line in output.lines() {
        let mut fields = line.split_whitespace();
        let (Some(name), Some(size), Some(kind)) = (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };

        if kind != "disk" {
            continue;
        }

        let Ok(size_bytes) = size.parse::<u64>() else {
            continue;
        };

        let model: String = fields.collect::<Vec<_>>().join(" ");
        devices.push(DeviceInfo {
            path: format!("/dev/{name}"),
            size_mib: size_bytes / (1024 * 1024),
            model: if model.is_empty() { None } else { Some(model) },
        });
    }

    devices
}

/// Resolve the operator's 1-based disk selection against the probed list
pub fn select_disk<'a>(
    devices: &'a [DeviceInfo],
    input: &str,
) -> Result<&'a DeviceInfo, PlanError> {
    let index: usize = input
        .trim()
        .parse()
        .map_err(|_| PlanError::InvalidSelection {
            input: input.trim().to_string(),
            count: devices.len(),
        })?;

    if index == 0 || index > devices.len() {
        return Err(PlanError::InvalidSelection {
            input: input.trim().to_string(),
            count: devices.len(),
        });
    }

    Ok(&devices[index - 1])
}

/// Fail unless the effective UID is root
pub fn require_root() -> Result<(), EnvironmentError> {
    if nix::unistd::Uid::effective().is_root() {
        Ok(())
    } else {
        Err(EnvironmentError::NotRoot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LSBLK_OUTPUT: &str = "\
sda      512110190592 disk Samsung SSD 870
sda1       1073741824 part
nvme0n1  256060514304 disk WDC PC SN530
sr0        1073741824 rom
loop0       4096000   loop
";

    #[test]
    fn test_parse_lsblk_keeps_disks_only() {
        let devices = parse_lsblk(LSBLK_OUTPUT);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].path, "/dev/sda");
        assert_eq!(devices[0].model.as_deref(), Some("Samsung SSD 870"));
        assert_eq!(devices[1].path, "/dev/nvme0n1");
    }

    #[test]
    fn test_parse_lsblk_converts_bytes_to_mib() {
        let devices = parse_lsblk(LSBLK_OUTPUT);
        assert_eq!(devices[0].size_mib, 512_110_190_592 / (1024 * 1024));
    }

    #[test]
    fn test_parse_lsblk_empty_output() {
        assert!(parse_lsblk("").is_empty());
    }

    #[test]
    fn test_boot_mode_from_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            boot_mode_from(&dir.path().join("efi")),
            BootMode::Bios
        );
    }

    #[test]
    fn test_boot_mode_from_present_path() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(boot_mode_from(dir.path()), BootMode::Uefi);
    }

    #[test]
    fn test_select_disk_valid_index() {
        let devices = parse_lsblk(LSBLK_OUTPUT);
        let disk = select_disk(&devices, "2").unwrap();
        assert_eq!(disk.path, "/dev/nvme0n1");
    }

    #[test]
    fn test_select_disk_out_of_range() {
        let devices = parse_lsblk(LSBLK_OUTPUT);
        assert!(matches!(
            select_disk(&devices, "5"),
            Err(PlanError::InvalidSelection { .. })
        ));
        assert!(matches!(
            select_disk(&devices, "0"),
            Err(PlanError::InvalidSelection { .. })
        ));
    }

    #[test]
    fn test_select_disk_non_numeric() {
        let devices = parse_lsblk(LSBLK_OUTPUT);
        let err = select_disk(&devices, "sda").unwrap_err();
        assert!(matches!(err, PlanError::InvalidSelection { input, .. } if input == "sda"));
    }
}
