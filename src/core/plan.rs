//! Partition planning
//!
//! Computes the destructive disk layout for a chosen device: a GPT table with
//! a boot partition matching the firmware mode, the root filesystem, and swap.
//! The plan is pure data; applying it to hardware is the provisioner's job.
//!
//! Root always gets the remainder of the disk and swap gets exactly the
//! requested size; the sizing rationale is recorded in DESIGN.md.

use serde::Serialize;

use crate::config::defaults;
use crate::core::probe::{BootMode, DeviceInfo};
use crate::error::PlanError;

/// What a partition is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionRole {
    /// GRUB core-image stub for BIOS boots from GPT
    BiosBoot,
    /// EFI system partition
    Esp,
    /// Root filesystem
    Root,
    /// Swap space
    Swap,
}

/// Filesystem written onto a partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Filesystem {
    /// No filesystem; raw partition (BIOS boot stub)
    None,
    /// FAT32, for the ESP
    Fat32,
    /// ext4
    Ext4,
    /// Linux swap
    LinuxSwap,
}

impl Filesystem {
    /// Filesystem name as `parted mkpart` expects it
    pub fn parted_name(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Fat32 => Some("fat32"),
            Self::Ext4 => Some("ext4"),
            Self::LinuxSwap => Some("linux-swap"),
        }
    }
}

/// One planned partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionSpec {
    /// 1-based partition number on the device
    pub number: u32,
    /// What the partition is for
    pub role: PartitionRole,
    /// Filesystem to create
    pub filesystem: Filesystem,
    /// Start offset in MiB from the beginning of the disk
    pub start_mib: u64,
    /// End offset in MiB; equal to the disk size for the last partition
    pub end_mib: u64,
}

impl PartitionSpec {
    /// Partition size in MiB
    pub fn size_mib(&self) -> u64 {
        self.end_mib - self.start_mib
    }
}

/// A complete partition layout for one disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiskPlan {
    /// Target device path
    pub device: String,
    /// Firmware mode the layout boots under
    pub boot_mode: BootMode,
    /// Disk capacity in MiB
    pub disk_mib: u64,
    /// Partitions in on-disk order
    pub partitions: Vec<PartitionSpec>,
}

impl DiskPlan {
    /// Device path of one partition, e.g. `/dev/sda2` or `/dev/nvme0n1p2`
    pub fn partition_device(&self, number: u32) -> String {
        partition_device(&self.device, number)
    }

    /// The partition with the given role, if planned
    pub fn partition(&self, role: PartitionRole) -> Option<&PartitionSpec> {
        self.partitions.iter().find(|p| p.role == role)
    }

    /// Device path of the root partition
    pub fn root_device(&self) -> String {
        let root = self
            .partition(PartitionRole::Root)
            .expect("every plan has a root partition");
        self.partition_device(root.number)
    }

    /// Device path of the swap partition
    pub fn swap_device(&self) -> String {
        let swap = self
            .partition(PartitionRole::Swap)
            .expect("every plan has a swap partition");
        self.partition_device(swap.number)
    }

    /// Device path of the ESP, when the layout has one
    pub fn esp_device(&self) -> Option<String> {
        self.partition(PartitionRole::Esp)
            .map(|esp| self.partition_device(esp.number))
    }
}

/// Derive a partition device path from the disk path and partition number
///
/// NVMe namespaces take a `p` infix before the number; everything else gets
/// the bare number appended.
pub fn partition_device(disk: &str, number: u32) -> String {
    if disk.contains("nvme") {
        format!("{disk}p{number}")
    } else {
        format!("{disk}{number}")
    }
}

/// Compute the partition layout for a disk
///
/// The plan covers the disk from 1 MiB to 100 % with contiguous, 1 MiB
/// aligned partitions. A disk below the supported minimum is refused unless
/// `allow_undersized` carries the operator's explicit override.
pub fn plan_partitions(
    disk: &DeviceInfo,
    boot_mode: BootMode,
    swap_mib: u64,
    allow_undersized: bool,
) -> Result<DiskPlan, PlanError> {
    if disk.size_mib < defaults::MIN_DISK_MIB && !allow_undersized {
        return Err(PlanError::DiskTooSmall {
            device: disk.path.clone(),
            size_mib: disk.size_mib,
            min_mib: defaults::MIN_DISK_MIB,
        });
    }

    let boot_partition = match boot_mode {
        BootMode::Bios => PartitionSpec {
            number: 1,
            role: PartitionRole::BiosBoot,
            filesystem: Filesystem::None,
            start_mib: defaults::ALIGNMENT_MIB,
            end_mib: defaults::BIOS_BOOT_END_MIB,
        },
        BootMode::Uefi => PartitionSpec {
            number: 1,
            role: PartitionRole::Esp,
            filesystem: Filesystem::Fat32,
            start_mib: defaults::ALIGNMENT_MIB,
            end_mib: defaults::ESP_END_MIB,
        },
    };

    let root_start = boot_partition.end_mib;
    let swap_start = disk.size_mib.saturating_sub(swap_mib);
    if swap_start <= root_start {
        return Err(PlanError::SwapTooLarge {
            device: disk.path.clone(),
            swap_mib,
        });
    }

    let partitions = vec![
        boot_partition,
        PartitionSpec {
            number: 2,
            role: PartitionRole::Root,
            filesystem: Filesystem::Ext4,
            start_mib: root_start,
            end_mib: swap_start,
        },
        PartitionSpec {
            number: 3,
            role: PartitionRole::Swap,
            filesystem: Filesystem::LinuxSwap,
            start_mib: swap_start,
            end_mib: disk.size_mib,
        },
    ];

    Ok(DiskPlan {
        device: disk.path.clone(),
        boot_mode,
        disk_mib: disk.size_mib,
        partitions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn disk(path: &str, size_mib: u64) -> DeviceInfo {
        DeviceInfo {
            path: path.to_string(),
            size_mib,
            model: None,
        }
    }

    #[test]
    fn test_bios_layout() {
        let plan = plan_partitions(&disk("/dev/sda", 100 * 1024), BootMode::Bios, 4096, false)
            .unwrap();

        assert_eq!(plan.partitions.len(), 3);
        assert_eq!(plan.partitions[0].role, PartitionRole::BiosBoot);
        assert_eq!(plan.partitions[0].start_mib, 1);
        assert_eq!(plan.partitions[0].end_mib, 2);
        assert_eq!(plan.partitions[1].role, PartitionRole::Root);
        assert_eq!(plan.partitions[1].start_mib, 2);
        assert_eq!(plan.partitions[2].role, PartitionRole::Swap);
        assert_eq!(plan.partitions[2].size_mib(), 4096);
        assert!(plan.partition(PartitionRole::Esp).is_none());
    }

    #[test]
    fn test_uefi_layout() {
        let plan = plan_partitions(&disk("/dev/sda", 100 * 1024), BootMode::Uefi, 4096, false)
            .unwrap();

        assert_eq!(plan.partitions[0].role, PartitionRole::Esp);
        assert_eq!(plan.partitions[0].filesystem, Filesystem::Fat32);
        assert_eq!(plan.partitions[0].end_mib, 513);
        assert_eq!(plan.partitions[1].start_mib, 513);
        assert!(plan.partition(PartitionRole::BiosBoot).is_none());
    }

    #[test]
    fn test_root_gets_remainder_not_swap_size() {
        let plan = plan_partitions(&disk("/dev/sda", 100 * 1024), BootMode::Uefi, 4096, false)
            .unwrap();

        let root = plan.partition(PartitionRole::Root).unwrap();
        let swap = plan.partition(PartitionRole::Swap).unwrap();
        assert!(root.size_mib() > swap.size_mib());
        assert_eq!(swap.size_mib(), 4096);
        assert_eq!(root.size_mib(), 100 * 1024 - 513 - 4096);
    }

    #[test]
    fn test_undersized_disk_refused_without_override() {
        let err = plan_partitions(&disk("/dev/sdb", 20 * 1024), BootMode::Bios, 4096, false)
            .unwrap_err();
        assert!(matches!(err, PlanError::DiskTooSmall { .. }));
    }

    #[test]
    fn test_undersized_disk_allowed_with_override() {
        let plan =
            plan_partitions(&disk("/dev/sdb", 20 * 1024), BootMode::Bios, 4096, true).unwrap();
        assert_eq!(plan.partitions.len(), 3);
    }

    #[test]
    fn test_swap_larger_than_disk_refused() {
        let err = plan_partitions(&disk("/dev/sdb", 30 * 1024), BootMode::Bios, 31 * 1024, false)
            .unwrap_err();
        assert!(matches!(err, PlanError::SwapTooLarge { .. }));
    }

    #[test]
    fn test_nvme_partition_naming() {
        let plan = plan_partitions(
            &disk("/dev/nvme0n1", 100 * 1024),
            BootMode::Uefi,
            4096,
            false,
        )
        .unwrap();

        assert_eq!(plan.partition_device(1), "/dev/nvme0n1p1");
        assert_eq!(plan.root_device(), "/dev/nvme0n1p2");
        assert_eq!(plan.swap_device(), "/dev/nvme0n1p3");
        assert_eq!(plan.esp_device().as_deref(), Some("/dev/nvme0n1p1"));
    }

    #[test]
    fn test_sata_partition_naming() {
        assert_eq!(partition_device("/dev/sda", 2), "/dev/sda2");
        assert_eq!(partition_device("/dev/vdb", 3), "/dev/vdb3");
    }

    proptest! {
        /// Any plan for a supported disk covers 1 MiB to 100 % contiguously.
        #[test]
        fn prop_plan_covers_disk(
            size_mib in defaults::MIN_DISK_MIB..4 * 1024 * 1024u64,
            swap_mib in 512..16 * 1024u64,
            uefi in any::<bool>(),
        ) {
            let mode = if uefi { BootMode::Uefi } else { BootMode::Bios };
            let plan = plan_partitions(&disk("/dev/sda", size_mib), mode, swap_mib, false).unwrap();

            prop_assert_eq!(plan.partitions[0].start_mib, defaults::ALIGNMENT_MIB);
            prop_assert_eq!(plan.partitions.last().unwrap().end_mib, size_mib);

            for pair in plan.partitions.windows(2) {
                prop_assert_eq!(pair[0].end_mib, pair[1].start_mib);
            }
            for part in &plan.partitions {
                prop_assert!(part.end_mib > part.start_mib);
            }
        }

        /// Partition numbers are consecutive and the root is always present.
        #[test]
        fn prop_plan_shape(
            size_mib in defaults::MIN_DISK_MIB..4 * 1024 * 1024u64,
            swap_mib in 512..16 * 1024u64,
            uefi in any::<bool>(),
        ) {
            let mode = if uefi { BootMode::Uefi } else { BootMode::Bios };
            let plan = plan_partitions(&disk("/dev/sda", size_mib), mode, swap_mib, false).unwrap();

            for (i, part) in plan.partitions.iter().enumerate() {
                prop_assert_eq!(part.number as usize, i + 1);
            }
            prop_assert!(plan.partition(PartitionRole::Root).is_some());
            prop_assert_eq!(
                plan.partition(PartitionRole::Esp).is_some(),
                uefi
            );
        }

        /// Device naming round-trips the nvme infix rule.
        #[test]
        fn prop_partition_naming(number in 1u32..9) {
            prop_assert_eq!(
                partition_device("/dev/nvme0n1", number),
                format!("/dev/nvme0n1p{number}")
            );
            prop_assert_eq!(
                partition_device("/dev/sda", number),
                format!("/dev/sda{number}")
            );
        }
    }
}
