//! Default configuration values

/// Smallest disk the installer will use without an explicit override (MiB)
pub const MIN_DISK_MIB: u64 = 25 * 1024;

/// Default swap partition size (MiB)
pub const DEFAULT_SWAP_MIB: u64 = 4096;

/// First usable offset on the disk (MiB); everything below stays unpartitioned
pub const ALIGNMENT_MIB: u64 = 1;

/// EFI system partition end offset (MiB); the ESP spans 1..513
pub const ESP_END_MIB: u64 = 513;

/// BIOS boot stub end offset (MiB); the stub spans 1..2
pub const BIOS_BOOT_END_MIB: u64 = 2;

/// Default hostname offered by the interview
pub const DEFAULT_HOSTNAME: &str = "lfs";

/// Where the target root filesystem is mounted during the install
pub const INSTALL_ROOT: &str = "/mnt/lfs";

/// Unprivileged account the toolchain and temporary tools build under
pub const BUILD_USER: &str = "lfs";

/// Directory under the install root where source archives are kept
pub const SOURCES_DIR: &str = "sources";

/// Directory under the install root where the cross-toolchain installs
pub const TOOLS_DIR: &str = "tools";

/// Target triple for the cross-toolchain
pub const LFS_TARGET: &str = "x86_64-lfs-linux-gnu";

/// Minimal PATH inherited by build-user steps
pub const BUILD_USER_PATH: &str = "/mnt/lfs/tools/bin:/usr/bin:/bin";

/// Minimal PATH inherited by chroot steps
pub const CHROOT_PATH: &str = "/usr/bin:/usr/sbin";

/// Maximum number of download retry attempts
pub const MAX_DOWNLOAD_RETRIES: u32 = 3;

/// Virtual filesystems bound into the target root before chroot phases
pub const VIRTUAL_FILESYSTEMS: &[&str] = &["dev", "dev/pts", "proc", "sys", "run"];
