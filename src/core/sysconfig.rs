//! Target system configuration files
//!
//! Fixed templates, filled in from the collected configuration and the disk
//! plan, written straight into the mounted target root. Accounts and the boot
//! loader binary itself are handled by chroot steps; this module only writes
//! files.

use std::io;
use std::path::Path;

use crate::core::plan::DiskPlan;
use crate::core::probe::BootMode;
use crate::core::settings::InstallConfig;

/// Render `/etc/fstab` from the plan
pub fn render_fstab(plan: &DiskPlan) -> String {
    let mut fstab = String::from(
        "# Begin /etc/fstab\n\
         #\n\
         # file system  mount-point    type     options             dump  fsck\n",
    );

    fstab.push_str(&format!(
        "{:<15}/              ext4     defaults            1     1\n",
        plan.root_device()
    ));

    if let Some(esp) = plan.esp_device() {
        fstab.push_str(&format!(
            "{esp:<15}/boot/efi      vfat     umask=0077          0     1\n"
        ));
    }

    fstab.push_str(&format!(
        "{:<15}swap           swap     pri=1               0     0\n",
        plan.swap_device()
    ));

    fstab.push_str(
        "proc           /proc          proc     nosuid,noexec,nodev 0     0\n\
         sysfs          /sys           sysfs    nosuid,noexec,nodev 0     0\n\
         devpts         /dev/pts       devpts   gid=5,mode=620      0     0\n\
         tmpfs          /run           tmpfs    defaults            0     0\n\
         \n# End /etc/fstab\n",
    );

    fstab
}

/// Render `/etc/hosts`
pub fn render_hosts(hostname: &str) -> String {
    format!(
        "127.0.0.1  localhost\n\
         127.0.1.1  {hostname}\n\
         ::1        localhost ip6-localhost ip6-loopback\n"
    )
}

/// Render the `/etc/passwd` seed; real accounts are added by chroot steps
pub fn render_passwd() -> String {
    "root:x:0:0:root:/root:/bin/bash\n\
     bin:x:1:1:bin:/dev/null:/usr/bin/false\n\
     daemon:x:6:6:Daemon User:/dev/null:/usr/bin/false\n\
     nobody:x:65534:65534:Unprivileged User:/dev/null:/usr/bin/false\n"
        .to_string()
}

/// Render the `/etc/group` seed
pub fn render_group() -> String {
    "root:x:0:\n\
     bin:x:1:daemon\n\
     sys:x:2:\n\
     kmem:x:3:\n\
     tape:x:4:\n\
     tty:x:5:\n\
     daemon:x:6:\n\
     disk:x:8:\n\
     wheel:x:97:\n\
     users:x:999:\n\
     nogroup:x:65534:\n"
        .to_string()
}

/// Render `/boot/grub/grub.cfg`
pub fn render_grub_cfg(plan: &DiskPlan, kernel_version: &str) -> String {
    let module = match plan.boot_mode {
        BootMode::Bios => "part_gpt",
        BootMode::Uefi => "part_gpt\ninsmod fat",
    };

    format!(
        "# Begin /boot/grub/grub.cfg\n\
         set default=0\n\
         set timeout=5\n\
         \n\
         insmod ext2\n\
         insmod {module}\n\
         \n\
         menuentry \"Linux From Scratch\" {{\n\
         \tlinux /boot/vmlinuz-{kernel_version}-lfs root={root} ro\n\
         }}\n",
        root = plan.root_device(),
    )
}

/// Write every configuration file into the mounted target root
pub fn write_system_files(
    root: &Path,
    config: &InstallConfig,
    plan: &DiskPlan,
    kernel_version: &str,
) -> io::Result<()> {
    let etc = root.join("etc");
    let grub_dir = root.join("boot").join("grub");
    std::fs::create_dir_all(&etc)?;
    std::fs::create_dir_all(&grub_dir)?;

    std::fs::write(etc.join("fstab"), render_fstab(plan))?;
    std::fs::write(etc.join("hostname"), format!("{}\n", config.hostname))?;
    std::fs::write(etc.join("hosts"), render_hosts(&config.hostname))?;
    std::fs::write(etc.join("passwd"), render_passwd())?;
    std::fs::write(etc.join("group"), render_group())?;
    std::fs::write(
        grub_dir.join("grub.cfg"),
        render_grub_cfg(plan, kernel_version),
    )?;

    tracing::info!(root = %root.display(), "system configuration files written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::plan::plan_partitions;
    use crate::core::probe::DeviceInfo;

    fn plan(boot_mode: BootMode) -> DiskPlan {
        let disk = DeviceInfo {
            path: "/dev/nvme0n1".to_string(),
            size_mib: 100 * 1024,
            model: None,
        };
        plan_partitions(&disk, boot_mode, 4096, false).unwrap()
    }

    fn config() -> InstallConfig {
        InstallConfig {
            hostname: "scratch".to_string(),
            username: "alex".to_string(),
            root_password: "r".to_string(),
            user_password: "u".to_string(),
            ..InstallConfig::default()
        }
    }

    #[test]
    fn test_fstab_references_planned_devices() {
        let fstab = render_fstab(&plan(BootMode::Uefi));

        assert!(fstab.contains("/dev/nvme0n1p2"));
        assert!(fstab.contains("/dev/nvme0n1p1"));
        assert!(fstab.contains("/dev/nvme0n1p3"));
        assert!(fstab.contains("swap"));
    }

    #[test]
    fn test_bios_fstab_has_no_esp_line() {
        let disk = DeviceInfo {
            path: "/dev/sda".to_string(),
            size_mib: 100 * 1024,
            model: None,
        };
        let plan = plan_partitions(&disk, BootMode::Bios, 4096, false).unwrap();
        let fstab = render_fstab(&plan);

        assert!(!fstab.contains("/boot/efi"));
        assert!(fstab.contains("/dev/sda2"));
    }

    #[test]
    fn test_hosts_carries_hostname() {
        let hosts = render_hosts("scratch");
        assert!(hosts.contains("127.0.1.1  scratch"));
        assert!(hosts.contains("localhost"));
    }

    #[test]
    fn test_grub_cfg_points_at_kernel_and_root() {
        let cfg = render_grub_cfg(&plan(BootMode::Uefi), "6.7.4");
        assert!(cfg.contains("vmlinuz-6.7.4-lfs"));
        assert!(cfg.contains("root=/dev/nvme0n1p2"));
    }

    #[test]
    fn test_write_system_files_creates_the_tree() {
        let dir = tempfile::tempdir().unwrap();
        write_system_files(dir.path(), &config(), &plan(BootMode::Uefi), "6.7.4").unwrap();

        assert!(dir.path().join("etc/fstab").exists());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("etc/hostname")).unwrap(),
            "scratch\n"
        );
        assert!(dir.path().join("etc/hosts").exists());
        assert!(dir.path().join("etc/passwd").exists());
        assert!(dir.path().join("etc/group").exists());
        assert!(dir.path().join("boot/grub/grub.cfg").exists());
    }
}
