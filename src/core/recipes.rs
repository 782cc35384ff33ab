//! Build phase recipes
//!
//! Assembles the concrete step lists for every build phase from the resolved
//! package set. Each package follows the same shape: extract, configure,
//! build, install, delete the extracted tree. Only the configure arguments
//! and a few special cases (gcc's bundled math libraries, busybox, the
//! kernel) differ per package.

use std::path::Path;

use crate::config::defaults;
use crate::config::sources::SourceSpec;
use crate::core::packages::PackageSet;
use crate::core::pipeline::{BuildPhase, ExecContext, PhasePipeline};
use crate::core::plan::DiskPlan;
use crate::core::probe::BootMode;
use crate::core::settings::{InitTools, InstallConfig, Libc};
use crate::error::PipelineError;
use crate::infra::process::Step;

/// Temporary-tools packages, in build order, excluding the userland choice
const TEMP_TOOLS_ORDER: &[&str] = &["make", "bash", "sed", "grep", "gawk", "tar", "gzip", "xz"];

/// Final-system packages built with the plain autotools recipe, in build order
const FINAL_SYSTEM_ORDER: &[&str] = &[
    "ncurses",
    "bash",
    "make",
    "sed",
    "grep",
    "gawk",
    "diffutils",
    "findutils",
    "file",
    "patch",
    "gzip",
    "tar",
    "xz",
    "grub",
];

/// Directory name an archive extracts to: the archive name minus its suffix
pub fn source_dir_name(archive: &str) -> &str {
    archive
        .strip_suffix(".tar.xz")
        .or_else(|| archive.strip_suffix(".tar.gz"))
        .or_else(|| archive.strip_suffix(".tar.bz2"))
        .unwrap_or(archive)
}

/// Assemble the whole build pipeline for one install run
pub fn build_pipeline(
    config: &InstallConfig,
    set: &PackageSet,
    plan: &DiskPlan,
    install_root: &Path,
    jobs: usize,
) -> Result<PhasePipeline, PipelineError> {
    let mut pipeline = PhasePipeline::new(install_root);

    pipeline.push(prepare_environment(install_root));
    pipeline.push(cross_toolchain(config, set, install_root, jobs)?);
    pipeline.push(mount_virtual_fs(install_root));
    pipeline.push(temp_tools(config, set, install_root, jobs)?);
    pipeline.push(final_system(config, set, jobs)?);
    pipeline.push(system_configuration(config, plan));
    if config.install_x11 {
        pipeline.push(x11_stack(set, jobs)?);
    }

    Ok(pipeline)
}

fn lookup<'a>(
    set: &'a PackageSet,
    phase: &str,
    name: &str,
) -> Result<&'a SourceSpec, PipelineError> {
    set.get(name).ok_or_else(|| PipelineError::MissingArchive {
        phase: phase.to_string(),
        archive: name.to_string(),
    })
}

/// Create the build directories and the unprivileged build account
fn prepare_environment(root: &Path) -> BuildPhase {
    let root = root.display();
    let sources = format!("{root}/{}", defaults::SOURCES_DIR);
    let tools = format!("{root}/{}", defaults::TOOLS_DIR);

    let etc = format!("{root}/etc");
    let boot = format!("{root}/boot");
    let usr = format!("{root}/usr");
    let owner = format!("{}:{}", defaults::BUILD_USER, defaults::BUILD_USER);

    let mut phase = BuildPhase::new("prepare-environment", ExecContext::HostRoot);
    phase.push(Step::new(
        "mkdir",
        &[
            "-p",
            sources.as_str(),
            tools.as_str(),
            etc.as_str(),
            boot.as_str(),
            usr.as_str(),
        ],
    ));
    phase.push(Step::new("groupadd", &["-f", defaults::BUILD_USER]));
    phase.push(Step::new(
        "useradd",
        &[
            "-s",
            "/bin/bash",
            "-g",
            defaults::BUILD_USER,
            "-m",
            "-k",
            "/dev/null",
            defaults::BUILD_USER,
        ],
    ));
    phase.push(Step::new(
        "chown",
        &["-R", owner.as_str(), sources.as_str(), tools.as_str()],
    ));
    phase
}

/// Pass-1 binutils and gcc, kernel headers, and the chosen C library
fn cross_toolchain(
    config: &InstallConfig,
    set: &PackageSet,
    root: &Path,
    jobs: usize,
) -> Result<BuildPhase, PipelineError> {
    let name = "cross-toolchain";
    let root_str = root.display().to_string();
    let sources = format!("{root_str}/{}", defaults::SOURCES_DIR);
    let tools = format!("{root_str}/{}", defaults::TOOLS_DIR);

    let mut phase = BuildPhase::new(name, ExecContext::BuildUser);

    // Binutils pass 1, built out of tree
    let binutils = lookup(set, name, "binutils")?;
    phase.extend(out_of_tree_steps(
        &sources,
        binutils,
        &[
            format!("--prefix={tools}"),
            format!("--with-sysroot={root_str}"),
            format!("--target={}", defaults::LFS_TARGET),
            "--disable-nls".to_string(),
            "--disable-werror".to_string(),
        ],
        jobs,
    ));

    // GCC pass 1 wants gmp, mpfr, and mpc unpacked inside its own tree
    let gcc = lookup(set, name, "gcc")?;
    let gcc_dir = format!("{sources}/{}", source_dir_name(gcc.archive_name()));
    phase.push(extract_step(&sources, gcc));
    for bundled in ["gmp", "mpfr", "mpc"] {
        let spec = lookup(set, name, bundled)?;
        let archive = format!("{sources}/{}", spec.archive_name());
        phase.push(Step::new(
            "tar",
            &["-xf", archive.as_str(), "-C", gcc_dir.as_str()],
        ));
        phase.push(Step::new(
            "mv",
            &[
                format!("{gcc_dir}/{}", source_dir_name(spec.archive_name())),
                format!("{gcc_dir}/{bundled}"),
            ],
        ));
    }
    let gcc_build = format!("{gcc_dir}/build");
    phase.push(Step::new("mkdir", &["-p", gcc_build.as_str()]));
    phase.push(
        Step::new(
            "../configure",
            &[
                format!("--target={}", defaults::LFS_TARGET),
                format!("--prefix={tools}"),
                format!("--with-sysroot={root_str}"),
                "--with-newlib".to_string(),
                "--without-headers".to_string(),
                "--disable-nls".to_string(),
                "--disable-shared".to_string(),
                "--disable-multilib".to_string(),
                "--disable-threads".to_string(),
                "--disable-libatomic".to_string(),
                "--disable-libgomp".to_string(),
                "--disable-libssp".to_string(),
                "--disable-libvtv".to_string(),
                "--disable-libstdcxx".to_string(),
                "--enable-languages=c,c++".to_string(),
            ],
        )
        .in_dir(&gcc_build),
    );
    phase.push(Step::new("make", &[format!("-j{jobs}")]).in_dir(&gcc_build));
    phase.push(Step::new("make", &["install"]).in_dir(&gcc_build));
    phase.push(Step::new("rm", &["-rf", gcc_dir.as_str()]));

    // Kernel headers into the target usr tree
    let linux = lookup(set, name, "linux")?;
    let linux_dir = format!("{sources}/{}", source_dir_name(linux.archive_name()));
    phase.push(extract_step(&sources, linux));
    phase.push(Step::new("make", &["mrproper"]).in_dir(&linux_dir));
    phase.push(
        Step::new(
            "make",
            &[
                "headers_install".to_string(),
                format!("INSTALL_HDR_PATH={root_str}/usr"),
            ],
        )
        .in_dir(&linux_dir),
    );
    phase.push(Step::new("rm", &["-rf", linux_dir.as_str()]));

    // The chosen C library, cross-compiled against the new toolchain
    let libc_name = match config.libc {
        Libc::Glibc => "glibc",
        Libc::Musl => "musl",
    };
    let libc = lookup(set, name, libc_name)?;
    phase.extend(out_of_tree_steps(
        &sources,
        libc,
        &[
            "--prefix=/usr".to_string(),
            format!("--host={}", defaults::LFS_TARGET),
            format!("--with-headers={root_str}/usr/include"),
            "--disable-werror".to_string(),
        ],
        jobs,
    ));

    Ok(phase)
}

/// Bind the host's virtual filesystems into the target root
fn mount_virtual_fs(root: &Path) -> BuildPhase {
    let root = root.display();
    let mut phase = BuildPhase::new("mount-virtual-fs", ExecContext::HostRoot);

    let mount_points: Vec<String> = defaults::VIRTUAL_FILESYSTEMS
        .iter()
        .map(|vfs| format!("{root}/{vfs}"))
        .collect();
    let mut mkdir_args = vec!["-p".to_string()];
    mkdir_args.extend(mount_points);
    phase.push(Step::new("mkdir", &mkdir_args));

    let dev = format!("{root}/dev");
    let dev_pts = format!("{root}/dev/pts");
    let proc = format!("{root}/proc");
    let sys = format!("{root}/sys");
    let run = format!("{root}/run");
    let resolv = format!("{root}/etc/resolv.conf");

    phase.push(Step::new("mount", &["--bind", "/dev", dev.as_str()]));
    phase.push(Step::new("mount", &["--bind", "/dev/pts", dev_pts.as_str()]));
    phase.push(Step::new("mount", &["-t", "proc", "proc", proc.as_str()]));
    phase.push(Step::new("mount", &["-t", "sysfs", "sysfs", sys.as_str()]));
    phase.push(Step::new("mount", &["-t", "tmpfs", "tmpfs", run.as_str()]));
    // Name resolution inside the chroot
    phase.push(Step::new("cp", &["/etc/resolv.conf", resolv.as_str()]));
    phase
}

/// Temporary tools linked against the cross-toolchain
fn temp_tools(
    config: &InstallConfig,
    set: &PackageSet,
    root: &Path,
    jobs: usize,
) -> Result<BuildPhase, PipelineError> {
    let name = "temp-tools";
    let root_str = root.display().to_string();
    let sources = format!("{root_str}/{}", defaults::SOURCES_DIR);
    let tools = format!("{root_str}/{}", defaults::TOOLS_DIR);

    let mut phase = BuildPhase::new(name, ExecContext::BuildUser);

    for pkg in TEMP_TOOLS_ORDER {
        let spec = lookup(set, name, pkg)?;
        phase.extend(autotools_steps(
            &sources,
            spec,
            &[
                format!("--prefix={tools}"),
                format!("--host={}", defaults::LFS_TARGET),
            ],
            jobs,
        ));
    }

    match config.init_tools {
        InitTools::Coreutils => {
            let spec = lookup(set, name, "coreutils")?;
            phase.extend(autotools_steps(
                &sources,
                spec,
                &[
                    format!("--prefix={tools}"),
                    format!("--host={}", defaults::LFS_TARGET),
                    "--enable-install-program=hostname".to_string(),
                ],
                jobs,
            ));
        }
        InitTools::Busybox => {
            let spec = lookup(set, name, "busybox")?;
            phase.extend(busybox_steps(&sources, spec, &tools, jobs));
        }
    }

    Ok(phase)
}

/// The final system, built inside the chroot
fn final_system(
    config: &InstallConfig,
    set: &PackageSet,
    jobs: usize,
) -> Result<BuildPhase, PipelineError> {
    let name = "final-system";
    let sources = format!("/{}", defaults::SOURCES_DIR);

    let mut phase = BuildPhase::new(name, ExecContext::Chroot);

    // The C library is rebuilt natively first; everything links against it
    let libc_name = match config.libc {
        Libc::Glibc => "glibc",
        Libc::Musl => "musl",
    };
    let libc = lookup(set, name, libc_name)?;
    phase.extend(out_of_tree_steps(
        &sources,
        libc,
        &["--prefix=/usr".to_string(), "--disable-werror".to_string()],
        jobs,
    ));

    for pkg in FINAL_SYSTEM_ORDER {
        let spec = lookup(set, name, pkg)?;
        phase.extend(autotools_steps(
            &sources,
            spec,
            &["--prefix=/usr".to_string()],
            jobs,
        ));
    }

    match config.init_tools {
        InitTools::Coreutils => {
            let spec = lookup(set, name, "coreutils")?;
            phase.extend(autotools_steps(
                &sources,
                spec,
                &["--prefix=/usr".to_string()],
                jobs,
            ));
        }
        InitTools::Busybox => {
            let spec = lookup(set, name, "busybox")?;
            phase.extend(busybox_steps(&sources, spec, "/", jobs));
        }
    }

    // Kernel: image and map installed under /boot
    let linux = lookup(set, name, "linux")?;
    let linux_dir = format!("{sources}/{}", source_dir_name(linux.archive_name()));
    phase.push(extract_step(&sources, linux));
    phase.push(Step::new("make", &["defconfig"]).in_dir(&linux_dir));
    phase.push(Step::new("make", &[format!("-j{jobs}")]).in_dir(&linux_dir));
    phase.push(Step::new("make", &["modules_install"]).in_dir(&linux_dir));
    phase.push(Step::new(
        "cp",
        &[
            format!("{linux_dir}/arch/x86/boot/bzImage"),
            format!("/boot/vmlinuz-{}-lfs", linux.version),
        ],
    ));
    phase.push(Step::new(
        "cp",
        &[
            format!("{linux_dir}/System.map"),
            format!("/boot/System.map-{}", linux.version),
        ],
    ));
    phase.push(Step::new("rm", &["-rf", linux_dir.as_str()]));

    Ok(phase)
}

/// Accounts, passwords, and the boot loader
fn system_configuration(config: &InstallConfig, plan: &DiskPlan) -> BuildPhase {
    let mut phase = BuildPhase::new("system-configuration", ExecContext::Chroot);

    phase.push(
        Step::new("chpasswd", &[] as &[&str])
            .with_stdin(format!("root:{}\n", config.root_password)),
    );
    phase.push(Step::new(
        "useradd",
        &["-m", "-s", "/bin/bash", config.username.as_str()],
    ));
    phase.push(
        Step::new("chpasswd", &[] as &[&str])
            .with_stdin(format!("{}:{}\n", config.username, config.user_password)),
    );

    match plan.boot_mode {
        BootMode::Bios => {
            phase.push(Step::new(
                "grub-install",
                &[
                    "--target=i386-pc",
                    "--boot-directory=/boot",
                    plan.device.as_str(),
                ],
            ));
        }
        BootMode::Uefi => {
            phase.push(Step::new(
                "grub-install",
                &[
                    "--target=x86_64-efi",
                    "--efi-directory=/boot/efi",
                    "--bootloader-id=LFS",
                ],
            ));
        }
    }

    phase
}

/// The optional X11 stack, built inside the chroot after the base system
fn x11_stack(set: &PackageSet, jobs: usize) -> Result<BuildPhase, PipelineError> {
    let name = "x11-stack";
    let sources = format!("/{}", defaults::SOURCES_DIR);

    let mut phase = BuildPhase::new(name, ExecContext::Chroot);
    for spec in crate::config::sources::X11_SOURCES {
        // Resolve through the set so a mis-assembled set is caught here
        let spec = lookup(set, name, spec.name)?;
        phase.extend(autotools_steps(
            &sources,
            spec,
            &["--prefix=/usr".to_string(), "--sysconfdir=/etc".to_string()],
            jobs,
        ));
    }
    Ok(phase)
}

/// extract → configure → make → make install → delete, configuring in-tree
fn autotools_steps(
    sources: &str,
    spec: &SourceSpec,
    configure_args: &[String],
    jobs: usize,
) -> Vec<Step> {
    let src_dir = format!("{sources}/{}", source_dir_name(spec.archive_name()));

    vec![
        extract_step(sources, spec),
        Step::new("./configure", configure_args).in_dir(&src_dir),
        Step::new("make", &[format!("-j{jobs}")]).in_dir(&src_dir),
        Step::new("make", &["install"]).in_dir(&src_dir),
        Step::new("rm", &["-rf", src_dir.as_str()]),
    ]
}

/// Same shape as [`autotools_steps`], configuring from a `build/` subdirectory
fn out_of_tree_steps(
    sources: &str,
    spec: &SourceSpec,
    configure_args: &[String],
    jobs: usize,
) -> Vec<Step> {
    let src_dir = format!("{sources}/{}", source_dir_name(spec.archive_name()));
    let build_dir = format!("{src_dir}/build");

    vec![
        extract_step(sources, spec),
        Step::new("mkdir", &["-p", build_dir.as_str()]),
        Step::new("../configure", configure_args).in_dir(&build_dir),
        Step::new("make", &[format!("-j{jobs}")]).in_dir(&build_dir),
        Step::new("make", &["install"]).in_dir(&build_dir),
        Step::new("rm", &["-rf", src_dir.as_str()]),
    ]
}

/// Busybox has no configure script; it builds from its own defconfig
fn busybox_steps(sources: &str, spec: &SourceSpec, prefix: &str, jobs: usize) -> Vec<Step> {
    let src_dir = format!("{sources}/{}", source_dir_name(spec.archive_name()));

    vec![
        extract_step(sources, spec),
        Step::new("make", &["defconfig"]).in_dir(&src_dir),
        Step::new("make", &[format!("-j{jobs}")]).in_dir(&src_dir),
        Step::new(
            "make",
            &[format!("CONFIG_PREFIX={prefix}"), "install".to_string()],
        )
        .in_dir(&src_dir),
        Step::new("rm", &["-rf", src_dir.as_str()]),
    ]
}

fn extract_step(sources: &str, spec: &SourceSpec) -> Step {
    let archive = format!("{sources}/{}", spec.archive_name());
    Step::new("tar", &["-xf", archive.as_str(), "-C", sources])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::packages::resolve_package_set;
    use crate::core::plan::plan_partitions;
    use crate::core::probe::DeviceInfo;
    use crate::core::settings::InstallConfig;

    fn sample_config(install_x11: bool) -> InstallConfig {
        InstallConfig {
            username: "alex".to_string(),
            root_password: "rootpw".to_string(),
            user_password: "userpw".to_string(),
            install_x11,
            ..InstallConfig::default()
        }
    }

    fn sample_plan(boot_mode: BootMode) -> DiskPlan {
        let disk = DeviceInfo {
            path: "/dev/sda".to_string(),
            size_mib: 100 * 1024,
            model: None,
        };
        plan_partitions(&disk, boot_mode, 4096, false).unwrap()
    }

    #[test]
    fn test_source_dir_name_strips_suffixes() {
        assert_eq!(source_dir_name("gcc-13.2.0.tar.xz"), "gcc-13.2.0");
        assert_eq!(source_dir_name("bash-5.2.21.tar.gz"), "bash-5.2.21");
        assert_eq!(source_dir_name("busybox-1.36.1.tar.bz2"), "busybox-1.36.1");
    }

    #[test]
    fn test_pipeline_has_all_phases_without_x11() {
        let config = sample_config(false);
        let set = resolve_package_set(&config);
        let plan = sample_plan(BootMode::Uefi);

        let pipeline =
            build_pipeline(&config, &set, &plan, Path::new("/mnt/lfs"), 4).unwrap();

        let names: Vec<&str> = pipeline.phases().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "prepare-environment",
                "cross-toolchain",
                "mount-virtual-fs",
                "temp-tools",
                "final-system",
                "system-configuration",
            ]
        );
    }

    #[test]
    fn test_pipeline_appends_x11_phase_when_requested() {
        let config = sample_config(true);
        let set = resolve_package_set(&config);
        let plan = sample_plan(BootMode::Uefi);

        let pipeline =
            build_pipeline(&config, &set, &plan, Path::new("/mnt/lfs"), 4).unwrap();

        assert_eq!(pipeline.phases().last().unwrap().name, "x11-stack");
    }

    #[test]
    fn test_package_recipe_shape() {
        let spec = SourceSpec {
            name: "sed",
            version: "4.9",
            url: "https://ftp.gnu.org/gnu/sed/sed-4.9.tar.xz",
            sha256: None,
        };
        let steps = autotools_steps("/sources", &spec, &["--prefix=/usr".to_string()], 4);

        assert_eq!(steps.len(), 5);
        assert_eq!(steps[0].program, "tar");
        assert_eq!(steps[1].program, "./configure");
        assert_eq!(steps[1].cwd.as_deref(), Some(Path::new("/sources/sed-4.9")));
        assert_eq!(steps[2].render(), "make -j4");
        assert_eq!(steps[3].render(), "make install");
        assert_eq!(steps[4].render(), "rm -rf /sources/sed-4.9");
    }

    #[test]
    fn test_bios_plan_installs_grub_to_device() {
        let config = sample_config(false);
        let plan = sample_plan(BootMode::Bios);
        let phase = system_configuration(&config, &plan);

        let grub = phase
            .steps
            .iter()
            .find(|s| s.program == "grub-install")
            .unwrap();
        assert!(grub.args.contains(&"--target=i386-pc".to_string()));
        assert!(grub.args.contains(&"/dev/sda".to_string()));
    }

    #[test]
    fn test_uefi_plan_installs_grub_to_esp() {
        let config = sample_config(false);
        let plan = sample_plan(BootMode::Uefi);
        let phase = system_configuration(&config, &plan);

        let grub = phase
            .steps
            .iter()
            .find(|s| s.program == "grub-install")
            .unwrap();
        assert!(grub.args.contains(&"--target=x86_64-efi".to_string()));
    }

    #[test]
    fn test_passwords_flow_through_stdin_not_argv() {
        let config = sample_config(false);
        let plan = sample_plan(BootMode::Uefi);
        let phase = system_configuration(&config, &plan);

        for step in &phase.steps {
            assert!(
                !step.args.iter().any(|a| a.contains("rootpw")),
                "password leaked into argv: {}",
                step.render()
            );
        }
        let chpasswd = phase.steps.iter().find(|s| s.program == "chpasswd").unwrap();
        assert_eq!(chpasswd.stdin.as_deref(), Some("root:rootpw\n"));
    }

    #[test]
    fn test_busybox_build_has_no_configure() {
        let spec = crate::config::sources::BUSYBOX_SOURCE;
        let steps = busybox_steps("/sources", &spec, "/", 4);

        assert!(steps.iter().all(|s| s.program != "./configure"));
        assert!(steps
            .iter()
            .any(|s| s.args.contains(&"defconfig".to_string())));
    }

    #[test]
    fn test_missing_package_is_reported_with_phase() {
        // A set resolved for musl cannot serve a glibc build
        let glibc_config = sample_config(false);
        let musl_config = InstallConfig {
            libc: Libc::Musl,
            ..sample_config(false)
        };
        let set = resolve_package_set(&musl_config);

        let err = cross_toolchain(&glibc_config, &set, Path::new("/mnt/lfs"), 4).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingArchive { archive, .. } if archive == "glibc"
        ));
    }
}
