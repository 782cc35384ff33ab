//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod doctor;
pub mod fetch;
pub mod install;
pub mod plan;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Subcommand, ValueEnum};

use crate::core::settings::{InitTools, Libc};

/// C library choice on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibcArg {
    /// GNU C library
    Glibc,
    /// musl libc
    Musl,
}

impl From<LibcArg> for Libc {
    fn from(arg: LibcArg) -> Self {
        match arg {
            LibcArg::Glibc => Self::Glibc,
            LibcArg::Musl => Self::Musl,
        }
    }
}

/// Userland choice on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitToolsArg {
    /// GNU coreutils
    Coreutils,
    /// BusyBox
    Busybox,
}

impl From<InitToolsArg> for InitTools {
    fn from(arg: InitToolsArg) -> Self {
        match arg {
            InitToolsArg::Coreutils => Self::Coreutils,
            InitToolsArg::Busybox => Self::Busybox,
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full interactive install
    Install {
        /// TOML answer file for an unattended install
        #[arg(long)]
        answers: Option<PathBuf>,

        /// Skip the destructive-overwrite confirmation
        #[arg(short, long)]
        yes: bool,

        /// Swap partition size in MiB
        #[arg(long, value_name = "MIB")]
        swap_size: Option<u64>,
    },

    /// Compute and display the partition plan without touching the disk
    Plan {
        /// Target device path (probed and prompted for when omitted)
        #[arg(short, long)]
        disk: Option<String>,

        /// Swap partition size in MiB
        #[arg(long, value_name = "MIB")]
        swap_size: Option<u64>,

        /// Plan for a disk below the supported minimum
        #[arg(long)]
        force_size: bool,
    },

    /// Resolve the package set and download source archives
    Fetch {
        /// TOML answer file supplying the build selections
        #[arg(long)]
        answers: Option<PathBuf>,

        /// C library to resolve for
        #[arg(long, value_enum, default_value = "glibc")]
        libc: LibcArg,

        /// Userland to resolve for
        #[arg(long, value_enum, default_value = "coreutils")]
        init_tools: InitToolsArg,

        /// Include the X11 stack
        #[arg(long)]
        x11: bool,

        /// Download directory (defaults to the user source cache)
        #[arg(long)]
        dest: Option<PathBuf>,

        /// List the resolved set without downloading
        #[arg(short, long)]
        list: bool,
    },

    /// Check host tools and privileges
    Doctor,
}

impl Commands {
    /// Execute the command
    pub async fn run(self) -> Result<()> {
        match self {
            Self::Install {
                answers,
                yes,
                swap_size,
            } => {
                install::execute(install::InstallOptions {
                    answers,
                    yes,
                    swap_mib: swap_size,
                })
                .await
            }
            Self::Plan {
                disk,
                swap_size,
                force_size,
            } => plan::execute(disk, swap_size, force_size).await,
            Self::Fetch {
                answers,
                libc,
                init_tools,
                x11,
                dest,
                list,
            } => {
                let options = fetch::FetchOptions {
                    answers,
                    libc: libc.into(),
                    init_tools: init_tools.into(),
                    install_x11: x11,
                    dest,
                    list,
                };
                fetch::execute(options).await
            }
            Self::Doctor => doctor::execute().await,
        }
    }
}
