//! Source package tables
//!
//! Fixed upstream URLs for everything the installer can build. The resolver in
//! [`crate::core::packages`] picks from these tables based on the operator's
//! libc, init-tools, and X11 choices.

/// One upstream source archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpec {
    /// Logical package name
    pub name: &'static str,
    /// Upstream version
    pub version: &'static str,
    /// Download URL
    pub url: &'static str,
    /// SHA-256 of the archive, where upstream publishes one
    pub sha256: Option<&'static str>,
}

impl SourceSpec {
    /// File name the archive is stored under, taken from the URL
    pub fn archive_name(&self) -> &'static str {
        self.url.rsplit('/').next().unwrap_or(self.name)
    }
}

/// Packages every installation builds, in build order
pub const BASE_SOURCES: &[SourceSpec] = &[
    SourceSpec {
        name: "binutils",
        version: "2.42",
        url: "https://ftp.gnu.org/gnu/binutils/binutils-2.42.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "gcc",
        version: "13.2.0",
        url: "https://ftp.gnu.org/gnu/gcc/gcc-13.2.0/gcc-13.2.0.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "gmp",
        version: "6.3.0",
        url: "https://ftp.gnu.org/gnu/gmp/gmp-6.3.0.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "mpfr",
        version: "4.2.1",
        url: "https://ftp.gnu.org/gnu/mpfr/mpfr-4.2.1.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "mpc",
        version: "1.3.1",
        url: "https://ftp.gnu.org/gnu/mpc/mpc-1.3.1.tar.gz",
        sha256: None,
    },
    SourceSpec {
        name: "linux",
        version: "6.7.4",
        url: "https://cdn.kernel.org/pub/linux/kernel/v6.x/linux-6.7.4.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "bash",
        version: "5.2.21",
        url: "https://ftp.gnu.org/gnu/bash/bash-5.2.21.tar.gz",
        sha256: None,
    },
    SourceSpec {
        name: "make",
        version: "4.4.1",
        url: "https://ftp.gnu.org/gnu/make/make-4.4.1.tar.gz",
        sha256: None,
    },
    SourceSpec {
        name: "ncurses",
        version: "6.4",
        url: "https://invisible-mirror.net/archives/ncurses/ncurses-6.4.tar.gz",
        sha256: None,
    },
    SourceSpec {
        name: "sed",
        version: "4.9",
        url: "https://ftp.gnu.org/gnu/sed/sed-4.9.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "grep",
        version: "3.11",
        url: "https://ftp.gnu.org/gnu/grep/grep-3.11.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "gawk",
        version: "5.3.0",
        url: "https://ftp.gnu.org/gnu/gawk/gawk-5.3.0.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "tar",
        version: "1.35",
        url: "https://ftp.gnu.org/gnu/tar/tar-1.35.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "xz",
        version: "5.4.6",
        url: "https://github.com/tukaani-project/xz/releases/download/v5.4.6/xz-5.4.6.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "gzip",
        version: "1.13",
        url: "https://ftp.gnu.org/gnu/gzip/gzip-1.13.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "diffutils",
        version: "3.10",
        url: "https://ftp.gnu.org/gnu/diffutils/diffutils-3.10.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "findutils",
        version: "4.9.0",
        url: "https://ftp.gnu.org/gnu/findutils/findutils-4.9.0.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "file",
        version: "5.45",
        url: "https://astron.com/pub/file/file-5.45.tar.gz",
        sha256: None,
    },
    SourceSpec {
        name: "patch",
        version: "2.7.6",
        url: "https://ftp.gnu.org/gnu/patch/patch-2.7.6.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "grub",
        version: "2.12",
        url: "https://ftp.gnu.org/gnu/grub/grub-2.12.tar.xz",
        sha256: None,
    },
];

/// C library when the operator picks glibc
pub const GLIBC_SOURCE: SourceSpec = SourceSpec {
    name: "glibc",
    version: "2.39",
    url: "https://ftp.gnu.org/gnu/glibc/glibc-2.39.tar.xz",
    sha256: None,
};

/// C library when the operator picks musl
pub const MUSL_SOURCE: SourceSpec = SourceSpec {
    name: "musl",
    version: "1.2.5",
    url: "https://musl.libc.org/releases/musl-1.2.5.tar.gz",
    sha256: None,
};

/// Core userland when the operator picks coreutils
pub const COREUTILS_SOURCE: SourceSpec = SourceSpec {
    name: "coreutils",
    version: "9.4",
    url: "https://ftp.gnu.org/gnu/coreutils/coreutils-9.4.tar.xz",
    sha256: None,
};

/// Core userland when the operator picks busybox
pub const BUSYBOX_SOURCE: SourceSpec = SourceSpec {
    name: "busybox",
    version: "1.36.1",
    url: "https://busybox.net/downloads/busybox-1.36.1.tar.bz2",
    sha256: None,
};

/// The optional X11 stack, in build order
pub const X11_SOURCES: &[SourceSpec] = &[
    SourceSpec {
        name: "util-macros",
        version: "1.20.0",
        url: "https://www.x.org/pub/individual/util/util-macros-1.20.0.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "xorgproto",
        version: "2023.2",
        url: "https://www.x.org/pub/individual/proto/xorgproto-2023.2.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "libXau",
        version: "1.0.11",
        url: "https://www.x.org/pub/individual/lib/libXau-1.0.11.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "libXdmcp",
        version: "1.1.4",
        url: "https://www.x.org/pub/individual/lib/libXdmcp-1.1.4.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "xcb-proto",
        version: "1.16.0",
        url: "https://xorg.freedesktop.org/archive/individual/proto/xcb-proto-1.16.0.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "libxcb",
        version: "1.16",
        url: "https://xorg.freedesktop.org/archive/individual/lib/libxcb-1.16.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "xtrans",
        version: "1.5.0",
        url: "https://www.x.org/pub/individual/lib/xtrans-1.5.0.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "libX11",
        version: "1.8.7",
        url: "https://www.x.org/pub/individual/lib/libX11-1.8.7.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "libXext",
        version: "1.3.5",
        url: "https://www.x.org/pub/individual/lib/libXext-1.3.5.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "libICE",
        version: "1.1.1",
        url: "https://www.x.org/pub/individual/lib/libICE-1.1.1.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "libSM",
        version: "1.2.4",
        url: "https://www.x.org/pub/individual/lib/libSM-1.2.4.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "libXt",
        version: "1.3.0",
        url: "https://www.x.org/pub/individual/lib/libXt-1.3.0.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "libXmu",
        version: "1.1.4",
        url: "https://www.x.org/pub/individual/lib/libXmu-1.1.4.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "pixman",
        version: "0.43.2",
        url: "https://www.cairographics.org/releases/pixman-0.43.2.tar.gz",
        sha256: None,
    },
    SourceSpec {
        name: "xorg-server",
        version: "21.1.11",
        url: "https://www.x.org/pub/individual/xserver/xorg-server-21.1.11.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "xinit",
        version: "1.4.2",
        url: "https://www.x.org/pub/individual/app/xinit-1.4.2.tar.xz",
        sha256: None,
    },
    SourceSpec {
        name: "twm",
        version: "1.0.12",
        url: "https://www.x.org/pub/individual/app/twm-1.0.12.tar.xz",
        sha256: None,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_name_from_url() {
        assert_eq!(GLIBC_SOURCE.archive_name(), "glibc-2.39.tar.xz");
        assert_eq!(BUSYBOX_SOURCE.archive_name(), "busybox-1.36.1.tar.bz2");
    }

    #[test]
    fn test_x11_stack_size() {
        assert_eq!(X11_SOURCES.len(), 17);
    }

    #[test]
    fn test_base_sources_have_unique_names() {
        let mut names: Vec<&str> = BASE_SOURCES.iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), BASE_SOURCES.len());
    }
}
