//! Package set resolution
//!
//! Maps the operator's configuration to the exact list of source archives the
//! install needs. Pure and deterministic: the same configuration always
//! resolves to the same list in the same order.

use serde::Serialize;

use crate::config::sources::{
    SourceSpec, BASE_SOURCES, BUSYBOX_SOURCE, COREUTILS_SOURCE, GLIBC_SOURCE, MUSL_SOURCE,
    X11_SOURCES,
};
use crate::core::settings::{InitTools, InstallConfig, Libc};

/// The resolved set of source archives for one install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSet {
    sources: Vec<SourceSpec>,
}

impl PackageSet {
    /// Build a set from explicit sources; the installer itself always goes
    /// through [`resolve_package_set`]
    pub fn from_sources(sources: Vec<SourceSpec>) -> Self {
        Self { sources }
    }

    /// All sources in resolution order
    pub fn sources(&self) -> &[SourceSpec] {
        &self.sources
    }

    /// Number of sources in the set
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the set is empty (never true for a real configuration)
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Look up one source by logical package name
    pub fn get(&self, name: &str) -> Option<&SourceSpec> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Whether the set contains a package
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Logical names, for reports
    pub fn names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name).collect()
    }

    /// Summary rows for `--json` output
    pub fn to_json(&self) -> serde_json::Value {
        #[derive(Serialize)]
        struct Row<'a> {
            name: &'a str,
            version: &'a str,
            url: &'a str,
        }

        serde_json::json!(self
            .sources
            .iter()
            .map(|s| Row {
                name: s.name,
                version: s.version,
                url: s.url,
            })
            .collect::<Vec<_>>())
    }
}

/// Resolve the package set for a configuration
///
/// Base sources first, then the chosen libc, then the chosen userland, then
/// the X11 stack when requested.
pub fn resolve_package_set(config: &InstallConfig) -> PackageSet {
    let mut sources: Vec<SourceSpec> = BASE_SOURCES.to_vec();

    sources.push(match config.libc {
        Libc::Glibc => GLIBC_SOURCE,
        Libc::Musl => MUSL_SOURCE,
    });

    sources.push(match config.init_tools {
        InitTools::Coreutils => COREUTILS_SOURCE,
        InitTools::Busybox => BUSYBOX_SOURCE,
    });

    if config.install_x11 {
        sources.extend_from_slice(X11_SOURCES);
    }

    PackageSet { sources }
}
