//! Core installer logic
//!
//! Planning, resolution, and pipeline assembly are pure; provisioning and the
//! pipeline runner touch the host only through [`crate::infra`].

pub mod doctor;
pub mod fetch;
pub mod packages;
pub mod pipeline;
pub mod plan;
pub mod probe;
pub mod provision;
pub mod recipes;
pub mod settings;
pub mod sysconfig;
