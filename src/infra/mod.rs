//! Infrastructure layer
//!
//! Process invocation and network access. Business logic lives in
//! [`crate::core`]; these modules only know how to run tools and move bytes.

pub mod download;
pub mod process;
