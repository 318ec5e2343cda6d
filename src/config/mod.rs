//! # Configuration
//!
//! Runtime settings for the provisioner.
//!
//! - `provisioner`: settings loaded from environment variables, overridable by CLI flags

pub mod provisioner;

pub use provisioner::{LogFormat, ProvisionerConfig};
