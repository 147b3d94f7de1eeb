//! # Configuration Modules
//!
//! Environment lookups used by every `from_env` constructor in the crate, plus
//! `.env` file loading.

/// Mandatory, optional and typed environment variable lookups.
pub mod env;
