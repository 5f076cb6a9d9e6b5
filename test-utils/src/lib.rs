//! Shared test utilities for vault-core.
//!
//! This crate provides:
//! - Proptest generators for paths, names and tokens
//! - JSON fixtures shaped like real Vault responses
//! - A wiremock-backed mock Vault server

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod mocks;

pub use generators::*;
pub use mocks::MockVault;
