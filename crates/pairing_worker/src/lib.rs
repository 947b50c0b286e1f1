//! AWS-oriented adapters and handlers for blob pairing reconciliation.
//!
//! This crate owns runtime integration details (S3 and SQS adapters, the batch
//! drain loop, configuration and binaries) on top of the pure primitives in
//! `pairing_core`.

pub mod adapters;
pub mod config;
pub mod drain;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod runtime;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
