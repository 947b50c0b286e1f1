//! Shared blob pairing domain primitives.
//!
//! This crate owns notification decoding, object identity parsing and the
//! outcome contracts produced by reconciliation. It intentionally excludes
//! AWS SDK and async runtime concerns; those live in `pairing_worker`.

pub mod contract;
pub mod decode;
pub mod identity;
