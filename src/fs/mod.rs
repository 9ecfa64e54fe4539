//! Filesystem utilities for joblock.
//!
//! The file-backed lock store relies on [`publish_exclusive`] for its set-if-absent
//! primitive.

pub mod atomic;

pub use atomic::publish_exclusive;
