//! parity-audit - Replays captured routing events and audits parity between
//! the legacy and rewritten routing paths.
//!
//! This crate provides the audit engine and the CLI built on top of it.

pub mod cli;
pub mod core;
pub mod storage;
