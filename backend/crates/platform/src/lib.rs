//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Key-value namespaces (file-backed and in-memory)
//! - Observer registry with log-and-continue delivery

pub mod kv;
pub mod observer;
