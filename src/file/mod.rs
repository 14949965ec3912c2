//! File I/O for response bodies.
//!
//! This module loads bodies from disk or stdin (plain or gzipped JSON, YAML
//! and JSON Lines) and renders or saves transformed values with atomic writes.

pub mod loader;
pub mod saver;
