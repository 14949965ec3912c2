//! respdiff - path queries and transactions over parsed response bodies.
//!
//! - [`document`] holds the data model a decoded body is parsed into
//! - [`datapath`] compiles paths, finds matches and runs select/delete/move/map
//! - [`filter`] turns command-line rules into a transaction
//! - [`file`] and [`config`] cover loading, rendering and settings

pub mod config;
pub mod datapath;
pub mod document;
pub mod file;
pub mod filter;
