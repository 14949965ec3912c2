//! Nested data model shared by the loader, the path engine and the renderer.

pub mod node;
pub mod parser;
pub mod tree;

pub use node::{DataValue, PathKey, Scalar};
pub use tree::Tree;
