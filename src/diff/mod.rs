//! Diff engine: unified diff parsing, the flattened line index, and
//! position resolution.

pub mod file;
pub mod index;
pub mod parser;
pub mod resolve;

use thiserror::Error;

pub use index::{LineIndex, build_index};
pub use parser::parse_unified_diff;
pub use resolve::{Discard, DiscardCounts, FileResolution, resolve, resolve_file};

/// Errors from the diff engine.
///
/// Parsing itself never fails; only reading the input can.
#[derive(Error, Debug)]
pub enum DiffError {
    #[error("failed to read diff file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("path not found: {0}")]
    PathNotFound(String),
}
