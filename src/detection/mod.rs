//! Detection building blocks.
//!
//! - `parser`: version extraction from tool output
//! - `path_finder`: search-path augmentation for children
//! - `runner`: subprocess execution with timeout and concurrent capture

mod parser;
mod path_finder;
mod runner;

pub use parser::{extract_version, major_of, VersionInfo};
pub use path_finder::{augmented_search_path, PathResolver, PATH_SEPARATOR};
pub use runner::{CommandRunner, ProcessRunner, DEFAULT_GRACE_PERIOD};
