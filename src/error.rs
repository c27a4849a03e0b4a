use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the dependency engine.
///
/// None of these abort a scan: the pipeline logs them and degrades to an
/// empty node, a skipped subtree, or default configuration.
#[derive(Error, Debug)]
pub enum FileDepError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} is {size} bytes, above the {limit} byte ceiling")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to start watcher on {path}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("no workspace roots given")]
    NoRoots,
}

pub type Result<T> = std::result::Result<T, FileDepError>;
