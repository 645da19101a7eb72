use std::path::PathBuf;

use thiserror::Error;

use crate::header::NES_HEADER_LEN;

#[derive(Error, Debug)]
pub enum Error {
    /// The metadata document could not be read or parsed. Aborts the run.
    #[error("failed to load metadata database {path}: {reason}")]
    MetadataLoad { path: PathBuf, reason: String },

    /// A single `<game>` record was unusable; the loader skips it.
    #[error("skipping database record #{index}: {reason}")]
    MetadataRecord { index: usize, reason: String },

    /// Reading an input file failed; that file is abandoned.
    #[error("failed to read {path}: {source}")]
    ContainerRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing, renaming or creating a directory failed; the file keeps its prior state.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Provided buffer is shorter than the 16-byte header.
    #[error("header expected {NES_HEADER_LEN} bytes, got {actual}")]
    HeaderTooShort { actual: usize },

    /// Magic number ("NES<EOF>") is missing.
    #[error("missing NES magic bytes")]
    InvalidMagic,
}

impl Error {
    /// Whether the whole run has to stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MetadataLoad { .. })
    }
}
