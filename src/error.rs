use std::path::PathBuf;
use thiserror::Error;

use crate::data::Split;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON annotations in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed CSV annotations in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Could not read image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Dataset has no {0} split")]
    UnknownSplit(Split),

    #[error("Index {index} out of range for {split} split with {len} records")]
    IndexOutOfRange { index: usize, split: Split, len: usize },

    #[error("No images to compute statistics over")]
    EmptyImageSet,
}

pub type Result<T> = std::result::Result<T, AuditError>;

impl AuditError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AuditError::Io {
            path: path.into(),
            source,
        }
    }
}
