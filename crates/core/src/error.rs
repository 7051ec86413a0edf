//! Error type shared by the converters and the pipeline.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Unsupported format: {requested}. Supported formats: {supported}")]
    UnsupportedFormat { requested: String, supported: String },

    #[error("Unsupported gender: {0}. Expected 'male' or 'female'")]
    InvalidGender(String),

    #[error("Invalid JSON on line {line}: {source}")]
    InvalidJson {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Output directory {0:?} is the input directory; outputs would overwrite the transcripts")]
    OutputOverwritesInput(PathBuf),

    #[error("No .jsonl files found under {0:?}")]
    NoInputFiles(PathBuf),
}

impl ConvertError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }
}
