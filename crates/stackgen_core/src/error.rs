//! Error types for the build.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for build operations.
pub type BuildResult<T> = Result<T, BuildError>;

/// Errors that abort a build.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Template error: {0}")]
    Template(#[from] stackgen_templates::TemplateError),

    #[error("Cannot delete file {path:?}: {extension} extension config is missing")]
    MissingExtensionConfig { extension: String, path: PathBuf },

    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid layout file {path:?}: {message}")]
    InvalidLayout { path: PathBuf, message: String },
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
