//! Error types for site generation.

use std::path::PathBuf;

/// Error from the site generation pipeline.
///
/// File-level failures are fatal and abort the run; embed resolution
/// failures are page-local and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// I/O failure on a specific file or directory.
    #[error("I/O error at {}", path.display())]
    Io {
        /// Path of the offending file or directory.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error.
    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    /// No root document found in the input directory.
    #[error("no root document found in {}", .0.display())]
    MissingRoot(PathBuf),

    /// Configuration error.
    #[error("config error")]
    Config(#[from] ConfigError),
}

impl GenerateError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Error loading a `pagelift.toml` configuration file.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// Explicitly named config file does not exist.
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Config file could not be read.
    #[error("cannot read config at {}", path.display())]
    Read {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML.
    #[error("invalid config")]
    Parse(#[from] toml::de::Error),
}
