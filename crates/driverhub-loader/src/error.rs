use std::path::PathBuf;

use thiserror::Error;

pub use driverhub_sdk::ConfigError;

/// Errors raised while reading a driver manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest not found at {0}")]
    Missing(PathBuf),
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while resolving a driver's implementation.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no implementation registered for driver {0}")]
    Unregistered(String),
    #[error("driver entry point not found under {0}")]
    MissingEntry(PathBuf),
    #[error("failed to load driver library: {0}")]
    LibraryLoad(#[from] libloading::Error),
    #[error("driver library {path} does not export {symbol}")]
    MissingSymbol { path: PathBuf, symbol: &'static str },
    #[error("driver library {path} exports no factory named {name}")]
    UnknownFactory { path: PathBuf, name: String },
    #[error("no resolver could load driver {0}")]
    Exhausted(String),
}

impl ResolveError {
    pub(crate) fn missing_symbol(path: PathBuf, symbol: &'static str) -> Self {
        ResolveError::MissingSymbol { path, symbol }
    }
}
