use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures while loading the primary schema document.
#[derive(Debug, Error)]
pub enum SchemaLoadError {
    #[error("failed to read schema file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse schema file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },
    #[error("document root is <{found}>, expected an XSD <schema>")]
    NotASchema { found: String },
}

/// Non-fatal conditions noticed while assembling a schema model.
///
/// Warnings accumulate on the model; the loader keeps going with whatever
/// resolved. A missing import merely leaves the type cache incomplete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadWarning {
    ImportNotFound { location: String },
    ImportUnreadable { path: PathBuf, message: String },
    ImportUnparseable { path: PathBuf, message: String },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImportNotFound { location } => {
                write!(f, "imported schema {location:?} was not found")
            }
            Self::ImportUnreadable { path, message } => {
                write!(f, "imported schema {} could not be read: {message}", path.display())
            }
            Self::ImportUnparseable { path, message } => {
                write!(f, "imported schema {} could not be parsed: {message}", path.display())
            }
        }
    }
}
