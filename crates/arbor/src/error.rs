//! Error types for Arbor.
//!
//! The layout cache itself never fails: unresolvable paths and unmeasurable
//! nodes are reported through `Option` results. These errors cover the
//! fallible edges around it, loading configuration and editing a
//! [`TreeStore`](crate::model::TreeStore).

use std::path::PathBuf;

use crate::model::NodeId;

/// Result type alias for Arbor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur outside the layout cache's infallible core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configuration value is out of range.
    #[error("Invalid layout configuration: {message}")]
    Config { message: String },

    /// A configuration document could not be parsed.
    #[error("Failed to parse layout configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A configuration could not be serialized.
    #[error("Failed to serialize layout configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// File I/O error.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The referenced tree node does not exist.
    #[error("No tree node with id {0:?}")]
    NoSuchNode(NodeId),

    /// A child position is past the end of the child list.
    #[error("Child index {index} out of range for {len} children")]
    IndexOutOfRange { index: usize, len: usize },
}

impl Error {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
