//! Error type for provisioning runs.
//!
//! Each variant maps to one failure category: filesystem, network, HTTP
//! status, or archive content. Callers that only want a message can convert
//! into `anyhow::Error`.

use std::io;
use std::path::PathBuf;

pub type Result<T, E = ProvisionError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// Filesystem failure (create dir, write, delete).
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// Target path exists but is not a directory.
    #[error("target {} exists and is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// URL could not be parsed or uses an unsupported scheme.
    #[error("invalid dataset url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Curl reported a transport error (connect, timeout, TLS, ...).
    #[error("GET request failed: {0}")]
    Network(#[from] curl::Error),

    /// Server answered with a non-2xx status.
    #[error("GET {url} returned HTTP {code}")]
    HttpStatus { url: String, code: u32 },

    /// Stopped through the abort flag (e.g. Ctrl-C in the CLI).
    #[error("provisioning aborted by user")]
    Aborted,

    /// Downloaded bytes are not a readable zip archive.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl ProvisionError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        ProvisionError::Io {
            context: context.into(),
            source,
        }
    }
}

/// Attach a context message to an `io::Result`, producing a `ProvisionError::Io`.
pub(crate) trait IoContext<T> {
    fn io_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn io_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| ProvisionError::io(f(), e))
    }
}
