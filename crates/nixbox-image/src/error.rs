//! Error types for the nix image service.

use thiserror::Error;
use tonic::Status;

/// Result type alias for image service operations.
pub type Result<T> = std::result::Result<T, ImageError>;

/// Errors that can occur while serving image calls.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The backend CRI connection has not been established yet.
    ///
    /// Returned for every call kind until the binder publishes a client;
    /// callers are expected to retry.
    #[error("nix image service not yet initialized")]
    NotInitialized,

    /// The host platform has no Nix system double.
    #[error("cannot derive Nix system from host platform {os}/{arch}")]
    UnsupportedPlatform {
        /// Host operating system.
        os: &'static str,
        /// Host CPU architecture.
        arch: &'static str,
    },

    /// The builder failed to materialize a store path.
    #[error("nix build failed: {0}")]
    Builder(String),

    /// The loader failed to ingest an archive into the content store.
    #[error("image load failed: {0}")]
    Loader(String),

    /// Invalid OCI descriptor metadata.
    #[error("invalid image descriptor: {0}")]
    Descriptor(#[from] oci_spec::OciSpecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport error while connecting to the backend.
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

impl From<ImageError> for Status {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::NotInitialized => Status::unavailable(err.to_string()),
            _ => Status::internal(err.to_string()),
        }
    }
}
