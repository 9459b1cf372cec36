//! Nix build collaborator.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{ImageError, Result};

/// Materializes a store path on local disk.
///
/// The service serializes calls per target path but not across paths, so
/// implementations must tolerate concurrent builds of distinct paths.
#[async_trait]
pub trait NixBuilder: Send + Sync {
    /// Builds `out_path`, fetching from the `source` substituter when one
    /// is given.
    async fn build(&self, source: &str, out_path: &Path) -> Result<()>;
}

/// Default builder that shells out to the Nix CLI.
///
/// Without a source the store path is realised locally
/// (`nix-store --realise`); with one it is copied from that substituter
/// (`nix copy --from`).
pub struct NixCliBuilder {
    nix_store_program: PathBuf,
    nix_program: PathBuf,
}

impl NixCliBuilder {
    /// Creates a builder that invokes `nix-store` and `nix` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder with explicit program paths.
    pub fn with_programs(nix_store: impl Into<PathBuf>, nix: impl Into<PathBuf>) -> Self {
        Self {
            nix_store_program: nix_store.into(),
            nix_program: nix.into(),
        }
    }
}

impl Default for NixCliBuilder {
    fn default() -> Self {
        Self {
            nix_store_program: PathBuf::from("nix-store"),
            nix_program: PathBuf::from("nix"),
        }
    }
}

#[async_trait]
impl NixBuilder for NixCliBuilder {
    async fn build(&self, source: &str, out_path: &Path) -> Result<()> {
        let mut cmd = if source.is_empty() {
            let mut cmd = Command::new(&self.nix_store_program);
            cmd.arg("--realise").arg(out_path);
            cmd
        } else {
            let mut cmd = Command::new(&self.nix_program);
            cmd.arg("copy").arg("--from").arg(source).arg(out_path);
            cmd
        };

        debug!(out_path = %out_path.display(), "running nix builder");
        let output = cmd.output().await?;
        if !output.status.success() {
            return Err(ImageError::Builder(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_io_error() {
        let builder = NixCliBuilder::with_programs("/nonexistent/nix-store", "/nonexistent/nix");
        let err = builder
            .build("", Path::new("/nix/store/unused"))
            .await
            .unwrap_err();
        assert!(matches!(err, ImageError::Io(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_program_is_builder_error() {
        let builder = NixCliBuilder::with_programs("false", "false");
        let err = builder
            .build("", Path::new("/nix/store/unused"))
            .await
            .unwrap_err();
        assert!(matches!(err, ImageError::Builder(_)));
    }
}
