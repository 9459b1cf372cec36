//! Archive load collaborator.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use oci_spec::image::{Descriptor, DescriptorBuilder, Digest, MediaType};
use tokio::process::Command;
use tracing::debug;

use crate::error::{ImageError, Result};

/// Ingests a built image archive into the runtime's content store.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    /// Loads the archive at `archive_path` and returns a handle to the
    /// stored image.
    async fn load(&self, archive_path: &Path) -> Result<Box<dyn LoadedImage>>;
}

/// A loaded image in the content store.
#[async_trait]
pub trait LoadedImage: Send + Sync {
    /// Returns the descriptor of the image's configuration object.
    async fn config(&self) -> Result<Descriptor>;
}

/// Default loader that delegates to an external load command.
///
/// The command is invoked as `<program> load --namespace <ns> <archive>`
/// and must print the config digest (`sha256:...`) of the stored image on
/// stdout.
pub struct CliLoader {
    program: PathBuf,
    namespace: String,
}

impl CliLoader {
    /// Creates a loader that targets the Kubernetes containerd namespace.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            namespace: "k8s.io".to_string(),
        }
    }

    /// Overrides the containerd namespace the image is loaded into.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
}

#[async_trait]
impl ImageLoader for CliLoader {
    async fn load(&self, archive_path: &Path) -> Result<Box<dyn LoadedImage>> {
        debug!(archive = %archive_path.display(), "running image loader");
        let output = Command::new(&self.program)
            .arg("load")
            .arg("--namespace")
            .arg(&self.namespace)
            .arg(archive_path)
            .output()
            .await?;
        if !output.status.success() {
            return Err(ImageError::Loader(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let digest = parse_digest(&stdout)?;
        Ok(Box::new(CliLoadedImage { digest }))
    }
}

struct CliLoadedImage {
    digest: Digest,
}

#[async_trait]
impl LoadedImage for CliLoadedImage {
    async fn config(&self) -> Result<Descriptor> {
        // The load command reports only the digest; the config blob itself
        // stays in the content store.
        let descriptor = DescriptorBuilder::default()
            .media_type(MediaType::ImageConfig)
            .digest(self.digest.clone())
            .size(0u64)
            .build()?;
        Ok(descriptor)
    }
}

/// Extracts the first `sha256:` digest printed by the load command.
fn parse_digest(stdout: &str) -> Result<Digest> {
    let token = stdout
        .split_whitespace()
        .find(|token| token.starts_with("sha256:"))
        .ok_or_else(|| ImageError::Loader("load command printed no config digest".to_string()))?;
    token
        .parse()
        .map_err(|err| ImageError::Loader(format!("invalid digest {token:?}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: &str = "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn test_parse_digest_picks_first_token() {
        let stdout = format!("loaded image\n{DIGEST}\nsha256:ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff\n");
        assert_eq!(parse_digest(&stdout).unwrap().to_string(), DIGEST);
    }

    #[test]
    fn test_parse_digest_requires_digest() {
        assert!(parse_digest("loaded image\n").is_err());
    }

    #[test]
    fn test_parse_digest_rejects_malformed() {
        assert!(parse_digest("sha256:not-hex").is_err());
    }

    #[tokio::test]
    async fn test_loaded_image_config_descriptor() {
        let image = CliLoadedImage {
            digest: DIGEST.parse().unwrap(),
        };
        let descriptor = image.config().await.unwrap();
        assert_eq!(descriptor.digest().to_string(), DIGEST);
    }
}
