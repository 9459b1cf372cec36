//! CRI image service facade.
//!
//! Forwards every image call to the backend CRI service, except pulls of
//! `nix:0` references, which are resolved to a store path, built if
//! absent, and loaded into the content store. The response to such a pull
//! is the config digest of the loaded image.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use nixbox_grpc::v1::image_service_server::ImageService;
use nixbox_grpc::ImageServiceClient;
use nixbox_protocol::v1::{
    ImageFsInfoRequest, ImageFsInfoResponse, ImageStatusRequest, ImageStatusResponse,
    ListImagesRequest, ListImagesResponse, PullImageRequest, PullImageResponse,
    RemoveImageRequest, RemoveImageResponse,
};
use tokio::sync::Mutex;
use tonic::transport::Channel;
use tonic::{Request, Response, Status};
use tracing::info;

use crate::backend::Backend;
use crate::builder::NixBuilder;
use crate::error::ImageError;
use crate::loader::ImageLoader;
use crate::reference::{host_system, resolve_store_path, IMAGE_REF_PREFIX};

/// CRI image service that resolves Nix-encoded references.
///
/// All dependencies are injected at construction: the backend handle the
/// binder publishes into, the builder that materializes store paths, and
/// the loader that ingests archives into the content store.
pub struct NixImageService {
    backend: Backend,
    builder: Arc<dyn NixBuilder>,
    loader: Arc<dyn ImageLoader>,
    /// Nix system double of the host, fixed at construction.
    system: String,
    /// Substituter passed to the builder; empty builds locally.
    source: String,
    /// One guard per archive path, held across the existence check and
    /// build so concurrent pulls of the same path build at most once.
    build_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl NixImageService {
    /// Creates a service for the host platform.
    ///
    /// # Errors
    ///
    /// Fails when the host is not one of the supported Nix systems.
    pub fn new(
        backend: Backend,
        builder: Arc<dyn NixBuilder>,
        loader: Arc<dyn ImageLoader>,
    ) -> Result<Self, ImageError> {
        Ok(Self::with_system(host_system()?, backend, builder, loader))
    }

    /// Creates a service for an explicit Nix system double.
    pub fn with_system(
        system: impl Into<String>,
        backend: Backend,
        builder: Arc<dyn NixBuilder>,
        loader: Arc<dyn ImageLoader>,
    ) -> Self {
        Self {
            backend,
            builder,
            loader,
            system: system.into(),
            source: String::new(),
            build_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Sets the substituter the builder fetches store paths from.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    async fn client(&self) -> Result<ImageServiceClient<Channel>, Status> {
        self.backend
            .client()
            .await
            .ok_or_else(|| Status::from(ImageError::NotInitialized))
    }

    async fn build_lock(&self, archive_path: &str) -> Arc<Mutex<()>> {
        let mut locks = self.build_locks.lock().await;
        locks.entry(archive_path.to_string()).or_default().clone()
    }

    /// Makes sure the archive exists locally, invoking the builder when it
    /// does not. Existence on disk is the build-completion signal.
    async fn ensure_archive(&self, archive_path: &str) -> Result<(), Status> {
        let lock = self.build_lock(archive_path).await;
        let _guard = lock.lock().await;

        match tokio::fs::metadata(archive_path).await {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(archive = %archive_path, "pulling nix image archive");
                self.builder
                    .build(&self.source, Path::new(archive_path))
                    .await
                    .map_err(Status::from)
            }
            Err(err) => Err(ImageError::from(err).into()),
        }
    }
}

#[tonic::async_trait]
impl ImageService for NixImageService {
    async fn list_images(
        &self,
        request: Request<ListImagesRequest>,
    ) -> Result<Response<ListImagesResponse>, Status> {
        let mut client = self.client().await?;
        client.list_images(request.into_inner()).await
    }

    async fn image_status(
        &self,
        request: Request<ImageStatusRequest>,
    ) -> Result<Response<ImageStatusResponse>, Status> {
        let mut client = self.client().await?;
        client.image_status(request.into_inner()).await
    }

    async fn pull_image(
        &self,
        request: Request<PullImageRequest>,
    ) -> Result<Response<PullImageResponse>, Status> {
        let mut client = self.client().await?;
        let req = request.into_inner();

        let reference = req
            .image
            .as_ref()
            .map(|spec| spec.image.clone())
            .unwrap_or_default();
        if !reference.starts_with(IMAGE_REF_PREFIX) {
            info!(reference = %reference, "falling back to backend CRI pull");
            return client.pull_image(req).await;
        }

        let archive_path = resolve_store_path(&reference, &self.system);
        self.ensure_archive(&archive_path).await?;

        info!(archive = %archive_path, "loading nix image archive");
        let image = self
            .loader
            .load(Path::new(&archive_path))
            .await
            .map_err(Status::from)?;
        let config = image.config().await.map_err(Status::from)?;
        let image_ref = config.digest().to_string();

        info!(image_ref = %image_ref, "successfully pulled nix image");
        Ok(Response::new(PullImageResponse { image_ref }))
    }

    async fn remove_image(
        &self,
        request: Request<RemoveImageRequest>,
    ) -> Result<Response<RemoveImageResponse>, Status> {
        let mut client = self.client().await?;
        client.remove_image(request.into_inner()).await
    }

    async fn image_fs_info(
        &self,
        request: Request<ImageFsInfoRequest>,
    ) -> Result<Response<ImageFsInfoResponse>, Status> {
        let mut client = self.client().await?;
        client.image_fs_info(request.into_inner()).await
    }
}
