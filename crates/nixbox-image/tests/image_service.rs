//! Integration tests for the nix image service facade.
//!
//! These tests drive the facade against a fake backend CRI service served
//! over a Unix socket, with recording builder and loader collaborators.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nixbox_grpc::v1::image_service_server::{ImageService, ImageServiceServer};
use nixbox_image::{
    connect, spawn_binder, Backend, BinderConfig, ImageError, ImageLoader, LoadedImage,
    NixBuilder, NixImageService,
};
use nixbox_protocol::v1::{
    FilesystemIdentifier, FilesystemUsage, Image, ImageFsInfoRequest, ImageFsInfoResponse,
    ImageSpec, ImageStatusRequest, ImageStatusResponse, ListImagesRequest, ListImagesResponse,
    PullImageRequest, PullImageResponse, RemoveImageRequest, RemoveImageResponse, UInt64Value,
};
use oci_spec::image::{Descriptor, DescriptorBuilder, MediaType};
use tempfile::TempDir;
use tokio::sync::Mutex;
use tokio_stream::wrappers::UnixListenerStream;
use tonic::transport::Server;
use tonic::{Code, Request, Response, Status};

const TEST_SYSTEM: &str = "x86_64-linux";
const TEST_DIGEST: &str =
    "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

// ============================================================================
// Fake backend CRI service
// ============================================================================

#[derive(Clone, Default)]
struct FakeBackend {
    pulls: Arc<AtomicUsize>,
    removed: Arc<Mutex<Vec<String>>>,
}

#[tonic::async_trait]
impl ImageService for FakeBackend {
    async fn list_images(
        &self,
        _request: Request<ListImagesRequest>,
    ) -> Result<Response<ListImagesResponse>, Status> {
        Ok(Response::new(ListImagesResponse {
            images: vec![Image {
                id: "img-1".to_string(),
                repo_tags: vec!["nginx:latest".to_string()],
                ..Default::default()
            }],
        }))
    }

    async fn image_status(
        &self,
        _request: Request<ImageStatusRequest>,
    ) -> Result<Response<ImageStatusResponse>, Status> {
        Ok(Response::new(ImageStatusResponse {
            image: None,
            info: HashMap::from([("note".to_string(), "fake".to_string())]),
        }))
    }

    async fn pull_image(
        &self,
        request: Request<PullImageRequest>,
    ) -> Result<Response<PullImageResponse>, Status> {
        self.pulls.fetch_add(1, Ordering::SeqCst);
        let reference = request
            .into_inner()
            .image
            .map(|spec| spec.image)
            .unwrap_or_default();
        if reference == "fail.example/app" {
            return Err(Status::not_found("no such image"));
        }
        Ok(Response::new(PullImageResponse {
            image_ref: format!("backend:{reference}"),
        }))
    }

    async fn remove_image(
        &self,
        request: Request<RemoveImageRequest>,
    ) -> Result<Response<RemoveImageResponse>, Status> {
        let reference = request
            .into_inner()
            .image
            .map(|spec| spec.image)
            .unwrap_or_default();
        self.removed.lock().await.push(reference);
        Ok(Response::new(RemoveImageResponse {}))
    }

    async fn image_fs_info(
        &self,
        _request: Request<ImageFsInfoRequest>,
    ) -> Result<Response<ImageFsInfoResponse>, Status> {
        Ok(Response::new(ImageFsInfoResponse {
            image_filesystems: vec![FilesystemUsage {
                timestamp: 42,
                fs_id: Some(FilesystemIdentifier {
                    mountpoint: "/var/lib/containerd".to_string(),
                }),
                used_bytes: Some(UInt64Value { value: 1024 }),
                inodes_used: None,
            }],
        }))
    }
}

async fn serve_fake_backend(socket: &Path, fake: FakeBackend) {
    let listener = tokio::net::UnixListener::bind(socket).expect("Failed to bind Unix socket");
    let incoming = UnixListenerStream::new(listener);
    tokio::spawn(async move {
        Server::builder()
            .add_service(ImageServiceServer::new(fake))
            .serve_with_incoming(incoming)
            .await
            .expect("fake backend server failed");
    });
}

// ============================================================================
// Recording collaborators
// ============================================================================

#[derive(Clone, Default)]
struct RecordingBuilder {
    calls: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

#[async_trait]
impl NixBuilder for RecordingBuilder {
    async fn build(&self, _source: &str, out_path: &Path) -> nixbox_image::Result<()> {
        self.calls
            .lock()
            .await
            .push(out_path.display().to_string());
        if self.fail {
            return Err(ImageError::Builder("boom".to_string()));
        }
        tokio::fs::write(out_path, b"archive").await?;
        Ok(())
    }
}

#[derive(Clone, Default)]
struct RecordingLoader {
    calls: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ImageLoader for RecordingLoader {
    async fn load(&self, archive_path: &Path) -> nixbox_image::Result<Box<dyn LoadedImage>> {
        self.calls
            .lock()
            .await
            .push(archive_path.display().to_string());
        Ok(Box::new(FakeImage))
    }
}

struct FakeImage;

#[async_trait]
impl LoadedImage for FakeImage {
    async fn config(&self) -> nixbox_image::Result<Descriptor> {
        let descriptor = DescriptorBuilder::default()
            .media_type(MediaType::ImageConfig)
            .digest(TEST_DIGEST.parse::<oci_spec::image::Digest>().unwrap())
            .size(0u64)
            .build()?;
        Ok(descriptor)
    }
}

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    service: NixImageService,
    fake: FakeBackend,
    builder: RecordingBuilder,
    loader: RecordingLoader,
    tmp: TempDir,
}

impl Harness {
    /// Harness with an unbound backend handle.
    fn unbound() -> Self {
        let builder = RecordingBuilder::default();
        let loader = RecordingLoader::default();
        let service = NixImageService::with_system(
            TEST_SYSTEM,
            Backend::new(),
            Arc::new(builder.clone()),
            Arc::new(loader.clone()),
        );
        Self {
            service,
            fake: FakeBackend::default(),
            builder,
            loader,
            tmp: TempDir::new().unwrap(),
        }
    }

    /// Harness bound to a fake backend served over a Unix socket.
    async fn bound() -> Self {
        Self::bound_with(RecordingBuilder::default()).await
    }

    async fn bound_with(builder: RecordingBuilder) -> Self {
        let tmp = TempDir::new().unwrap();
        let socket = tmp.path().join("backend.sock");
        let fake = FakeBackend::default();
        serve_fake_backend(&socket, fake.clone()).await;

        let client = connect(socket.to_str().unwrap()).await.unwrap();
        let backend = Backend::new();
        backend.publish(client).await;

        let loader = RecordingLoader::default();
        let service = NixImageService::with_system(
            TEST_SYSTEM,
            backend,
            Arc::new(builder.clone()),
            Arc::new(loader.clone()),
        );
        Self {
            service,
            fake,
            builder,
            loader,
            tmp,
        }
    }

    fn archive_path(&self) -> PathBuf {
        self.tmp.path().join("archive")
    }

    /// Encoded reference whose embedded path points into the scratch dir.
    fn encoded_ref(&self) -> String {
        format!("nix:0{}", self.archive_path().display())
    }
}

fn pull_request(reference: &str) -> Request<PullImageRequest> {
    Request::new(PullImageRequest {
        image: Some(ImageSpec {
            image: reference.to_string(),
            ..Default::default()
        }),
        auth: None,
    })
}

fn status_request(reference: &str) -> Request<ImageStatusRequest> {
    Request::new(ImageStatusRequest {
        image: Some(ImageSpec {
            image: reference.to_string(),
            ..Default::default()
        }),
        verbose: false,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_every_call_unavailable_before_bind() {
    let h = Harness::unbound();

    let err = h
        .service
        .list_images(Request::new(ListImagesRequest::default()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::Unavailable);
    assert!(err.message().contains("not yet initialized"));

    let err = h
        .service
        .image_status(status_request("nginx:latest"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::Unavailable);

    let err = h
        .service
        .pull_image(pull_request("nginx:latest"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::Unavailable);

    let err = h
        .service
        .remove_image(Request::new(RemoveImageRequest { image: None }))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::Unavailable);

    let err = h
        .service
        .image_fs_info(Request::new(ImageFsInfoRequest {}))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::Unavailable);
}

#[tokio::test]
async fn test_passthrough_calls_return_backend_responses() {
    let h = Harness::bound().await;

    let images = h
        .service
        .list_images(Request::new(ListImagesRequest::default()))
        .await
        .unwrap()
        .into_inner()
        .images;
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].id, "img-1");

    let status = h
        .service
        .image_status(status_request("nginx:latest"))
        .await
        .unwrap()
        .into_inner();
    assert!(status.image.is_none());
    assert_eq!(status.info.get("note").map(String::as_str), Some("fake"));

    h.service
        .remove_image(Request::new(RemoveImageRequest {
            image: Some(ImageSpec {
                image: "nginx:latest".to_string(),
                ..Default::default()
            }),
        }))
        .await
        .unwrap();
    assert_eq!(*h.fake.removed.lock().await, vec!["nginx:latest"]);

    let fs_info = h
        .service
        .image_fs_info(Request::new(ImageFsInfoRequest {}))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(fs_info.image_filesystems.len(), 1);
    assert_eq!(fs_info.image_filesystems[0].timestamp, 42);
}

#[tokio::test]
async fn test_backend_error_passes_through_unchanged() {
    let h = Harness::bound().await;

    let err = h
        .service
        .pull_image(pull_request("fail.example/app"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::NotFound);
    assert_eq!(err.message(), "no such image");
    assert_eq!(h.fake.pulls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_plain_pull_falls_back_to_backend() {
    let h = Harness::bound().await;

    let response = h
        .service
        .pull_image(pull_request("docker.io/library/nginx:latest"))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(response.image_ref, "backend:docker.io/library/nginx:latest");
    assert_eq!(h.fake.pulls.load(Ordering::SeqCst), 1);
    assert!(h.builder.calls.lock().await.is_empty());
    assert!(h.loader.calls.lock().await.is_empty());
}

#[tokio::test]
async fn test_encoded_pull_with_existing_archive_skips_builder() {
    let h = Harness::bound().await;
    tokio::fs::write(h.archive_path(), b"archive").await.unwrap();

    let response = h
        .service
        .pull_image(pull_request(&h.encoded_ref()))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(response.image_ref, TEST_DIGEST);
    assert!(h.builder.calls.lock().await.is_empty());
    assert_eq!(
        *h.loader.calls.lock().await,
        vec![h.archive_path().display().to_string()],
    );
    assert_eq!(h.fake.pulls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_encoded_pull_builds_missing_archive() {
    let h = Harness::bound().await;

    let response = h
        .service
        .pull_image(pull_request(&h.encoded_ref()))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(response.image_ref, TEST_DIGEST);

    let built = h.builder.calls.lock().await.clone();
    assert_eq!(built, vec![h.archive_path().display().to_string()]);
    assert!(h.archive_path().exists());
    assert_eq!(
        *h.loader.calls.lock().await,
        vec![h.archive_path().display().to_string()],
    );
}

#[tokio::test]
async fn test_latest_tag_resolves_to_same_archive() {
    let h = Harness::bound().await;
    tokio::fs::write(h.archive_path(), b"archive").await.unwrap();

    let reference = format!("{}:latest", h.encoded_ref());
    let response = h
        .service
        .pull_image(pull_request(&reference))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(response.image_ref, TEST_DIGEST);
    assert_eq!(
        *h.loader.calls.lock().await,
        vec![h.archive_path().display().to_string()],
    );
}

#[tokio::test]
async fn test_builder_failure_propagates() {
    let h = Harness::bound_with(RecordingBuilder {
        calls: Arc::default(),
        fail: true,
    })
    .await;

    let err = h
        .service
        .pull_image(pull_request(&h.encoded_ref()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::Internal);
    assert!(err.message().contains("boom"));
    assert_eq!(h.builder.calls.lock().await.len(), 1);
    assert!(h.loader.calls.lock().await.is_empty());
}

#[tokio::test]
async fn test_unknown_architecture_degrades_to_empty_path() {
    let h = Harness::bound().await;

    // Multiarch table carries aarch64 only; the x86_64 service resolves an
    // empty path, and the pull fails at the build step rather than parsing.
    let reference =
        "nix:0/multiarch/aarch64-linux/nix/store/gjilixzvxk9pzilz3ixxamrjqk4mk1jl-nginx-1.24.0";
    let err = h
        .service
        .pull_image(pull_request(reference))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::Internal);
    assert_eq!(*h.builder.calls.lock().await, vec![String::new()]);
    assert!(h.loader.calls.lock().await.is_empty());
}

#[tokio::test]
async fn test_concurrent_pulls_build_once() {
    let h = Harness::bound().await;
    let reference = h.encoded_ref();

    let (first, second) = tokio::join!(
        h.service.pull_image(pull_request(&reference)),
        h.service.pull_image(pull_request(&reference)),
    );
    assert_eq!(first.unwrap().into_inner().image_ref, TEST_DIGEST);
    assert_eq!(second.unwrap().into_inner().image_ref, TEST_DIGEST);

    assert_eq!(h.builder.calls.lock().await.len(), 1);
    assert_eq!(h.loader.calls.lock().await.len(), 2);
}

#[tokio::test]
async fn test_binder_binds_when_backend_appears() {
    let tmp = TempDir::new().unwrap();
    let socket = tmp.path().join("backend.sock");
    serve_fake_backend(&socket, FakeBackend::default()).await;

    let backend = Backend::new();
    let _binder = spawn_binder(
        backend.clone(),
        BinderConfig {
            address: socket.to_str().unwrap().to_string(),
            attempts: 50,
            delay: Duration::from_millis(10),
        },
    );

    tokio::time::timeout(Duration::from_secs(5), backend.bound())
        .await
        .expect("binder did not bind in time");
    assert!(backend.is_bound().await);
}
