//! gRPC client and server bindings for the CRI image service.
//!
//! This crate provides tonic-generated code for the `runtime.v1.ImageService`
//! contract. Message types are imported from `nixbox-protocol`.
//!
//! # Usage
//!
//! ```ignore
//! use nixbox_grpc::ImageServiceClient;
//! use nixbox_protocol::v1::ListImagesRequest;
//!
//! // Connect to containerd's CRI plugin via Unix socket
//! let channel = tonic::transport::Endpoint::try_from("http://[::]:50051")?
//!     .connect_with_connector(tower::service_fn(|_| async {
//!         let stream = tokio::net::UnixStream::connect("/run/containerd/containerd.sock").await?;
//!         Ok::<_, std::io::Error>(hyper_util::rt::TokioIo::new(stream))
//!     }))
//!     .await?;
//!
//! let mut client = ImageServiceClient::new(channel);
//! let response = client.list_images(ListImagesRequest::default()).await?;
//! ```

// Re-export dependencies for convenience
pub use nixbox_protocol;
pub use tonic;

/// The gRPC service from the `runtime.v1` package.
///
/// This module contains tonic-generated client and server code for
/// `ImageService`.
pub mod v1 {
    tonic::include_proto!("runtime.v1");
}

// Client re-exports
pub use v1::image_service_client::ImageServiceClient;

// Server re-exports
pub use v1::image_service_server::{ImageService, ImageServiceServer};
