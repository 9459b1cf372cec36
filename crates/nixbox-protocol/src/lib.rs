//! # nixbox-protocol
//!
//! Protocol definitions for the nixbox image service.
//!
//! This crate defines the message types for the Kubernetes CRI
//! (Container Runtime Interface) image surface that the nixbox daemon
//! speaks on both sides:
//!
//! - kubelet <-> nixbox daemon (gRPC over Unix socket)
//! - nixbox daemon <-> containerd CRI plugin (forwarded calls)
//!
//! ## Protocol Buffers
//!
//! The protocol is defined using Protocol Buffers for wire compatibility
//! with the upstream CRI definition. Message types are generated at build
//! time from `.proto` files; field numbers match `runtime.v1` so forwarded
//! messages re-encode cleanly.
//!
//! All types are defined under the `runtime.v1` package and re-exported
//! here.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
// Generated protobuf code has many clippy warnings that we cannot control.
#![allow(clippy::derive_partial_eq_without_eq)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

mod generated;

// Re-export the generated module as v1 (canonical path)
pub use generated::runtime_v1 as v1;

// Convenient crate-level re-exports
pub use v1::{
    AuthConfig, FilesystemIdentifier, FilesystemUsage, Image, ImageFilter, ImageFsInfoRequest,
    ImageFsInfoResponse, ImageSpec, ImageStatusRequest, ImageStatusResponse, Int64Value,
    ListImagesRequest, ListImagesResponse, PullImageRequest, PullImageResponse,
    RemoveImageRequest, RemoveImageResponse, UInt64Value,
};
