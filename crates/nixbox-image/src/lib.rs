//! # nixbox-image
//!
//! Nix image resolution in front of the CRI image service.
//!
//! A `nix:0` image reference embeds a content-addressed store path instead
//! of a registry coordinate. This crate resolves such references to the
//! architecture-specific archive, builds the archive when it is absent,
//! loads it into containerd's content store, and forwards every other
//! image-service call to the upstream CRI backend untouched.
//!
//! ## Architecture
//!
//! ```text
//! kubelet ──▶ NixImageService ──▶ backend CRI (passthrough)
//!                  │
//!                  ├─ reference: nix:0 ref + system ──▶ store path
//!                  ├─ builder:   materialize the archive if absent
//!                  └─ loader:    ingest archive, yield config digest
//!
//! Backend binder (background): retries the CRI connection and publishes
//! the client handle exactly once.
//! ```

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod backend;
pub mod builder;
pub mod error;
pub mod loader;
pub mod reference;
pub mod service;

// Re-export main types for convenience.
pub use backend::{connect, spawn_binder, Backend, BinderConfig};
pub use builder::{NixBuilder, NixCliBuilder};
pub use error::{ImageError, Result};
pub use loader::{CliLoader, ImageLoader, LoadedImage};
pub use reference::{host_system, resolve_store_path, IMAGE_REF_PREFIX};
pub use service::NixImageService;
