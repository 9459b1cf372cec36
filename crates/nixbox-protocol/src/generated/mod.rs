//! Generated protocol buffer types.
//!
//! This module contains Rust types generated from `.proto` files by
//! prost-build.

// Allow clippy warnings in generated code.
#![allow(clippy::all)]
#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]

/// All protocol buffer types from the `runtime.v1` package.
///
/// This module includes types from:
/// - `image.proto` - CRI image service messages
#[path = "runtime.v1.rs"]
pub mod runtime_v1;
