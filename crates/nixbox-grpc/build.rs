//! Build script for gRPC service code.
//!
//! The tonic client/server bindings for `runtime.v1.ImageService` are
//! checked in under `gen/runtime.v1.rs`. Regenerating them requires
//! `protoc` (via tonic-build); when it is unavailable the committed code
//! is used instead. `lib.rs` pulls the bindings in with
//! `tonic::include_proto!("runtime.v1")`, which includes
//! `$OUT_DIR/runtime.v1.rs`, so this script copies the committed file
//! there.

use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").expect("OUT_DIR not set"));
    std::fs::copy("gen/runtime.v1.rs", out_dir.join("runtime.v1.rs"))
        .expect("Failed to stage pre-generated gRPC bindings");

    println!("cargo:rerun-if-changed=gen/runtime.v1.rs");
    println!("cargo:rerun-if-changed=../nixbox-protocol/proto/image.proto");
}
