//! Build script for protocol buffer message types.
//!
//! The message types generated from the .proto files are checked in under
//! `src/generated/` (see `src/generated/mod.rs`). Regenerating them requires
//! `protoc`; when it is unavailable the committed code is used as-is, so
//! this script does not invoke the compiler. It only asks cargo to rerun
//! when the proto source changes.

fn main() {
    println!("cargo:rerun-if-changed=proto/image.proto");
}
