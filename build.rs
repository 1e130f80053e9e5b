//! Build script for Beacon.
//!
//! Currently a no-op. The Envoy v3 discovery and endpoint types are
//! implemented directly in Rust (see src/xds/proto.rs) rather than generated
//! from protobuf definitions, so no proto files are needed at build time.
//!
//! If proto-based codegen is needed later, tonic-build can be configured here
//! to compile the Envoy API protos from a `proto/` directory.

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
}
