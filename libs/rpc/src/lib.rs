//! Protobuf messages and tonic client/server stubs for the products service.

mod generated;

pub use generated::*;
