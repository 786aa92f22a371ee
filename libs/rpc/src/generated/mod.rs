// @generated
// This file wires up buf-generated protobuf code
// Note: The prost files already include!() the tonic files automatically

pub mod products {
    include!("products.v1.rs");
    // products.v1.tonic.rs is auto-included by products.v1.rs
}
