//! Products domain
//!
//! Entity model, the storage contract with its in-memory and PostgreSQL
//! implementations, the application service every transport adapter calls
//! into, and the adapter-facing pieces that belong with the domain: proto
//! conversions, the register-product stream job and the HTTP query gateway.
//!
//! ```text
//! adapters (gRPC, stream worker, HTTP gateway)
//!        │
//!   ProductService   ← logs and forwards, no state of its own
//!        │
//!  ProductRepository ← InMemoryProductRepository | PgProductRepository
//! ```
//!
//! ```rust,no_run
//! use domain_products::{ProductService, ProductStore, StorageConfig, handlers};
//!
//! # async fn example() -> Result<(), domain_products::ProductError> {
//! let store = ProductStore::from_config(&StorageConfig::in_memory(10)).await?;
//! let service = ProductService::new(store);
//! let router = handlers::router(service);
//! # Ok(())
//! # }
//! ```

pub mod conversions;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;
pub mod storage;
pub mod streams;

pub use error::{ProductError, ProductResult};
pub use handlers::ApiDoc;
pub use memory::InMemoryProductRepository;
pub use models::{ListProductsFilter, NewProduct, Product, ProductId};
pub use postgres::PgProductRepository;
pub use repository::ProductRepository;
pub use service::ProductService;
pub use storage::{ProductStore, StorageBackend, StorageConfig};
pub use streams::{ProductStream, RegisterProductJob};
