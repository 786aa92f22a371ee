//! Repository selection from configuration.

use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_parse};
use database::RetryConfig;
use database::postgres::{PostgresConfig, connect_from_config_with_retry};
use strum::{Display, EnumString};
use tracing::info;

use crate::error::{ProductError, ProductResult};
use crate::memory::InMemoryProductRepository;
use crate::models::{ListProductsFilter, NewProduct, Product, ProductId};
use crate::postgres::PgProductRepository;
use crate::repository::ProductRepository;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

/// Which repository backs the service, and how to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Only used by the in-memory backend
    pub capacity: usize,
    /// Present when `backend` is `Postgres`
    pub postgres: Option<PostgresConfig>,
}

impl StorageConfig {
    pub fn in_memory(capacity: usize) -> Self {
        Self {
            backend: StorageBackend::Memory,
            capacity,
            postgres: None,
        }
    }

    pub fn postgres(config: PostgresConfig) -> Self {
        Self {
            backend: StorageBackend::Postgres,
            capacity: 0,
            postgres: Some(config),
        }
    }
}

impl FromEnv for StorageConfig {
    /// `PRODUCTS_STORAGE` (`memory` or `postgres`, default memory),
    /// `PRODUCTS_CAPACITY` (default 10), and the `PostgresConfig` variables
    /// when postgres is selected.
    fn from_env() -> Result<Self, ConfigError> {
        let backend: StorageBackend = env_parse("PRODUCTS_STORAGE", "memory")?;
        let capacity = env_parse("PRODUCTS_CAPACITY", "10")?;

        let postgres = match backend {
            StorageBackend::Postgres => Some(PostgresConfig::from_env()?),
            StorageBackend::Memory => None,
        };

        Ok(Self {
            backend,
            capacity,
            postgres,
        })
    }
}

/// The repository chosen at startup.
pub enum ProductStore {
    InMemory(InMemoryProductRepository),
    Postgres(PgProductRepository),
}

impl ProductStore {
    /// Build the configured backend. PostgreSQL is connected with retry and
    /// its table is expected to exist already.
    pub async fn from_config(config: &StorageConfig) -> ProductResult<Self> {
        match config.backend {
            StorageBackend::Memory => {
                let repo = InMemoryProductRepository::new(config.capacity)?;
                info!(capacity = config.capacity, "Using in-memory product storage");
                Ok(ProductStore::InMemory(repo))
            }
            StorageBackend::Postgres => {
                let pg_config = config.postgres.clone().ok_or_else(|| {
                    ProductError::InvalidConfiguration(
                        "postgres storage selected without a database configuration".to_string(),
                    )
                })?;
                let db = connect_from_config_with_retry(pg_config, Some(RetryConfig::new())).await?;
                info!("Using PostgreSQL product storage");
                Ok(ProductStore::Postgres(PgProductRepository::new(db)))
            }
        }
    }

    pub fn backend(&self) -> StorageBackend {
        match self {
            ProductStore::InMemory(_) => StorageBackend::Memory,
            ProductStore::Postgres(_) => StorageBackend::Postgres,
        }
    }

    /// Release backend resources. A no-op for the in-memory store.
    pub async fn close(self) -> ProductResult<()> {
        match self {
            ProductStore::InMemory(_) => Ok(()),
            ProductStore::Postgres(repo) => repo.close().await,
        }
    }
}

#[async_trait]
impl ProductRepository for ProductStore {
    async fn create(&self, input: NewProduct) -> ProductResult<Product> {
        match self {
            ProductStore::InMemory(repo) => repo.create(input).await,
            ProductStore::Postgres(repo) => repo.create(input).await,
        }
    }

    async fn update(&self, product: Product) -> ProductResult<Product> {
        match self {
            ProductStore::InMemory(repo) => repo.update(product).await,
            ProductStore::Postgres(repo) => repo.update(product).await,
        }
    }

    async fn delete(&self, id: &ProductId) -> ProductResult<()> {
        match self {
            ProductStore::InMemory(repo) => repo.delete(id).await,
            ProductStore::Postgres(repo) => repo.delete(id).await,
        }
    }

    async fn list(&self, filter: ListProductsFilter) -> ProductResult<Vec<Product>> {
        match self {
            ProductStore::InMemory(repo) => repo.list(filter).await,
            ProductStore::Postgres(repo) => repo.list(filter).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_defaults_to_memory() {
        temp_env::with_vars(
            [
                ("PRODUCTS_STORAGE", None::<&str>),
                ("PRODUCTS_CAPACITY", None),
            ],
            || {
                let config = StorageConfig::from_env().unwrap();
                assert_eq!(config, StorageConfig::in_memory(10));
            },
        );
    }

    #[test]
    fn test_from_env_postgres_requires_database_url() {
        temp_env::with_vars(
            [
                ("PRODUCTS_STORAGE", Some("Postgres")),
                ("DATABASE_URL", None),
            ],
            || {
                let err = StorageConfig::from_env().unwrap_err();
                assert_eq!(err, ConfigError::MissingEnvVar("DATABASE_URL".to_string()));
            },
        );
    }

    #[test]
    fn test_from_env_postgres() {
        temp_env::with_vars(
            [
                ("PRODUCTS_STORAGE", Some("postgres")),
                ("DATABASE_URL", Some("postgresql://localhost/products")),
            ],
            || {
                let config = StorageConfig::from_env().unwrap();
                assert_eq!(config.backend, StorageBackend::Postgres);
                assert_eq!(
                    config.postgres.unwrap().url,
                    "postgresql://localhost/products"
                );
            },
        );
    }

    #[test]
    fn test_from_env_unknown_backend() {
        temp_env::with_var("PRODUCTS_STORAGE", Some("cassandra"), || {
            let err = StorageConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("PRODUCTS_STORAGE"));
        });
    }

    #[tokio::test]
    async fn test_zero_capacity_fails_at_startup() {
        let result = ProductStore::from_config(&StorageConfig::in_memory(0)).await;
        assert!(matches!(result, Err(ProductError::InvalidConfiguration(_))));
    }

    #[tokio::test]
    async fn test_postgres_without_config_is_invalid() {
        let config = StorageConfig {
            backend: StorageBackend::Postgres,
            capacity: 0,
            postgres: None,
        };
        let result = ProductStore::from_config(&config).await;
        assert!(matches!(result, Err(ProductError::InvalidConfiguration(_))));
    }

    #[tokio::test]
    async fn test_memory_store_delegates() {
        let store = ProductStore::from_config(&StorageConfig::in_memory(2))
            .await
            .unwrap();
        assert_eq!(store.backend(), StorageBackend::Memory);

        let product = store.create(NewProduct::new("Pen", "", 3)).await.unwrap();
        let listed = store.list(ListProductsFilter::all()).await.unwrap();
        assert_eq!(listed, vec![product.clone()]);

        store.delete(&product.id).await.unwrap();
        store.close().await.unwrap();
    }
}
