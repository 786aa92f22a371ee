//! Bounded in-process product store.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::error::{ProductError, ProductResult};
use crate::models::{ListProductsFilter, NewProduct, Product, ProductId};
use crate::repository::ProductRepository;

#[derive(Debug, Default)]
struct Inner {
    products: HashMap<ProductId, Product>,
    next_id: u64,
}

impl Inner {
    /// Next counter value whose decimal form is not a live key.
    fn allocate_id(&mut self) -> ProductId {
        loop {
            self.next_id += 1;
            let candidate = ProductId::new(self.next_id.to_string());
            if !self.products.contains_key(&candidate) {
                return candidate;
            }
        }
    }
}

/// Holds at most `capacity` products in memory.
///
/// One lock guards both the map and the id counter, so each operation is
/// atomic with respect to every other. Nothing survives a restart.
#[derive(Debug)]
pub struct InMemoryProductRepository {
    capacity: usize,
    inner: RwLock<Inner>,
}

impl InMemoryProductRepository {
    /// Fails with `InvalidConfiguration` when `capacity` is zero.
    pub fn new(capacity: usize) -> ProductResult<Self> {
        if capacity == 0 {
            return Err(ProductError::InvalidConfiguration(
                "in-memory capacity must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            capacity,
            inner: RwLock::new(Inner::default()),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.products.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    #[instrument(level = "debug", skip(self, input), fields(backend = "memory", product_name = %input.name))]
    async fn create(&self, input: NewProduct) -> ProductResult<Product> {
        let mut inner = self.inner.write().await;

        if inner.products.len() >= self.capacity {
            return Err(ProductError::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        let id = inner.allocate_id();
        let product = input.into_product(id.clone());
        inner.products.insert(id, product.clone());

        debug!(product_id = %product.id, stored = inner.products.len(), "Stored product");
        Ok(product)
    }

    #[instrument(level = "debug", skip(self, product), fields(backend = "memory", product_id = %product.id))]
    async fn update(&self, product: Product) -> ProductResult<Product> {
        let mut inner = self.inner.write().await;

        match inner.products.get_mut(&product.id) {
            Some(existing) => {
                *existing = product.clone();
                Ok(product)
            }
            None => Err(ProductError::NotFound(product.id)),
        }
    }

    #[instrument(level = "debug", skip(self, id), fields(backend = "memory", product_id = %id))]
    async fn delete(&self, id: &ProductId) -> ProductResult<()> {
        let mut inner = self.inner.write().await;

        inner
            .products
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ProductError::NotFound(id.clone()))
    }

    #[instrument(level = "debug", skip(self, filter), fields(backend = "memory", ids = filter.ids.len()))]
    async fn list(&self, filter: ListProductsFilter) -> ProductResult<Vec<Product>> {
        let inner = self.inner.read().await;

        if filter.is_unrestricted() {
            return Ok(inner.products.values().cloned().collect());
        }

        let wanted: HashSet<&ProductId> = filter.ids.iter().collect();
        Ok(inner
            .products
            .values()
            .filter(|product| wanted.contains(&product.id))
            .cloned()
            .collect())
    }
}
