//! Product Service - the single entry point for every transport adapter

use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::error::{ProductError, ProductResult};
use crate::models::{ListProductsFilter, NewProduct, Product, ProductId};
use crate::repository::ProductRepository;

/// Forwards each operation to the repository and logs it.
///
/// Repository errors are returned unchanged; mapping them to wire codes is
/// up to the caller. One instance (or its clones) is shared by all adapters.
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repository: R) -> Self {
        Self::from_shared(Arc::new(repository))
    }

    /// Build a service over a repository that is also held elsewhere.
    pub fn from_shared(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    #[instrument(skip(self, filter), fields(ids = filter.ids.len()))]
    pub async fn list_products(&self, filter: ListProductsFilter) -> ProductResult<Vec<Product>> {
        info!(filter = ?filter.ids, "Listing products");
        self.repository
            .list(filter)
            .await
            .inspect_err(|e| log_failure("list", e))
    }

    #[instrument(skip(self, input), fields(product_name = %input.name))]
    pub async fn register_product(&self, input: NewProduct) -> ProductResult<Product> {
        info!(price = input.price, "Registering product");
        self.repository
            .create(input)
            .await
            .inspect_err(|e| log_failure("register", e))
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn update_product(&self, product: Product) -> ProductResult<Product> {
        info!(name = %product.name, price = product.price, "Updating product");
        self.repository
            .update(product)
            .await
            .inspect_err(|e| log_failure("update", e))
    }

    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> ProductResult<()> {
        info!("Deleting product");
        self.repository
            .delete(id)
            .await
            .inspect_err(|e| log_failure("delete", e))
    }
}

fn log_failure(operation: &'static str, err: &ProductError) {
    match err {
        ProductError::Storage(_) | ProductError::InvalidConfiguration(_) => {
            error!(operation, error = %err, "Product operation failed")
        }
        _ => warn!(operation, error = %err, "Product operation rejected"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryProductRepository;
    use crate::repository::MockProductRepository;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_register_forwards_to_create() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_create()
            .with(eq(NewProduct::new("Iphone 12", "", 4500)))
            .times(1)
            .returning(|input| Ok(input.into_product(ProductId::from("1"))));

        let service = ProductService::new(mock_repo);
        let product = service
            .register_product(NewProduct::new("Iphone 12", "", 4500))
            .await
            .unwrap();

        assert_eq!(product.id.as_str(), "1");
    }

    #[tokio::test]
    async fn test_errors_are_forwarded_unchanged() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_create()
            .returning(|_| Err(ProductError::CapacityExceeded { capacity: 1 }));
        mock_repo
            .expect_delete()
            .with(eq(ProductId::from("4")))
            .returning(|id| Err(ProductError::NotFound(id.clone())));
        mock_repo
            .expect_list()
            .returning(|_| Err(ProductError::Storage("connection reset".to_string())));

        let service = ProductService::new(mock_repo);

        assert!(matches!(
            service.register_product(NewProduct::new("x", "", 1)).await,
            Err(ProductError::CapacityExceeded { capacity: 1 })
        ));
        assert!(matches!(
            service.delete_product(&ProductId::from("4")).await,
            Err(ProductError::NotFound(id)) if id.as_str() == "4"
        ));
        assert!(matches!(
            service.list_products(ListProductsFilter::all()).await,
            Err(ProductError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn test_update_passes_whole_product() {
        let replacement = NewProduct::new("new", "d", 2).into_product(ProductId::from("3"));

        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_update()
            .with(eq(replacement.clone()))
            .returning(Ok);

        let service = ProductService::new(mock_repo);
        assert_eq!(service.update_product(replacement.clone()).await.unwrap(), replacement);
    }

    #[tokio::test]
    async fn test_list_passes_filter_through() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_list()
            .with(eq(ListProductsFilter::by_ids(["1"])))
            .returning(|_| Ok(vec![]));

        let service = ProductService::new(mock_repo);
        assert!(service
            .list_products(ListProductsFilter::by_ids(["1"]))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_one_repository() {
        let service = ProductService::new(InMemoryProductRepository::new(1).unwrap());
        let other = service.clone();

        service
            .register_product(NewProduct::new("Iphone 12", "", 4500))
            .await
            .unwrap();

        assert!(Arc::ptr_eq(service.repository(), other.repository()));
        assert!(matches!(
            other.register_product(NewProduct::new("second", "", 1)).await,
            Err(ProductError::CapacityExceeded { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_update_list_round_trip() {
        let service = ProductService::new(InMemoryProductRepository::new(10).unwrap());

        let created = service
            .register_product(NewProduct::new("p", "first", 1))
            .await
            .unwrap();
        let q = NewProduct::new("q", "", 2).into_product(created.id.clone());
        service.update_product(q.clone()).await.unwrap();

        let listed = service
            .list_products(ListProductsFilter::by_ids([created.id]))
            .await
            .unwrap();
        assert_eq!(listed, vec![q]);
    }
}
