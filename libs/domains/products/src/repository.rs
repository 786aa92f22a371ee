use async_trait::async_trait;
use std::sync::Arc;

use crate::error::ProductResult;
use crate::models::{ListProductsFilter, NewProduct, Product, ProductId};

/// Storage contract for products.
///
/// Every backend assigns ids on `create`, replaces whole records on
/// `update`, and reports unknown ids as `ProductError::NotFound`. `list` with
/// an unrestricted filter returns every product; otherwise it returns only
/// the products whose id is in the filter, silently omitting unknown ids.
/// Callers must not rely on ordering.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Store a new product and return it with its assigned id
    async fn create(&self, input: NewProduct) -> ProductResult<Product>;

    /// Replace the product with the same id
    async fn update(&self, product: Product) -> ProductResult<Product>;

    /// Remove a product by id
    async fn delete(&self, id: &ProductId) -> ProductResult<()>;

    /// List products matching the filter
    async fn list(&self, filter: ListProductsFilter) -> ProductResult<Vec<Product>>;
}

#[async_trait]
impl<R: ProductRepository + ?Sized> ProductRepository for Arc<R> {
    async fn create(&self, input: NewProduct) -> ProductResult<Product> {
        (**self).create(input).await
    }

    async fn update(&self, product: Product) -> ProductResult<Product> {
        (**self).update(product).await
    }

    async fn delete(&self, id: &ProductId) -> ProductResult<()> {
        (**self).delete(id).await
    }

    async fn list(&self, filter: ListProductsFilter) -> ProductResult<Vec<Product>> {
        (**self).list(filter).await
    }
}
