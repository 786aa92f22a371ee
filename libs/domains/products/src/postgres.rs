use async_trait::async_trait;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder,
};
use tracing::instrument;

use crate::{
    entity::{self, price_to_column},
    error::{ProductError, ProductResult},
    models::{ListProductsFilter, NewProduct, Product, ProductId},
    repository::ProductRepository,
};

/// PostgreSQL-backed repository.
///
/// Ids come from the `BIGSERIAL` sequence and are never reused. Ids that are
/// not decimal integers cannot exist in the table and are treated as unknown.
pub struct PgProductRepository {
    db: DatabaseConnection,
}

impl PgProductRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Close the connection pool.
    pub async fn close(self) -> ProductResult<()> {
        database::postgres::close(self.db).await?;
        Ok(())
    }
}

fn parse_id(id: &ProductId) -> Option<i64> {
    id.as_str().parse().ok()
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    #[instrument(level = "debug", skip(self, input), fields(backend = "postgres", product_name = %input.name))]
    async fn create(&self, input: NewProduct) -> ProductResult<Product> {
        let active_model = entity::ActiveModel::try_from(input)?;
        let model = active_model.insert(&self.db).await?;

        tracing::info!(product_id = model.id, "Created product");
        model.try_into()
    }

    #[instrument(level = "debug", skip(self, product), fields(backend = "postgres", product_id = %product.id))]
    async fn update(&self, product: Product) -> ProductResult<Product> {
        let not_found = || ProductError::NotFound(product.id.clone());
        let id = parse_id(&product.id).ok_or_else(not_found)?;

        let existing = entity::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(not_found)?;

        let mut active_model = existing.into_active_model();
        active_model.name = Set(product.name);
        active_model.description = Set(product.description);
        active_model.price = Set(price_to_column(product.price)?);

        let model = active_model.update(&self.db).await?;

        tracing::info!(product_id = id, "Updated product");
        model.try_into()
    }

    #[instrument(level = "debug", skip(self, id), fields(backend = "postgres", product_id = %id))]
    async fn delete(&self, id: &ProductId) -> ProductResult<()> {
        let key = parse_id(id).ok_or_else(|| ProductError::NotFound(id.clone()))?;

        let result = entity::Entity::delete_by_id(key).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(ProductError::NotFound(id.clone()));
        }

        tracing::info!(product_id = key, "Deleted product");
        Ok(())
    }

    #[instrument(level = "debug", skip(self, filter), fields(backend = "postgres", ids = filter.ids.len()))]
    async fn list(&self, filter: ListProductsFilter) -> ProductResult<Vec<Product>> {
        let mut query = entity::Entity::find().order_by_asc(entity::Column::Id);

        if !filter.is_unrestricted() {
            let keys: Vec<i64> = filter.ids.iter().filter_map(parse_id).collect();
            if keys.is_empty() {
                return Ok(Vec::new());
            }
            query = query.filter(entity::Column::Id.is_in(keys));
        }

        query
            .all(&self.db)
            .await?
            .into_iter()
            .map(Product::try_from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn row(id: i64, name: &str, price: i64) -> entity::Model {
        entity::Model {
            id,
            name: name.to_string(),
            description: String::new(),
            price,
        }
    }

    #[tokio::test]
    async fn test_create_returns_row_with_sequence_id() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row(17, "Iphone 12", 4500)]])
            .into_connection();
        let repo = PgProductRepository::new(db);

        let product = repo
            .create(NewProduct::new("Iphone 12", "", 4500))
            .await
            .unwrap();

        assert_eq!(product.id.as_str(), "17");
        assert_eq!(product.price, 4500);
    }

    #[tokio::test]
    async fn test_create_rejects_price_beyond_bigint() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let repo = PgProductRepository::new(db);

        let err = repo
            .create(NewProduct::new("Yacht", "", u64::MAX))
            .await
            .unwrap_err();
        assert!(matches!(err, ProductError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<entity::Model>::new()])
            .into_connection();
        let repo = PgProductRepository::new(db);

        let err = repo
            .update(NewProduct::new("x", "", 1).into_product(ProductId::from("5")))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_non_numeric_id_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let repo = PgProductRepository::new(db);

        let err = repo
            .update(NewProduct::new("x", "", 1).into_product(ProductId::from("abc")))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_overwrites_all_fields() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row(3, "old", 10)]])
            .append_query_results([vec![row(3, "new", 20)]])
            .into_connection();
        let repo = PgProductRepository::new(db);

        let updated = repo
            .update(NewProduct::new("new", "", 20).into_product(ProductId::from("3")))
            .await
            .unwrap();

        assert_eq!(updated.name, "new");
        assert_eq!(updated.price, 20);
    }

    #[tokio::test]
    async fn test_delete_zero_rows_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let repo = PgProductRepository::new(db);

        let err = repo.delete(&ProductId::from("8")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_existing_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let repo = PgProductRepository::new(db);

        repo.delete(&ProductId::from("8")).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_with_only_unknown_ids_skips_the_query() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let repo = PgProductRepository::new(db);

        let products = repo
            .list(ListProductsFilter::by_ids(["not-a-number"]))
            .await
            .unwrap();
        assert!(products.is_empty());
    }

    #[tokio::test]
    async fn test_list_all_maps_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row(1, "a", 1), row(2, "b", 2)]])
            .into_connection();
        let repo = PgProductRepository::new(db);

        let products = repo.list(ListProductsFilter::all()).await.unwrap();
        let ids: Vec<&str> = products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_negative_price_row_is_storage_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row(1, "broken", -1)]])
            .into_connection();
        let repo = PgProductRepository::new(db);

        let err = repo.list(ListProductsFilter::all()).await.unwrap_err();
        assert!(err.is_transient());
    }
}
