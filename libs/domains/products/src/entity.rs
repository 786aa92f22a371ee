use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;

use crate::error::ProductError;
use crate::models::{NewProduct, Product, ProductId};

/// Sea-ORM entity for the `products` table (see `schema.sql`).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(column_type = "Text")]
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub price: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Prices are stored as `BIGINT`, so the upper half of `u64` is rejected.
pub(crate) fn price_to_column(price: u64) -> Result<i64, ProductError> {
    i64::try_from(price)
        .map_err(|_| ProductError::Validation(format!("price {} is out of range", price)))
}

impl TryFrom<Model> for Product {
    type Error = ProductError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let price = u64::try_from(model.price).map_err(|_| {
            ProductError::Storage(format!("product {} has negative price {}", model.id, model.price))
        })?;

        Ok(Product {
            id: ProductId::new(model.id.to_string()),
            name: model.name,
            description: model.description,
            price,
        })
    }
}

impl TryFrom<NewProduct> for ActiveModel {
    type Error = ProductError;

    fn try_from(input: NewProduct) -> Result<Self, Self::Error> {
        Ok(ActiveModel {
            id: NotSet,
            name: Set(input.name),
            description: Set(input.description),
            price: Set(price_to_column(input.price)?),
        })
    }
}
