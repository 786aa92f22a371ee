use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Opaque product identifier.
///
/// The in-memory store renders a counter as decimal text and PostgreSQL uses
/// its `BIGSERIAL` key, so both fit in a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "42")]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A catalog entry as stored by a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: ProductId,
    #[schema(example = "Iphone 12")]
    pub name: String,
    pub description: String,
    /// Unit-less, non-negative
    #[schema(example = 4500)]
    pub price: u64,
}

/// Input for registering a product. The repository assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: u64,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, description: impl Into<String>, price: u64) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            price,
        }
    }

    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
        }
    }
}

/// Restricts a listing to a set of ids. An empty set means no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListProductsFilter {
    #[serde(default)]
    pub ids: Vec<ProductId>,
}

impl ListProductsFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_ids<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ProductId>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_id_serializes_as_plain_string() {
        let id = ProductId::from("7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"7\"");
        assert_eq!(id.to_string(), "7");
    }

    #[test]
    fn test_into_product_keeps_fields() {
        let product = NewProduct::new("Iphone 12", "phone", 4500).into_product(ProductId::from("1"));
        assert_eq!(product.id.as_str(), "1");
        assert_eq!(product.name, "Iphone 12");
        assert_eq!(product.description, "phone");
        assert_eq!(product.price, 4500);
    }

    #[test]
    fn test_new_product_description_defaults_to_empty() {
        let input: NewProduct = serde_json::from_str(r#"{"name":"Pen","price":3}"#).unwrap();
        assert!(input.description.is_empty());
    }

    #[test]
    fn test_filter_constructors() {
        assert!(ListProductsFilter::all().is_unrestricted());

        let filter = ListProductsFilter::by_ids(["1", "2"]);
        assert!(!filter.is_unrestricted());
        assert_eq!(filter.ids, vec![ProductId::from("1"), ProductId::from("2")]);
    }
}
