//! Product proto ↔ domain conversions

use rpc::products as proto;

use crate::models::{ListProductsFilter, NewProduct, Product, ProductId};

impl From<Product> for proto::Product {
    fn from(product: Product) -> Self {
        proto::Product {
            id: product.id.into_inner(),
            name: product.name,
            description: product.description,
            price: product.price,
        }
    }
}

impl TryFrom<proto::Product> for Product {
    type Error = String;

    fn try_from(proto: proto::Product) -> Result<Self, Self::Error> {
        if proto.id.is_empty() {
            return Err("product id must not be empty".to_string());
        }

        Ok(Product {
            id: ProductId::new(proto.id),
            name: proto.name,
            description: proto.description,
            price: proto.price,
        })
    }
}

impl From<proto::RegisterProductRequest> for NewProduct {
    fn from(request: proto::RegisterProductRequest) -> Self {
        NewProduct {
            name: request.name,
            description: request.description,
            price: request.price,
        }
    }
}

impl From<NewProduct> for proto::RegisterProductRequest {
    fn from(input: NewProduct) -> Self {
        proto::RegisterProductRequest {
            name: input.name,
            description: input.description,
            price: input.price,
        }
    }
}

impl From<proto::ListProductsRequest> for ListProductsFilter {
    fn from(request: proto::ListProductsRequest) -> Self {
        ListProductsFilter::by_ids(request.ids)
    }
}

pub fn list_response(products: Vec<Product>) -> proto::ListProductsResponse {
    proto::ListProductsResponse {
        products: products.into_iter().map(Into::into).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proto_product_requires_id() {
        let proto = proto::Product {
            id: String::new(),
            name: "Pen".to_string(),
            description: String::new(),
            price: 3,
        };
        assert!(Product::try_from(proto).is_err());
    }

    #[test]
    fn test_domain_to_proto_product() {
        let product = NewProduct::new("Pen", "blue", 3).into_product(ProductId::from("12"));
        let proto: proto::Product = product.clone().into();

        assert_eq!(proto.id, "12");
        assert_eq!(Product::try_from(proto).unwrap(), product);
    }

    #[test]
    fn test_list_request_to_filter() {
        let empty: ListProductsFilter = proto::ListProductsRequest { ids: vec![] }.into();
        assert!(empty.is_unrestricted());

        let filter: ListProductsFilter = proto::ListProductsRequest {
            ids: vec!["1".to_string(), "2".to_string()],
        }
        .into();
        assert_eq!(filter, ListProductsFilter::by_ids(["1", "2"]));
    }

    #[test]
    fn test_list_response_keeps_order() {
        let products = vec![
            NewProduct::new("Pen", "", 3).into_product(ProductId::from("2")),
            NewProduct::new("Cup", "", 7).into_product(ProductId::from("1")),
        ];
        let response = list_response(products);

        let ids: Vec<&str> = response.products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["2", "1"]);
        assert_eq!(response.products[1].price, 7);
    }
}
