//! HTTP query gateway for products
//!
//! Read-oriented projection of the catalog plus a create endpoint. Every
//! request goes through [`ProductService`]; the gateway keeps no state.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use axum_helpers::{ErrorResponse, ValidatedJson};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use validator::Validate;

use crate::error::{ProductError, ProductResult};
use crate::models::{ListProductsFilter, NewProduct, Product, ProductId};
use crate::repository::ProductRepository;
use crate::service::ProductService;

/// OpenAPI documentation for the products gateway
#[derive(OpenApi)]
#[openapi(
    paths(list_products, get_product, register_product),
    components(schemas(ProductView, ProductPage, RegisterProductInput, ErrorResponse)),
    tags(
        (name = "Products", description = "Product catalog queries")
    )
)]
pub struct ApiDoc;

/// Product as returned by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: u64,
    /// Price rendered for display
    #[schema(example = "4500")]
    pub display_price: String,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self {
            display_price: product.price.to_string(),
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProductPage {
    pub items: Vec<ProductView>,
    pub total: usize,
}

impl From<Vec<Product>> for ProductPage {
    fn from(products: Vec<Product>) -> Self {
        let items: Vec<ProductView> = products.into_iter().map(Into::into).collect();
        Self {
            total: items.len(),
            items,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterProductInput {
    #[validate(length(min = 1, max = 255))]
    #[schema(example = "Iphone 12")]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 4096))]
    pub description: String,
    #[schema(example = 4500)]
    pub price: u64,
}

impl From<RegisterProductInput> for NewProduct {
    fn from(input: RegisterProductInput) -> Self {
        NewProduct {
            name: input.name,
            description: input.description,
            price: input.price,
        }
    }
}

/// Collect `ids` from `?ids=1&ids=2` and `?ids=1,2` (or a mix).
fn ids_from_query(pairs: Vec<(String, String)>) -> ListProductsFilter {
    let ids = pairs
        .into_iter()
        .filter(|(key, _)| key == "ids")
        .flat_map(|(_, value)| {
            value
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        });
    ListProductsFilter::by_ids(ids)
}

/// Create the products router
pub fn router<R: ProductRepository + 'static>(service: ProductService<R>) -> Router {
    Router::new()
        .route("/", get(list_products).post(register_product))
        .route("/{id}", get(get_product))
        .with_state(service)
}

/// List products, optionally restricted to a set of ids
#[utoipa::path(
    get,
    path = "",
    tag = "Products",
    params(
        ("ids" = Option<Vec<String>>, Query, description = "Ids to return, repeated or comma-separated")
    ),
    responses(
        (status = 200, description = "Matching products", body = ProductPage),
        (status = 500, description = "Internal error", body = ErrorResponse)
    )
)]
async fn list_products<R: ProductRepository>(
    State(service): State<ProductService<R>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ProductResult<Json<ProductPage>> {
    let products = service.list_products(ids_from_query(pairs)).await?;
    Ok(Json(products.into()))
}

/// Get a product by id
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product id")
    ),
    responses(
        (status = 200, description = "Product found", body = ProductView),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    )
)]
async fn get_product<R: ProductRepository>(
    State(service): State<ProductService<R>>,
    Path(id): Path<String>,
) -> ProductResult<Json<ProductView>> {
    let id = ProductId::from(id);
    let product = service
        .list_products(ListProductsFilter::by_ids([id.clone()]))
        .await?
        .into_iter()
        .next()
        .ok_or(ProductError::NotFound(id))?;

    Ok(Json(product.into()))
}

/// Register a new product
#[utoipa::path(
    post,
    path = "",
    tag = "Products",
    request_body = RegisterProductInput,
    responses(
        (status = 201, description = "Product registered", body = ProductView),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Store is full", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    )
)]
async fn register_product<R: ProductRepository>(
    State(service): State<ProductService<R>>,
    ValidatedJson(input): ValidatedJson<RegisterProductInput>,
) -> ProductResult<impl IntoResponse> {
    let product = service.register_product(input.into()).await?;
    Ok((StatusCode::CREATED, Json(ProductView::from(product))))
}
