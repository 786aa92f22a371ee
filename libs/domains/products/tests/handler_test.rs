//! Handler tests for the products query gateway
//!
//! Each test drives the router with `oneshot()` over an in-memory store and
//! checks status codes and response bodies.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain_products::handlers::{self, ProductPage, ProductView};
use domain_products::*;
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn service(capacity: usize) -> ProductService<InMemoryProductRepository> {
    ProductService::new(InMemoryProductRepository::new(capacity).unwrap())
}

fn post_json(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_register_returns_201_with_view() {
    let app = handlers::router(service(10));

    let response = app
        .oneshot(post_json(json!({"name": "Iphone 12", "price": 4500})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let view: ProductView = json_body(response.into_body()).await;
    assert_eq!(view.id.as_str(), "1");
    assert_eq!(view.name, "Iphone 12");
    assert_eq!(view.display_price, "4500");
}

#[tokio::test]
async fn test_register_validates_name() {
    let app = handlers::router(service(10));

    let response = app
        .oneshot(post_json(json!({"name": "", "price": 1})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_when_full_is_conflict() {
    let service = service(1);
    service
        .register_product(NewProduct::new("first", "", 1))
        .await
        .unwrap();
    let app = handlers::router(service);

    let response = app
        .oneshot(post_json(json!({"name": "second", "price": 2})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_goes_through_the_shared_service() {
    let service = service(10);
    let app = handlers::router(service.clone());

    app.oneshot(post_json(json!({"name": "Pen", "price": 3})))
        .await
        .unwrap();

    let stored = service.list_products(ListProductsFilter::all()).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "Pen");
}

#[tokio::test]
async fn test_list_filters_by_ids() {
    let service = service(10);
    for name in ["a", "b", "c"] {
        service
            .register_product(NewProduct::new(name, "", 1))
            .await
            .unwrap();
    }
    let app = handlers::router(service);

    let response = app.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page: ProductPage = json_body(response.into_body()).await;
    assert_eq!(page.total, 3);

    let response = app.oneshot(get("/?ids=1,3&ids=404")).await.unwrap();
    let page: ProductPage = json_body(response.into_body()).await;
    let mut ids: Vec<&str> = page.items.iter().map(|p| p.id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["1", "3"]);
    assert_eq!(page.total, 2);
}

#[tokio::test]
async fn test_get_product_found_and_missing() {
    let service = service(10);
    service
        .register_product(NewProduct::new("Pen", "blue", 3))
        .await
        .unwrap();
    let app = handlers::router(service);

    let response = app.clone().oneshot(get("/1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let view: ProductView = json_body(response.into_body()).await;
    assert_eq!(view.description, "blue");

    let response = app.oneshot(get("/99")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = json_body(response.into_body()).await;
    assert_eq!(body["error"], "NOT_FOUND");
}
