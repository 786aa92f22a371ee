//! gRPC adapter for the products service

use domain_products::conversions::list_response;
use domain_products::{
    ListProductsFilter, NewProduct, Product, ProductError, ProductId, ProductRepository,
    ProductService,
};
use grpc_client::{
    GrpcResult, GrpcServer, ServerConfig, ToTonicOption, ToTonicResult, create_health_service,
};
use rpc::products::products_service_server::{ProductsService, ProductsServiceServer, SERVICE_NAME};
use rpc::products::{
    DeleteProductRequest, DeleteProductResponse, ListProductsRequest, ListProductsResponse,
    RegisterProductRequest, RegisterProductResponse, UpdateProductRequest, UpdateProductResponse,
};
use std::future::Future;
use tonic::{Request, Response, Status, transport::Server};
use tracing::{error, info};

/// Serves [`ProductService`] over `products.v1.ProductsService`.
pub struct ProductsGrpcService<R: ProductRepository + 'static> {
    service: ProductService<R>,
}

impl<R: ProductRepository + 'static> ProductsGrpcService<R> {
    pub fn new(service: ProductService<R>) -> Self {
        Self { service }
    }
}

/// `NotFound` keeps its meaning on the wire; anything else is logged and
/// reported as a bare internal error.
fn to_status(err: ProductError) -> Status {
    match err {
        ProductError::NotFound(id) => Status::not_found(format!("product {} not found", id)),
        other => {
            error!(error = %other, "Products RPC failed");
            Status::internal("Internal server error")
        }
    }
}

fn require_id(id: String) -> Result<ProductId, String> {
    if id.is_empty() {
        Err("product id must not be empty".to_string())
    } else {
        Ok(ProductId::from(id))
    }
}

#[tonic::async_trait]
impl<R: ProductRepository + 'static> ProductsService for ProductsGrpcService<R> {
    async fn list(
        &self,
        request: Request<ListProductsRequest>,
    ) -> Result<Response<ListProductsResponse>, Status> {
        let req = request.into_inner();
        info!(ids = ?req.ids, "RPC List");

        let products = self
            .service
            .list_products(ListProductsFilter::from(req))
            .await
            .map_err(to_status)?;

        Ok(Response::new(list_response(products)))
    }

    async fn register(
        &self,
        request: Request<RegisterProductRequest>,
    ) -> Result<Response<RegisterProductResponse>, Status> {
        let req = request.into_inner();
        info!(name = %req.name, price = req.price, "RPC Register");

        let product = self
            .service
            .register_product(NewProduct::from(req))
            .await
            .map_err(to_status)?;

        Ok(Response::new(RegisterProductResponse {
            product: Some(product.into()),
        }))
    }

    async fn update(
        &self,
        request: Request<UpdateProductRequest>,
    ) -> Result<Response<UpdateProductResponse>, Status> {
        let req = request.into_inner();
        info!(product = ?req.product, "RPC Update");

        let product = req.product.ok_or_invalid("product is required")?;
        let product = Product::try_from(product).to_tonic()?;

        let updated = self
            .service
            .update_product(product)
            .await
            .map_err(to_status)?;

        Ok(Response::new(UpdateProductResponse {
            product: Some(updated.into()),
        }))
    }

    async fn delete(
        &self,
        request: Request<DeleteProductRequest>,
    ) -> Result<Response<DeleteProductResponse>, Status> {
        let req = request.into_inner();
        info!(id = %req.id, "RPC Delete");

        let id = require_id(req.id).to_tonic()?;
        self.service.delete_product(&id).await.map_err(to_status)?;

        Ok(Response::new(DeleteProductResponse {}))
    }
}

/// Run the gRPC server (products + health) until `shutdown` completes.
pub async fn serve<R, F>(
    config: ServerConfig,
    service: ProductService<R>,
    shutdown: F,
) -> GrpcResult<()>
where
    R: ProductRepository + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.socket_addr()?;

    let (health_reporter, health_service) = create_health_service();
    GrpcServer::setup_health(&health_reporter, SERVICE_NAME).await;
    GrpcServer::log_startup(&config, SERVICE_NAME);

    let mut products = ProductsServiceServer::new(ProductsGrpcService::new(service))
        .max_decoding_message_size(config.max_decoding_message_size)
        .max_encoding_message_size(config.max_encoding_message_size);
    if let Some(encoding) = config.compression_encoding() {
        products = products.accept_compressed(encoding).send_compressed(encoding);
    }

    Server::builder()
        .add_service(health_service)
        .add_service(products)
        .serve_with_shutdown(addr, async move {
            shutdown.await;
            GrpcServer::mark_not_serving(&health_reporter, &[SERVICE_NAME]).await;
            info!("gRPC server shutting down");
        })
        .await?;

    Ok(())
}
