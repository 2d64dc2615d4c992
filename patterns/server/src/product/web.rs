use askama::Template;
use axum::{
    Router,
    extract::{Query, State},
    response::Response,
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::product::{Product, ProductPage, ProductService, ProductServiceError};
use crate::render::{DualRender, PathParam, ResponseMode};
use crate::web::{AppState, ErrorResponse, WebError};

impl From<ProductServiceError> for WebError {
    fn from(err: ProductServiceError) -> Self {
        match err {
            ProductServiceError::ProductNotFound(_) => {
                WebError::NotFound("Product not found".to_string())
            }
            ProductServiceError::Database(err) => WebError::Database(err),
        }
    }
}

/// JSON representation of a Product for API responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductJson {
    id: i32,
    name: String,
    description: String,
    /// Price with two decimals, e.g. "29.99"
    price: String,
    /// Display label of the category
    category: String,
    in_stock: bool,
}

impl From<&Product> for ProductJson {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id(),
            name: product.name().to_string(),
            description: product.description().to_string(),
            price: product.price_display(),
            category: product.category_label().to_string(),
            in_stock: product.in_stock(),
        }
    }
}

/// API response for one page of products.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductPageResponse {
    products: Vec<ProductJson>,
    has_next: bool,
    next_page: Option<u64>,
    total_pages: u64,
}

#[derive(Template)]
#[template(path = "partials/product_list.html")]
struct ProductListTemplate<'a> {
    products: &'a [Product],
    next_page: Option<u64>,
}

#[derive(Template)]
#[template(path = "partials/product_modal.html")]
struct ProductModalTemplate<'a> {
    product: &'a Product,
}

impl DualRender for ProductPage {
    fn payload(&self) -> impl Serialize + '_ {
        ProductPageResponse {
            products: self.products().iter().map(ProductJson::from).collect(),
            has_next: self.has_next(),
            next_page: self.next_page(),
            total_pages: self.total_pages(),
        }
    }

    fn fragment(&self) -> askama::Result<String> {
        ProductListTemplate {
            products: self.products(),
            next_page: self.next_page(),
        }
        .render()
    }
}

impl DualRender for Product {
    fn payload(&self) -> impl Serialize + '_ {
        ProductJson::from(self)
    }

    fn fragment(&self) -> askama::Result<String> {
        ProductModalTemplate { product: self }.render()
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number; invalid values fall back to a valid page
    page: Option<String>,
}

/// Handler for GET /products.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/products",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of products, newest first", body = ProductPageResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn list_products_handler(
    mode: ResponseMode,
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Response {
    let service = ProductService::new(&state.db);
    mode.respond(service.list_products(query.page.as_deref()).await)
}

/// Handler for GET /products/{id}.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product to show")),
    responses(
        (status = 200, description = "Product detail", body = ProductJson),
        (status = 404, description = "Unknown product", body = ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn product_detail_handler(
    mode: ResponseMode,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i32>,
) -> Response {
    let service = ProductService::new(&state.db);
    mode.respond(service.get_product(id).await)
}

/// Creates and returns the product router.
pub fn create_product_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/products", get(list_products_handler))
        .route("/products/{id}", get(product_detail_handler))
        .with_state(state)
}
