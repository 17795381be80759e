use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::error::{AppError, StdResponse};
use crate::models::{CreateProductEntity, ProductEntity, UpdateProductEntity};
use crate::state::AppState;

/// Defines routes with OpenAPI specs.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/api/products",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(list_products))
            .routes(utoipa_axum::routes!(create_product))
            .routes(utoipa_axum::routes!(clear_products))
            .routes(utoipa_axum::routes!(get_product))
            .routes(utoipa_axum::routes!(update_product))
            .routes(utoipa_axum::routes!(delete_product)),
    )
}

/// Fetch the whole catalog.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Products"],
    responses(
        (status = 200, description = "List all products", body = StdResponse<Vec<ProductEntity>, String>)
    )
)]
async fn list_products(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let products = state.store.list_products().await?;

    Ok(StdResponse {
        data: Some(products),
        message: Some("Get products successfully"),
    })
}

/// Fetch a single product.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Products"],
    params(
        ("id" = Uuid, Path, description = "Product ID to fetch")
    ),
    responses(
        (status = 200, description = "Get product successfully", body = StdResponse<ProductEntity, String>),
        (status = 404, description = "Product not found")
    )
)]
async fn get_product(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let product = state
        .store
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

    Ok(StdResponse {
        data: Some(product),
        message: Some("Get product successfully"),
    })
}

/// Add a product to the catalog.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Products"],
    request_body = CreateProductEntity,
    responses(
        (status = 201, description = "Created product successfully", body = StdResponse<ProductEntity, String>)
    )
)]
async fn create_product(
    State(state): State<AppState>,
    Json(body): Json<CreateProductEntity>,
) -> Result<impl IntoResponse, AppError> {
    let product = state.store.create_product(body).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(product),
            message: Some("Created product successfully"),
        },
    ))
}

/// Partially update a product; used by both admin edits and inventory
/// corrections.
#[utoipa::path(
    patch,
    path = "/{id}",
    tags = ["Products"],
    params(
        ("id" = Uuid, Path, description = "Product ID to update")
    ),
    request_body = UpdateProductEntity,
    responses(
        (status = 200, description = "Updated product successfully", body = StdResponse<ProductEntity, String>),
        (status = 404, description = "Product not found")
    )
)]
async fn update_product(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<UpdateProductEntity>,
) -> Result<impl IntoResponse, AppError> {
    let product = state
        .store
        .update_product(id, body)
        .await
        .map_err(|err| AppError::from_store(err, "Product"))?;

    Ok(StdResponse {
        data: Some(product),
        message: Some("Updated product successfully"),
    })
}

/// Remove a product. Existing cart lines and order lines keep their
/// references and surface the gap on read.
#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Products"],
    params(
        ("id" = Uuid, Path, description = "Product ID to delete")
    ),
    responses(
        (status = 204, description = "Deleted product")
    )
)]
async fn delete_product(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    state.store.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Clear the whole catalog, ahead of a re-seed.
#[utoipa::path(
    delete,
    path = "/",
    tags = ["Products"],
    responses(
        (status = 204, description = "Cleared all products")
    )
)]
async fn clear_products(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    state.store.clear_products().await?;
    Ok(StatusCode::NO_CONTENT)
}
