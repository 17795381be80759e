use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::error::{AppError, StdResponse};
use crate::middleware::Identity;
use crate::models::{CartLineEntity, ProductEntity};
use crate::state::AppState;

/// Defines routes with OpenAPI specs. Guest requests operate on the
/// process-local cart; identified requests operate on the durable store.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/api/cart",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_cart))
            .routes(utoipa_axum::routes!(add_to_cart))
            .routes(utoipa_axum::routes!(clear_cart))
            .routes(utoipa_axum::routes!(update_cart_line))
            .routes(utoipa_axum::routes!(remove_cart_line)),
    )
}

fn default_quantity() -> i32 {
    1
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct AddToCartReq {
    product_id: Uuid,
    #[serde(default = "default_quantity")]
    quantity: i32,
}

#[derive(Deserialize, ToSchema)]
struct UpdateCartLineReq {
    quantity: i32,
}

#[derive(Serialize, ToSchema)]
struct CartLineRes {
    #[serde(flatten)]
    line: CartLineEntity,
    product: ProductEntity,
}

/// Fetch the caller's cart, each line joined with its product.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Cart"],
    responses(
        (status = 200, description = "List cart lines", body = StdResponse<Vec<CartLineRes>, String>),
        (status = 404, description = "A line references a product that no longer exists")
    )
)]
async fn get_cart(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let lines = if identity.is_guest() {
        state.guest_cart.lines()
    } else {
        state.store.cart_lines(&identity.0).await?
    };

    let mut resolved = Vec::with_capacity(lines.len());
    for line in lines {
        let product = state
            .store
            .get_product(line.product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
        resolved.push(CartLineRes { line, product });
    }

    Ok(StdResponse {
        data: Some(resolved),
        message: Some("Get cart successfully"),
    })
}

/// Add a product to the cart, merging with an existing line for the same
/// product.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Cart"],
    request_body = AddToCartReq,
    responses(
        (status = 201, description = "Added to cart", body = StdResponse<CartLineEntity, String>),
        (status = 400, description = "Quantity below one"),
        (status = 404, description = "Product not found")
    )
)]
async fn add_to_cart(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<AddToCartReq>,
) -> Result<impl IntoResponse, AppError> {
    if body.quantity < 1 {
        return Err(AppError::BadRequest(
            "Quantity must be at least 1".to_string(),
        ));
    }

    // Resolve the product up front so a bad id cannot create an orphaned
    // line that only fails once the cart is listed.
    state
        .store
        .get_product(body.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

    let line = if identity.is_guest() {
        state.guest_cart.add(body.product_id, body.quantity)
    } else {
        state
            .store
            .add_cart_line(&identity.0, body.product_id, body.quantity)
            .await?
    };

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(line),
            message: Some("Added to cart successfully"),
        },
    ))
}

/// Set a cart line's quantity directly.
#[utoipa::path(
    put,
    path = "/{id}",
    tags = ["Cart"],
    params(
        ("id" = Uuid, Path, description = "Cart line ID to update")
    ),
    request_body = UpdateCartLineReq,
    responses(
        (status = 200, description = "Updated cart line", body = StdResponse<CartLineEntity, String>),
        (status = 400, description = "Quantity below one"),
        (status = 404, description = "Cart line not found")
    )
)]
async fn update_cart_line(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<UpdateCartLineReq>,
) -> Result<impl IntoResponse, AppError> {
    if body.quantity < 1 {
        return Err(AppError::BadRequest(
            "Quantity must be at least 1".to_string(),
        ));
    }

    // Guest lines first; ids are uuids so the namespaces cannot collide.
    if let Some(line) = state.guest_cart.set_quantity(id, body.quantity) {
        return Ok(StdResponse {
            data: Some(line),
            message: Some("Updated cart line successfully"),
        });
    }

    let line = state
        .store
        .set_cart_quantity(id, body.quantity)
        .await
        .map_err(|err| AppError::from_store(err, "Cart line"))?;

    Ok(StdResponse {
        data: Some(line),
        message: Some("Updated cart line successfully"),
    })
}

/// Remove a single cart line; removing an unknown line is a no-op.
#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Cart"],
    params(
        ("id" = Uuid, Path, description = "Cart line ID to remove")
    ),
    responses(
        (status = 204, description = "Removed cart line")
    )
)]
async fn remove_cart_line(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    if !state.guest_cart.remove(id) {
        state.store.remove_cart_line(id).await?;
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Clear the caller's whole cart.
#[utoipa::path(
    delete,
    path = "/",
    tags = ["Cart"],
    responses(
        (status = 204, description = "Cleared cart")
    )
)]
async fn clear_cart(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    if identity.is_guest() {
        state.guest_cart.clear();
    } else {
        state.store.clear_cart(&identity.0).await?;
    }

    Ok(StatusCode::NO_CONTENT)
}
