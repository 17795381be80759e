use anyhow::Context;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::error::{AppError, StdResponse};
use crate::middleware::Identity;
use crate::models::{CreateOrderEntity, CustomerInfo, OrderEntity, OrderLineInput, OrderStatus};
use crate::state::AppState;

/// Defines routes with OpenAPI specs.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/api/orders",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(list_orders))
            .routes(utoipa_axum::routes!(create_order)),
    )
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct CreateOrderReq {
    customer_info: CustomerInfo,
    items: Vec<OrderLineInput>,
}

/// Total over the client's line snapshot. The supplied unit prices are
/// trusted as-is; they were captured when the items went into the cart.
pub(crate) fn compute_total(items: &[OrderLineInput]) -> Decimal {
    items
        .iter()
        .map(|item| item.price * Decimal::from(item.quantity))
        .sum()
}

/// Place an order from a cart snapshot: persist the order and its lines in
/// one transaction, then clear the originating cart.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Orders"],
    request_body = CreateOrderReq,
    responses(
        (status = 201, description = "Created order successfully", body = StdResponse<OrderEntity, String>)
    )
)]
async fn create_order(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<CreateOrderReq>,
) -> Result<impl IntoResponse, AppError> {
    let total = compute_total(&body.items);
    let user_id = (!identity.is_guest()).then(|| identity.0.clone());
    let customer_info =
        serde_json::to_value(&body.customer_info).context("Failed to serialize customer info")?;

    let order = state
        .store
        .create_order(
            CreateOrderEntity {
                user_id,
                total,
                status: OrderStatus::Pending,
                payment_method: None,
                order_reference: None,
                customer_info: Some(customer_info),
            },
            body.items,
        )
        .await?;

    if identity.is_guest() {
        state.guest_cart.clear();
    } else {
        state.store.clear_cart(&identity.0).await?;
    }

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(order),
            message: Some("Created order successfully"),
        },
    ))
}

/// Fetch the caller's orders. Guest checkouts persist with no owner, so the
/// guest identity sees the ownerless set.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Orders"],
    responses(
        (status = 200, description = "List orders", body = StdResponse<Vec<OrderEntity>, String>)
    )
)]
async fn list_orders(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = (!identity.is_guest()).then_some(identity.0.as_str());
    let orders = state.store.orders_for(user_id).await?;

    Ok(StdResponse {
        data: Some(orders),
        message: Some("Get orders successfully"),
    })
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn line(price: &str, quantity: i32) -> OrderLineInput {
        OrderLineInput {
            product_id: Uuid::new_v4(),
            quantity,
            price: price.parse().expect("valid decimal"),
        }
    }

    #[test]
    fn total_is_the_exact_sum_of_price_times_quantity() {
        let items = vec![line("10.00", 2), line("5.50", 1)];
        assert_eq!(compute_total(&items).to_string(), "25.50");
    }

    #[test]
    fn total_of_an_empty_snapshot_is_zero() {
        assert_eq!(compute_total(&[]), Decimal::ZERO);
    }
}
