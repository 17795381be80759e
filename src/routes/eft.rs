use anyhow::Context;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::error::{AppError, StdResponse};
use crate::models::{
    CreateOrderEntity, CustomerInfo, OrderEntity, OrderLineInput, OrderStatus,
};
use crate::state::AppState;

/// Defines routes with OpenAPI specs. EFT orders are keyed by the
/// caller-supplied reference, not by the order id.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/api/eft-orders",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_eft_order))
            .routes(utoipa_axum::routes!(list_eft_orders))
            .routes(utoipa_axum::routes!(confirm_payment))
            .routes(utoipa_axum::routes!(update_eft_status)),
    )
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct CreateEftOrderReq {
    order_reference: String,
    customer_info: CustomerInfo,
    items: Vec<OrderLineInput>,
    total_amount: Decimal,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct CreateEftOrderRes {
    order_id: Uuid,
    order_reference: String,
}

/// Create a manual bank-transfer order awaiting payment. EFT orders bypass
/// the cart entirely and never touch stock.
#[utoipa::path(
    post,
    path = "/",
    tags = ["EFT"],
    request_body = CreateEftOrderReq,
    responses(
        (status = 201, description = "EFT order created", body = StdResponse<CreateEftOrderRes, String>),
        (status = 400, description = "Missing order reference")
    )
)]
async fn create_eft_order(
    State(state): State<AppState>,
    Json(body): Json<CreateEftOrderReq>,
) -> Result<impl IntoResponse, AppError> {
    if body.order_reference.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Order reference is required".to_string(),
        ));
    }

    let customer_info =
        serde_json::to_value(&body.customer_info).context("Failed to serialize customer info")?;

    let order = state
        .store
        .create_order(
            CreateOrderEntity {
                user_id: None,
                total: body.total_amount,
                status: OrderStatus::PendingPayment,
                payment_method: Some("EFT".to_string()),
                order_reference: Some(body.order_reference.clone()),
                customer_info: Some(customer_info),
            },
            body.items,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(CreateEftOrderRes {
                order_id: order.id,
                order_reference: body.order_reference,
            }),
            message: Some("Order created successfully. Please complete the EFT payment"),
        },
    ))
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct ConfirmPaymentReq {
    order_reference: String,
}

/// The customer reports having paid: move the order to `payment_submitted`
/// so staff can verify the transfer out of band.
#[utoipa::path(
    post,
    path = "/confirm-payment",
    tags = ["EFT"],
    request_body = ConfirmPaymentReq,
    responses(
        (status = 200, description = "Payment submission recorded", body = StdResponse<OrderEntity, String>),
        (status = 404, description = "No order with that reference")
    )
)]
async fn confirm_payment(
    State(state): State<AppState>,
    Json(body): Json<ConfirmPaymentReq>,
) -> Result<impl IntoResponse, AppError> {
    let order = state
        .store
        .set_order_status_by_reference(&body.order_reference, OrderStatus::PaymentSubmitted)
        .await
        .map_err(|err| AppError::from_store(err, "EFT order"))?;

    Ok(StdResponse {
        data: Some(order),
        message: Some("Payment proof submitted. The order will be verified shortly"),
    })
}

/// Fetch all orders still in the EFT pipeline.
#[utoipa::path(
    get,
    path = "/",
    tags = ["EFT"],
    responses(
        (status = 200, description = "List EFT orders", body = StdResponse<Vec<OrderEntity>, String>)
    )
)]
async fn list_eft_orders(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let orders = state
        .store
        .orders_with_status(&OrderStatus::EFT_VISIBLE)
        .await?;

    Ok(StdResponse {
        data: Some(orders),
        message: Some("Get EFT orders successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct UpdateEftStatusReq {
    status: String,
}

/// Staff transition of an EFT order to any recognized order status.
#[utoipa::path(
    put,
    path = "/{reference}/status",
    tags = ["EFT"],
    params(
        ("reference" = String, Path, description = "Order reference to update")
    ),
    request_body = UpdateEftStatusReq,
    responses(
        (status = 200, description = "Status updated", body = StdResponse<OrderEntity, String>),
        (status = 400, description = "Unknown status literal"),
        (status = 404, description = "No order with that reference")
    )
)]
async fn update_eft_status(
    Path(reference): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<UpdateEftStatusReq>,
) -> Result<impl IntoResponse, AppError> {
    let status: OrderStatus = body.status.parse()?;

    let order = state
        .store
        .set_order_status_by_reference(&reference, status)
        .await
        .map_err(|err| AppError::from_store(err, "EFT order"))?;

    Ok(StdResponse {
        data: Some(order),
        message: Some(format!("Order {reference} status updated to {status}")),
    })
}
