use anyhow::Context;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::error::{AppError, StdResponse};
use crate::models::{CreateSaleEntity, SaleItem};
use crate::state::AppState;

/// Defines routes with OpenAPI specs.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/api/pos/sales",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(record_sale))
            .routes(utoipa_axum::routes!(sales_stats)),
    )
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct RecordSaleReq {
    total: Decimal,
    #[serde(default)]
    customer_name: Option<String>,
    payment_method: String,
    items: Vec<SaleItem>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct RecordSaleRes {
    sale_id: Uuid,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct SalesStatsRes {
    today_total: Decimal,
    today_count: i64,
    average_sale: Decimal,
}

/// Record a point-of-sale transaction and decrement stock per sold line.
///
/// The sale record is committed first; each stock decrement is independent
/// and best-effort, so a missing product never loses the sale or blocks the
/// remaining lines.
#[utoipa::path(
    post,
    path = "/",
    tags = ["POS"],
    request_body = RecordSaleReq,
    responses(
        (status = 201, description = "Sale recorded", body = StdResponse<RecordSaleRes, String>)
    )
)]
async fn record_sale(
    State(state): State<AppState>,
    Json(body): Json<RecordSaleReq>,
) -> Result<impl IntoResponse, AppError> {
    let items = serde_json::to_value(&body.items).context("Failed to serialize sale items")?;

    let sale = state
        .store
        .create_sale(CreateSaleEntity {
            total: body.total,
            customer_name: body.customer_name,
            payment_method: body.payment_method,
            items,
            sold_at: Utc::now(),
        })
        .await?;

    for item in &body.items {
        match state
            .store
            .decrement_stock(item.product_id, item.quantity)
            .await
        {
            Ok(product) => tracing::info!(
                product = %product.name,
                stock = product.stock,
                sold = item.quantity,
                "Updated stock for sold product"
            ),
            Err(err) => tracing::warn!(
                product_id = %item.product_id,
                error = %err,
                "Failed to update stock for sold product; sale kept"
            ),
        }
    }

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(RecordSaleRes { sale_id: sale.id }),
            message: Some("Sale processed successfully and inventory updated"),
        },
    ))
}

/// Today's till summary.
#[utoipa::path(
    get,
    path = "/",
    tags = ["POS"],
    responses(
        (status = 200, description = "Today's sales stats", body = StdResponse<SalesStatsRes, String>)
    )
)]
async fn sales_stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let sales = state.store.sales_today().await?;

    let today_count = sales.len() as i64;
    let today_total: Decimal = sales.iter().map(|sale| sale.total).sum();
    let average_sale = if today_count > 0 {
        (today_total / Decimal::from(today_count)).round_dp(2)
    } else {
        Decimal::ZERO
    };

    Ok(StdResponse {
        data: Some(SalesStatsRes {
            today_total,
            today_count,
            average_sale,
        }),
        message: Some("Get sales stats successfully"),
    })
}
