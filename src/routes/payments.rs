use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::api;
use crate::error::{AppError, StdResponse};
use crate::state::AppState;

/// Defines routes with OpenAPI specs.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(utoipa_axum::routes!(create_payment_intent))
}

#[derive(Deserialize, ToSchema)]
struct CreatePaymentIntentReq {
    amount: Decimal,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct CreatePaymentIntentRes {
    client_secret: String,
}

/// Ask the external payment processor for a payment intent and return the
/// client secret the storefront needs to collect the card payment.
#[utoipa::path(
    post,
    path = "/api/create-payment-intent",
    tags = ["Payments"],
    request_body = CreatePaymentIntentReq,
    responses(
        (status = 200, description = "Payment intent created", body = StdResponse<CreatePaymentIntentRes, String>),
        (status = 500, description = "Processor unreachable or not configured")
    )
)]
async fn create_payment_intent(
    State(state): State<AppState>,
    Json(body): Json<CreatePaymentIntentReq>,
) -> Result<impl IntoResponse, AppError> {
    let Some(processor) = state.config.payment_processor.as_ref() else {
        return Err(AppError::ServiceUnreachable(
            "Payment processing is not available: processor keys not configured".to_string(),
        ));
    };

    let client_secret =
        api::payments::create_payment_intent(&state.http_client, processor, body.amount).await?;

    Ok(StdResponse {
        data: Some(CreatePaymentIntentRes { client_secret }),
        message: Some("Created payment intent successfully"),
    })
}
