//! Client for the external payment processor.
//!
//! This service never speaks the payment protocol itself; it asks the
//! processor for a payment intent and hands the resulting client secret back
//! to the storefront.

use anyhow::Context;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::PaymentProcessorConfig;
use crate::error::AppError;

#[derive(Serialize)]
struct CreateIntentRequest<'a> {
    amount: Decimal,
    currency: &'a str,
}

#[derive(Deserialize)]
struct CreateIntentResponse {
    client_secret: String,
}

pub async fn create_payment_intent(
    client: &Client,
    processor: &PaymentProcessorConfig,
    amount: Decimal,
) -> Result<String, AppError> {
    let response = client
        .post(format!("{}/v1/payment_intents", processor.base_url))
        .bearer_auth(&processor.secret_key)
        .json(&CreateIntentRequest {
            amount,
            currency: "zar",
        })
        .send()
        .await
        .map_err(|_| AppError::ServiceUnreachable("Payment processor is unreachable".to_string()))?;

    let response = response
        .error_for_status()
        .map_err(|err| AppError::ServiceUnreachable(format!("Payment processor error: {err}")))?;

    let body: CreateIntentResponse = response
        .json()
        .await
        .context("Failed to parse the payment processor response")?;

    Ok(body.client_secret)
}
