//! services/api/src/adapters/stripe.rs
//!
//! This module contains the adapter for the Stripe payment processor.
//! It implements the `PaymentProcessor` port from the `core` crate.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{error, info};
use tutoring_core::domain::PaymentIntent;
use tutoring_core::ports::{PaymentProcessor, PortError, PortResult};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

#[derive(Deserialize)]
struct StripePaymentIntent {
    id: String,
    client_secret: String,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `PaymentProcessor` port using the Stripe REST API.
#[derive(Clone)]
pub struct StripePaymentAdapter {
    client: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl StripePaymentAdapter {
    /// Creates a new `StripePaymentAdapter`.
    pub fn new(client: reqwest::Client, secret_key: String) -> Self {
        Self {
            client,
            secret_key,
            api_base: STRIPE_API_BASE.to_string(),
        }
    }
}

//=========================================================================================
// `PaymentProcessor` Trait Implementation
//=========================================================================================

#[async_trait]
impl PaymentProcessor for StripePaymentAdapter {
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> PortResult<PaymentIntent> {
        let amount = amount_minor.to_string();
        let form = [
            ("amount", amount.as_str()),
            ("currency", currency),
            ("payment_method_types[]", "card"),
        ];

        let response = self
            .client
            .post(format!("{}/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("Stripe request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Stripe rejected payment intent ({}): {}", status, body);
            return Err(PortError::Unexpected(format!(
                "Stripe returned status {}",
                status
            )));
        }

        let intent: StripePaymentIntent = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Invalid Stripe response: {}", e)))?;
        info!("Created payment intent {}", intent.id);

        Ok(PaymentIntent {
            id: intent.id,
            client_secret: intent.client_secret,
        })
    }
}
