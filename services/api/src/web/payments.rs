//! services/api/src/web/payments.rs
//!
//! Checkout flow: open a payment intent with the processor, then record the
//! completed payment. A recorded payment for a session unlocks its materials.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::info;
use tutoring_core::domain::{NewPayment, VerifiedIdentity};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::web::extract::ValidJson;
use crate::web::state::AppState;
use crate::web::types::{
    required, PaymentCheckResponse, PaymentIntentRequest, PaymentIntentResponse, PaymentResponse,
    StorePaymentRequest,
};

/// Converts a major-unit amount to the processor's minor units (cents).
fn to_minor_units(amount: f64) -> ApiResult<i64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ApiError::validation("amount must be a positive number"));
    }
    let minor = (amount * 100.0).round();
    if minor < 1.0 || minor > i64::MAX as f64 {
        return Err(ApiError::validation("amount is out of range"));
    }
    Ok(minor as i64)
}

/// POST /payments/create-payment-intent - Open a card payment intent
#[utoipa::path(
    post,
    path = "/payments/create-payment-intent",
    request_body = PaymentIntentRequest,
    responses(
        (status = 200, description = "Intent created", body = PaymentIntentResponse),
        (status = 400, description = "Amount missing or not positive"),
        (status = 500, description = "Payment processor failure")
    )
)]
pub async fn create_payment_intent_handler(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<PaymentIntentRequest>,
) -> ApiResult<Json<PaymentIntentResponse>> {
    let amount_minor = to_minor_units(req.amount)?;
    let intent = state
        .payments
        .create_payment_intent(amount_minor, &state.config.payment_currency)
        .await?;

    info!("Payment intent {} opened for {} minor units", intent.id, amount_minor);
    Ok(Json(PaymentIntentResponse {
        client_secret: intent.client_secret,
    }))
}

/// POST /payments/store-payment - Record a completed payment for the caller
///
/// The payer is always the verified caller.
#[utoipa::path(
    post,
    path = "/payments/store-payment",
    request_body = StorePaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = PaymentResponse),
        (status = 400, description = "Transaction id missing or amount invalid"),
        (status = 401, description = "Missing or invalid credential"),
        (status = 404, description = "Session not found")
    )
)]
pub async fn store_payment_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    ValidJson(req): ValidJson<StorePaymentRequest>,
) -> ApiResult<(StatusCode, Json<PaymentResponse>)> {
    let transaction_id = required(req.transaction_id, "transaction_id")?;
    to_minor_units(req.amount)?;
    if let Some(session_id) = req.session_id {
        state.db.get_session(session_id).await?;
    }

    let payment = state
        .db
        .create_payment(NewPayment {
            email: identity.email,
            amount: req.amount,
            transaction_id,
            session_id: req.session_id,
        })
        .await?;

    info!("Payment {} stored for {}", payment.transaction_id, payment.email);
    Ok((StatusCode::CREATED, Json(payment.into())))
}

/// GET /payments/user/{email} - Payment history of the caller
#[utoipa::path(
    get,
    path = "/payments/user/{email}",
    params(("email" = String, Path, description = "Payer email; must be the caller")),
    responses(
        (status = 200, description = "The caller's payments", body = [PaymentResponse]),
        (status = 403, description = "Another user's email")
    )
)]
pub async fn user_payments_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<VerifiedIdentity>,
) -> ApiResult<Json<Vec<PaymentResponse>>> {
    let payments = state.db.list_payments_by_email(&identity.email).await?;
    Ok(Json(payments.into_iter().map(Into::into).collect()))
}

/// GET /payments/check/{session_id} - Whether the caller has paid for a session
#[utoipa::path(
    get,
    path = "/payments/check/{session_id}",
    params(("session_id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Payment state", body = PaymentCheckResponse),
        (status = 401, description = "Missing or invalid credential")
    )
)]
pub async fn check_payment_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<PaymentCheckResponse>> {
    let paid = state.db.has_payment(&identity.email, session_id).await?;
    Ok(Json(PaymentCheckResponse { session_id, paid }))
}
