use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::checkout::{CheckoutRequest, CheckoutSession};
use crate::db::accounts;
use crate::error::{Result, StorefrontError};
use crate::http::extract::ApiJson;
use crate::http::AppState;
use crate::webhook::{Outcome, WebhookEvent, SIGNATURE_HEADER};

pub async fn create_checkout(
    State(s): State<AppState>,
    user: CurrentUser,
    ApiJson(r): ApiJson<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutSession>)> {
    accounts::upsert_user(&s.db, &user).await?;
    let session = s.checkout.start(&user, r).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    pub outcome: String,
}

/// Provider webhook. Anything other than 2xx makes the provider redeliver,
/// so only failures worth retrying return 5xx.
pub async fn payment_webhook(State(s): State<AppState>, headers: HeaderMap, body: Bytes) -> Result<Json<WebhookAck>> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    s.verifier.verify(signature, &body)?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| StorefrontError::Validation(format!("invalid event payload: {}", e)))?;
    let outcome = s.webhooks.handle(&event).await?;
    Ok(Json(WebhookAck { received: true, outcome: describe(&outcome) }))
}

fn describe(outcome: &Outcome) -> String {
    match outcome {
        Outcome::OrderCreated(n) => format!("order_created:{}", n),
        Outcome::OrderPaid(n) => format!("order_paid:{}", n),
        Outcome::Duplicate(n) => format!("duplicate:{}", n),
        Outcome::InstallmentRecorded { subscription_id, paid, total } => format!("installment_recorded:{}:{}/{}", subscription_id, paid, total),
        Outcome::PlanCompleted(id) => format!("plan_completed:{}", id),
        Outcome::PlanCancelled(id) => format!("plan_cancelled:{}", id),
        Outcome::Ignored(reason) => format!("ignored:{}", reason),
    }
}
