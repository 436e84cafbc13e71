//! Payment provider REST client (form-encoded requests, JSON responses).

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::PaymentConfig;
use crate::error::{Result, StorefrontError};
use crate::ports::{CheckoutMode, CreatedSession, PaymentGateway, SessionRequest};

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ProviderError,
}

#[derive(Deserialize)]
struct ProviderError {
    message: Option<String>,
    code: Option<String>,
}

#[derive(Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
}

#[derive(Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    api_url: String,
    secret_key: String,
}

impl StripeGateway {
    pub fn new(client: reqwest::Client, config: &PaymentConfig) -> Self {
        Self { client, api_url: config.api_url.clone(), secret_key: config.secret_key.clone() }
    }

    async fn error_from(resp: reqwest::Response) -> StorefrontError {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorEnvelope>(&text)
            .ok()
            .map(|e| format!("{} ({})", e.error.message.unwrap_or_default(), e.error.code.unwrap_or_default()))
            .unwrap_or(text);
        StorefrontError::Upstream(format!("payment provider returned {}: {}", status, detail))
    }
}

/// Flattens a session request into the provider's bracketed form keys.
pub fn session_form(req: &SessionRequest) -> Vec<(String, String)> {
    let mut form: Vec<(String, String)> = vec![
        ("success_url".into(), req.success_url.clone()),
        ("cancel_url".into(), req.cancel_url.clone()),
        ("customer_email".into(), req.customer_email.clone()),
        ("allow_promotion_codes".into(), "true".into()),
    ];
    match req.mode {
        CheckoutMode::Payment => {
            form.push(("mode".into(), "payment".into()));
            form.push(("customer_creation".into(), "always".into()));
        }
        CheckoutMode::Installments { .. } => form.push(("mode".into(), "subscription".into())),
    }
    for (k, v) in &req.metadata {
        form.push((format!("metadata[{}]", k), v.clone()));
    }
    for (k, v) in &req.subscription_metadata {
        form.push((format!("subscription_data[metadata][{}]", k), v.clone()));
    }
    for (i, item) in req.line_items.iter().enumerate() {
        let key = |rest: &str| format!("line_items[{}]{}", i, rest);
        form.push((key("[price_data][currency]"), req.currency.clone()));
        form.push((key("[price_data][unit_amount]"), item.unit_amount.to_string()));
        form.push((key("[price_data][product_data][name]"), item.name.clone()));
        if let Some(image) = &item.image {
            form.push((key("[price_data][product_data][images][0]"), image.clone()));
        }
        if let CheckoutMode::Installments { .. } = req.mode {
            form.push((key("[price_data][recurring][interval]"), "month".into()));
        }
        form.push((key("[quantity]"), item.quantity.to_string()));
    }
    form
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(&self, request: &SessionRequest) -> Result<CreatedSession> {
        let resp = self.client
            .post(format!("{}/v1/checkout/sessions", self.api_url))
            .bearer_auth(&self.secret_key)
            .form(&session_form(request))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }
        let session: SessionResponse = resp.json().await?;
        let url = session.url
            .ok_or_else(|| StorefrontError::Upstream(format!("session {} has no redirect url", session.id)))?;
        Ok(CreatedSession { id: session.id, url })
    }

    async fn cancel_subscription(&self, subscription_id: &str) -> Result<()> {
        let resp = self.client
            .delete(format!("{}/v1/subscriptions/{}", self.api_url, subscription_id))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;
        match resp.status() {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                tracing::info!(subscription_id, "subscription already gone at provider");
                Ok(())
            }
            _ => Err(Self::error_from(resp).await),
        }
    }
}
