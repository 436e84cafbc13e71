//! Payment provider webhook envelope and the objects we act on.

use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub created: i64,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Clone)]
pub enum ProviderEvent {
    CheckoutCompleted(CheckoutSessionObject),
    InvoicePaid(InvoiceObject),
    SubscriptionDeleted(SubscriptionObject),
    Other(String),
}

impl WebhookEvent {
    pub fn classify(&self) -> Result<ProviderEvent, serde_json::Error> {
        let object = || self.data.object.clone();
        Ok(match self.kind.as_str() {
            "checkout.session.completed" | "checkout.session.async_payment_succeeded" => {
                ProviderEvent::CheckoutCompleted(serde_json::from_value(object())?)
            }
            "invoice.paid" | "invoice.payment_succeeded" => ProviderEvent::InvoicePaid(serde_json::from_value(object())?),
            "customer.subscription.deleted" => ProviderEvent::SubscriptionDeleted(serde_json::from_value(object())?),
            other => ProviderEvent::Other(other.to_string()),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: String,
    pub mode: Option<String>,
    pub customer: Option<String>,
    pub customer_details: Option<CustomerDetails>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    pub total_details: Option<TotalDetails>,
    pub payment_intent: Option<String>,
    pub subscription: Option<String>,
    pub payment_status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerDetails {
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TotalDetails {
    #[serde(default)]
    pub amount_discount: i64,
}

impl CheckoutSessionObject {
    pub fn is_paid(&self) -> bool {
        matches!(self.payment_status.as_deref(), Some("paid") | Some("no_payment_required"))
    }

    pub fn amount_discount(&self) -> i64 {
        self.total_details.as_ref().map(|t| t.amount_discount).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceObject {
    pub id: String,
    pub subscription: Option<String>,
    #[serde(default)]
    pub amount_paid: i64,
    pub billing_reason: Option<String>,
    pub subscription_details: Option<SubscriptionDetails>,
    pub parent: Option<InvoiceParent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceParent {
    pub subscription_details: Option<SubscriptionDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionDetails {
    pub subscription: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl InvoiceObject {
    fn details(&self) -> Option<&SubscriptionDetails> {
        self.subscription_details.as_ref()
            .or_else(|| self.parent.as_ref().and_then(|p| p.subscription_details.as_ref()))
    }

    /// Older API versions put the id at the top level, newer ones under `parent`.
    pub fn subscription_id(&self) -> Option<&str> {
        self.subscription.as_deref().or_else(|| self.details().and_then(|d| d.subscription.as_deref()))
    }

    pub fn subscription_metadata(&self) -> Option<&BTreeMap<String, String>> {
        self.details().map(|d| &d.metadata)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionObject {
    pub id: String,
    pub status: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}
