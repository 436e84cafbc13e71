//! Seams to the external systems the storefront talks to.
//!
//! Adapters in `crate::adapters` implement these against the real services;
//! tests swap in in-memory versions.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::domain::aggregates::{Category, InstallmentCharge, InstallmentPlan, Order, Product, ProductStatus, RecordedCharge};
use crate::domain::events::DomainEvent;
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub status: Option<ProductStatus>,
    pub offset: u32,
    pub limit: u32,
}

#[derive(Debug, Clone)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: u64,
}

/// Headless content backend: catalog and order documents.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage>;
    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>>;
    async fn products_by_ids(&self, ids: &[String]) -> Result<Vec<Product>>;
    async fn categories(&self) -> Result<Vec<Category>>;
    async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>>;
    async fn order_by_session(&self, session_id: &str) -> Result<Option<Order>>;
    async fn order_by_number(&self, order_number: &str) -> Result<Option<Order>>;
    async fn create_order(&self, order: &Order) -> Result<()>;
    async fn mark_order_paid(&self, order_number: &str) -> Result<()>;
    /// `NotFound` when the order document does not exist yet.
    async fn update_installments_paid(&self, order_number: &str, paid: u32) -> Result<()>;
    async fn decrement_stock(&self, product_id: &str, quantity: u32) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutMode {
    Payment,
    /// Monthly subscription billed `installments` times.
    Installments { installments: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLineItem {
    pub name: String,
    pub image: Option<String>,
    pub unit_amount: i64,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub mode: CheckoutMode,
    pub currency: String,
    pub customer_email: String,
    pub line_items: Vec<SessionLineItem>,
    pub metadata: BTreeMap<String, String>,
    /// Copied onto the subscription so invoices carry it too.
    pub subscription_metadata: BTreeMap<String, String>,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSession {
    pub id: String,
    pub url: String,
}

/// Payment processor API.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(&self, request: &SessionRequest) -> Result<CreatedSession>;
    async fn cancel_subscription(&self, subscription_id: &str) -> Result<()>;
}

/// Bookkeeping for installment subscriptions.
#[async_trait]
pub trait InstallmentStore: Send + Sync {
    /// Counts `charge` once per invoice id, opening the plan if it is not known
    /// yet.
    async fn record_charge(&self, charge: &InstallmentCharge) -> Result<RecordedCharge>;
    async fn find(&self, subscription_id: &str) -> Result<Option<InstallmentPlan>>;
    async fn save_status(&self, plan: &InstallmentPlan) -> Result<()>;
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &DomainEvent) -> Result<()>;
}
