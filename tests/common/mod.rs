//! In-memory stand-ins for the external systems, shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use storefront::domain::aggregates::{
    Category, InstallmentCharge, InstallmentPlan, Order, Product, RecordedCharge,
};
use storefront::domain::events::DomainEvent;
use storefront::error::{Result, StorefrontError};
use storefront::ports::{
    ContentStore, CreatedSession, EventPublisher, InstallmentStore, PaymentGateway, ProductPage, ProductQuery,
    SessionRequest,
};

pub fn product(id: &str, price: &str, stock: u32) -> Product {
    Product {
        id: id.to_string(),
        name: format!("Product {}", id),
        slug: id.to_string(),
        description: None,
        price: price.parse::<Decimal>().expect("price literal"),
        discount: None,
        stock,
        status: None,
        variant: None,
        images: vec![format!("https://cdn.test/{}.png", id)],
        categories: vec!["gadgets".into()],
    }
}

#[derive(Default)]
pub struct MemoryContent {
    pub products: Mutex<Vec<Product>>,
    pub orders: Mutex<Vec<Order>>,
    pub stock_decrements: Mutex<Vec<(String, u32)>>,
    pub fail_installment_patch: Mutex<bool>,
}

impl MemoryContent {
    pub fn with_products(products: Vec<Product>) -> Arc<Self> {
        Arc::new(Self { products: Mutex::new(products), ..Default::default() })
    }

    pub fn order(&self, order_number: &str) -> Option<Order> {
        self.orders.lock().unwrap().iter().find(|o| o.order_number().as_str() == order_number).cloned()
    }

    pub fn stock_of(&self, product_id: &str) -> Option<u32> {
        self.products.lock().unwrap().iter().find(|p| p.id == product_id).map(|p| p.stock)
    }
}

#[async_trait]
impl ContentStore for MemoryContent {
    async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage> {
        let products = self.products.lock().unwrap();
        let matching: Vec<Product> = products.iter()
            .filter(|p| query.category.as_ref().map_or(true, |c| p.categories.contains(c)))
            .filter(|p| query.search.as_ref().map_or(true, |s| p.name.to_lowercase().contains(&s.to_lowercase())))
            .filter(|p| query.status.map_or(true, |s| p.status == Some(s)))
            .cloned()
            .collect();
        let total = matching.len() as u64;
        let page = matching.into_iter().skip(query.offset as usize).take(query.limit as usize).collect();
        Ok(ProductPage { products: page, total })
    }

    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>> {
        Ok(self.products.lock().unwrap().iter().find(|p| p.slug == slug).cloned())
    }

    async fn products_by_ids(&self, ids: &[String]) -> Result<Vec<Product>> {
        Ok(self.products.lock().unwrap().iter().filter(|p| ids.contains(&p.id)).cloned().collect())
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        Ok(vec![Category {
            id: "cat-gadgets".into(),
            title: "Gadgets".into(),
            slug: "gadgets".into(),
            description: None,
            product_count: self.products.lock().unwrap().len() as u32,
        }])
    }

    async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>> {
        Ok(self.orders.lock().unwrap().iter().filter(|o| o.user_id() == user_id).cloned().collect())
    }

    async fn order_by_session(&self, session_id: &str) -> Result<Option<Order>> {
        Ok(self.orders.lock().unwrap().iter().find(|o| o.checkout_session_id() == session_id).cloned())
    }

    async fn order_by_number(&self, order_number: &str) -> Result<Option<Order>> {
        Ok(self.order(order_number))
    }

    async fn create_order(&self, order: &Order) -> Result<()> {
        let mut orders = self.orders.lock().unwrap();
        if !orders.iter().any(|o| o.order_number() == order.order_number()) {
            orders.push(order.clone());
        }
        Ok(())
    }

    async fn mark_order_paid(&self, order_number: &str) -> Result<()> {
        let mut orders = self.orders.lock().unwrap();
        let order = orders.iter_mut().find(|o| o.order_number().as_str() == order_number)
            .ok_or_else(|| StorefrontError::NotFound(format!("Order {}", order_number)))?;
        order.mark_paid();
        Ok(())
    }

    async fn update_installments_paid(&self, order_number: &str, paid: u32) -> Result<()> {
        if *self.fail_installment_patch.lock().unwrap() {
            return Err(StorefrontError::Upstream("content backend unavailable".into()));
        }
        let mut orders = self.orders.lock().unwrap();
        let order = orders.iter_mut().find(|o| o.order_number().as_str() == order_number)
            .ok_or_else(|| StorefrontError::NotFound(format!("Order {}", order_number)))?;
        order.record_installment(paid)?;
        Ok(())
    }

    async fn decrement_stock(&self, product_id: &str, quantity: u32) -> Result<()> {
        self.stock_decrements.lock().unwrap().push((product_id.to_string(), quantity));
        if let Some(p) = self.products.lock().unwrap().iter_mut().find(|p| p.id == product_id) {
            p.stock = p.stock.saturating_sub(quantity);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryPayments {
    pub sessions: Mutex<Vec<SessionRequest>>,
    pub cancelled: Mutex<Vec<String>>,
    pub fail_cancel: Mutex<bool>,
}

impl MemoryPayments {
    pub fn last_session(&self) -> SessionRequest {
        self.sessions.lock().unwrap().last().cloned().expect("a checkout session was created")
    }
}

#[async_trait]
impl PaymentGateway for MemoryPayments {
    async fn create_checkout_session(&self, request: &SessionRequest) -> Result<CreatedSession> {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.push(request.clone());
        let id = format!("cs_test_{}", sessions.len());
        Ok(CreatedSession { url: format!("https://pay.test/{}", id), id })
    }

    async fn cancel_subscription(&self, subscription_id: &str) -> Result<()> {
        if *self.fail_cancel.lock().unwrap() {
            return Err(StorefrontError::Upstream("payment provider unavailable".into()));
        }
        self.cancelled.lock().unwrap().push(subscription_id.to_string());
        Ok(())
    }
}

/// Mirrors the PostgreSQL store: one plan row per subscription, charges deduped by invoice id.
#[derive(Default)]
pub struct MemoryInstallments {
    pub plans: Mutex<HashMap<String, InstallmentPlan>>,
    pub invoices: Mutex<HashSet<String>>,
}

#[async_trait]
impl InstallmentStore for MemoryInstallments {
    async fn record_charge(&self, charge: &InstallmentCharge) -> Result<RecordedCharge> {
        let mut plans = self.plans.lock().unwrap();
        let plan = plans.entry(charge.subscription_id.clone()).or_insert_with(|| {
            InstallmentPlan::open(&charge.subscription_id, &charge.order_number, charge.total_installments)
        });
        let newly_recorded = self.invoices.lock().unwrap().insert(charge.invoice_id.clone());
        if newly_recorded {
            plan.apply_charge();
        }
        Ok(RecordedCharge { plan: plan.clone(), newly_recorded })
    }

    async fn find(&self, subscription_id: &str) -> Result<Option<InstallmentPlan>> {
        Ok(self.plans.lock().unwrap().get(subscription_id).cloned())
    }

    async fn save_status(&self, plan: &InstallmentPlan) -> Result<()> {
        if let Some(stored) = self.plans.lock().unwrap().get_mut(&plan.subscription_id) {
            stored.status = plan.status;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryEvents {
    pub subjects: Mutex<Vec<String>>,
}

impl MemoryEvents {
    pub fn count(&self, subject: &str) -> usize {
        self.subjects.lock().unwrap().iter().filter(|s| s.as_str() == subject).count()
    }
}

#[async_trait]
impl EventPublisher for MemoryEvents {
    async fn publish(&self, event: &DomainEvent) -> Result<()> {
        self.subjects.lock().unwrap().push(event.subject().to_string());
        Ok(())
    }
}

pub struct Harness {
    pub content: Arc<MemoryContent>,
    pub payments: Arc<MemoryPayments>,
    pub installments: Arc<MemoryInstallments>,
    pub events: Arc<MemoryEvents>,
}

impl Harness {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            content: MemoryContent::with_products(products),
            payments: Arc::new(MemoryPayments::default()),
            installments: Arc::new(MemoryInstallments::default()),
            events: Arc::new(MemoryEvents::default()),
        }
    }
}
