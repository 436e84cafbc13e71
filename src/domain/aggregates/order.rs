//! Order Aggregate
//!
//! Orders are written to the content backend once the payment provider
//! confirms a checkout, so the serialized form doubles as the document shape.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::{Money, OrderNumber};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    order_number: OrderNumber,
    #[serde(rename = "stripeCheckoutSessionId")]
    checkout_session_id: String,
    #[serde(rename = "stripeCustomerId", default)]
    customer_id: Option<String>,
    #[serde(rename = "clerkUserId")]
    user_id: String,
    customer_name: String,
    email: String,
    #[serde(rename = "stripePaymentIntentId", default)]
    payment_intent_id: Option<String>,
    #[serde(rename = "stripeSubscriptionId", default)]
    subscription_id: Option<String>,
    products: Vec<OrderLine>,
    total_price: Decimal,
    currency: String,
    #[serde(default)]
    amount_discount: Decimal,
    #[serde(default)]
    address: Option<Address>,
    status: OrderStatus,
    payment_plan: PaymentPlan,
    order_date: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine { pub product_id: String, pub quantity: u32 }

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Address {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 1, max = 200))]
    pub street1: String,
    #[validate(length(max = 200))]
    pub street2: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(max = 100))]
    pub state: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub zip: String,
    #[validate(length(min = 2, max = 2))]
    pub country: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus { #[default] Pending, Paid, Shipped, Delivered, Cancelled }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PaymentPlan {
    #[default]
    OneOff,
    Installments { total: u32, paid: u32 },
}

/// Everything known about an order at the moment the provider confirms checkout.
#[derive(Clone, Debug)]
pub struct OrderDraft {
    pub order_number: OrderNumber,
    pub checkout_session_id: String,
    pub customer_id: Option<String>,
    pub user_id: String,
    pub customer_name: String,
    pub email: String,
    pub payment_intent_id: Option<String>,
    pub subscription_id: Option<String>,
    pub products: Vec<OrderLine>,
    pub total: Money,
    pub amount_discount: Decimal,
    pub address: Option<Address>,
    pub installments: Option<u32>,
    pub paid: bool,
}

impl Order {
    pub fn place(draft: OrderDraft) -> Result<Self, OrderError> {
        if draft.products.is_empty() { return Err(OrderError::NoItems); }
        let payment_plan = match draft.installments {
            Some(total) if total > 1 => PaymentPlan::Installments { total, paid: 0 },
            _ => PaymentPlan::OneOff,
        };
        let status = if draft.paid { OrderStatus::Paid } else { OrderStatus::Pending };
        let mut order = Self {
            order_number: draft.order_number, checkout_session_id: draft.checkout_session_id,
            customer_id: draft.customer_id, user_id: draft.user_id, customer_name: draft.customer_name,
            email: draft.email, payment_intent_id: draft.payment_intent_id, subscription_id: draft.subscription_id,
            products: draft.products, total_price: draft.total.amount(), currency: draft.total.currency().to_string(),
            amount_discount: draft.amount_discount, address: draft.address, status, payment_plan,
            order_date: Utc::now(), events: vec![],
        };
        order.raise_event(DomainEvent::Order(OrderEvent::Created {
            order_number: order.order_number.to_string(), user_id: order.user_id.clone(),
            total: order.total_price, currency: order.currency.clone(),
        }));
        Ok(order)
    }

    pub fn order_number(&self) -> &OrderNumber { &self.order_number }
    pub fn checkout_session_id(&self) -> &str { &self.checkout_session_id }
    pub fn user_id(&self) -> &str { &self.user_id }
    pub fn email(&self) -> &str { &self.email }
    pub fn subscription_id(&self) -> Option<&str> { self.subscription_id.as_deref() }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn payment_plan(&self) -> PaymentPlan { self.payment_plan }
    pub fn total(&self) -> Money { Money::new(self.total_price, &self.currency) }
    pub fn amount_discount(&self) -> Decimal { self.amount_discount }
    pub fn products(&self) -> &[OrderLine] { &self.products }
    pub fn order_date(&self) -> DateTime<Utc> { self.order_date }
    pub fn contains_product(&self, product_id: &str) -> bool { self.products.iter().any(|l| l.product_id == product_id) }

    pub fn mark_paid(&mut self) { if self.status == OrderStatus::Pending { self.status = OrderStatus::Paid; } }

    pub fn ship(&mut self) -> Result<(), OrderError> {
        if self.status != OrderStatus::Paid { return Err(OrderError::InvalidTransition(self.status, OrderStatus::Shipped)); }
        self.status = OrderStatus::Shipped;
        Ok(())
    }

    pub fn deliver(&mut self) -> Result<(), OrderError> {
        if self.status != OrderStatus::Shipped { return Err(OrderError::InvalidTransition(self.status, OrderStatus::Delivered)); }
        self.status = OrderStatus::Delivered;
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), OrderError> {
        if self.status == OrderStatus::Delivered { return Err(OrderError::CannotCancel); }
        self.status = OrderStatus::Cancelled;
        self.raise_event(DomainEvent::Order(OrderEvent::Cancelled { order_number: self.order_number.to_string() }));
        Ok(())
    }

    /// Records the running count of paid installments. Counts never go backwards.
    pub fn record_installment(&mut self, paid_so_far: u32) -> Result<(), OrderError> {
        match &mut self.payment_plan {
            PaymentPlan::Installments { total, paid } => {
                *paid = (*paid).max(paid_so_far.min(*total));
                self.mark_paid();
                Ok(())
            }
            PaymentPlan::OneOff => Err(OrderError::NotInstallmentPlan),
        }
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}

#[derive(Debug, Clone)] pub enum OrderError { NoItems, CannotCancel, NotInstallmentPlan, InvalidTransition(OrderStatus, OrderStatus) }
impl std::error::Error for OrderError {}
impl std::fmt::Display for OrderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoItems => write!(f, "No items"),
            Self::CannotCancel => write!(f, "Cannot cancel"),
            Self::NotInstallmentPlan => write!(f, "Order is not paid in installments"),
            Self::InvalidTransition(from, to) => write!(f, "Cannot move order from {:?} to {:?}", from, to),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(installments: Option<u32>) -> OrderDraft {
        OrderDraft {
            order_number: OrderNumber::parse("ORD-00001001").unwrap(), checkout_session_id: "cs_test_1".into(),
            customer_id: Some("cus_1".into()), user_id: "user_1".into(), customer_name: "Ada".into(),
            email: "ada@example.com".into(), payment_intent_id: None, subscription_id: None,
            products: vec![OrderLine { product_id: "P1".into(), quantity: 2 }],
            total: Money::from_minor_units(2000, "usd"), amount_discount: Decimal::ZERO, address: None,
            installments, paid: true,
        }
    }

    #[test]
    fn test_order_workflow() {
        let mut order = Order::place(draft(None)).unwrap();
        assert_eq!(order.status(), OrderStatus::Paid);
        assert_eq!(order.take_events().len(), 1);
        order.ship().unwrap();
        order.deliver().unwrap();
        assert!(order.cancel().is_err());
    }

    #[test]
    fn test_installment_count_is_monotonic() {
        let mut order = Order::place(draft(Some(3))).unwrap();
        order.record_installment(2).unwrap();
        order.record_installment(1).unwrap();
        assert_eq!(order.payment_plan(), PaymentPlan::Installments { total: 3, paid: 2 });
        order.record_installment(7).unwrap();
        assert_eq!(order.payment_plan(), PaymentPlan::Installments { total: 3, paid: 3 });
        assert!(Order::place(draft(None)).unwrap().record_installment(1).is_err());
    }

    #[test]
    fn test_document_shape() {
        let order = Order::place(draft(Some(3))).unwrap();
        let doc = serde_json::to_value(&order).unwrap();
        assert_eq!(doc["orderNumber"], "ORD-00001001");
        assert_eq!(doc["stripeCheckoutSessionId"], "cs_test_1");
        assert_eq!(doc["paymentPlan"]["kind"], "installments");
        assert_eq!(doc["products"][0]["productId"], "P1");
        let back: Order = serde_json::from_value(doc).unwrap();
        assert_eq!(back.total().to_minor_units().unwrap(), 2000);
    }
}
