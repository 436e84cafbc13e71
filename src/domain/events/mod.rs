//! Domain events
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DomainEvent {
    Order(OrderEvent),
    Installment(InstallmentEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Created { order_number: String, user_id: String, total: Decimal, currency: String },
    Cancelled { order_number: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InstallmentEvent {
    Charged { subscription_id: String, order_number: String, paid: u32, total: u32 },
    Completed { subscription_id: String, order_number: String },
    Cancelled { subscription_id: String, order_number: String },
}

impl DomainEvent {
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Order(OrderEvent::Created { .. }) => "storefront.order.created",
            Self::Order(OrderEvent::Cancelled { .. }) => "storefront.order.cancelled",
            Self::Installment(InstallmentEvent::Charged { .. }) => "storefront.installment.charged",
            Self::Installment(InstallmentEvent::Completed { .. }) => "storefront.installment.completed",
            Self::Installment(InstallmentEvent::Cancelled { .. }) => "storefront.installment.cancelled",
        }
    }
}
