//! Turns verified provider events into orders and installment bookkeeping.
//!
//! Every branch is safe to run again for the same event: the provider
//! redelivers anything that did not get a 2xx.

use std::sync::Arc;
use tracing::Instrument;

use crate::checkout::metadata::{CheckoutMetadata, MetadataError};
use crate::domain::aggregates::{InstallmentCharge, Order, OrderDraft, OrderLine, OrderStatus, PlanStatus};
use crate::domain::events::{DomainEvent, InstallmentEvent};
use crate::domain::value_objects::{Money, OrderNumber};
use crate::error::{Result, StorefrontError};
use crate::ports::{ContentStore, EventPublisher, InstallmentStore, PaymentGateway};
use crate::webhook::event::{CheckoutSessionObject, InvoiceObject, ProviderEvent, SubscriptionObject, WebhookEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    OrderCreated(String),
    /// An existing unpaid order was confirmed by a later payment event.
    OrderPaid(String),
    Duplicate(String),
    InstallmentRecorded { subscription_id: String, paid: u32, total: u32 },
    PlanCompleted(String),
    PlanCancelled(String),
    Ignored(String),
}

#[derive(Clone)]
pub struct WebhookProcessor {
    content: Arc<dyn ContentStore>,
    payments: Arc<dyn PaymentGateway>,
    installments: Arc<dyn InstallmentStore>,
    events: Arc<dyn EventPublisher>,
    default_currency: String,
}

impl WebhookProcessor {
    pub fn new(
        content: Arc<dyn ContentStore>,
        payments: Arc<dyn PaymentGateway>,
        installments: Arc<dyn InstallmentStore>,
        events: Arc<dyn EventPublisher>,
        default_currency: impl Into<String>,
    ) -> Self {
        Self { content, payments, installments, events, default_currency: default_currency.into() }
    }

    pub async fn handle(&self, event: &WebhookEvent) -> Result<Outcome> {
        let span = tracing::info_span!("webhook", event_id = %event.id, kind = %event.kind);
        async move {
            let outcome = match event.classify()? {
                ProviderEvent::CheckoutCompleted(session) => self.checkout_completed(&session).await?,
                ProviderEvent::InvoicePaid(invoice) => self.invoice_paid(&invoice).await?,
                ProviderEvent::SubscriptionDeleted(sub) => self.subscription_deleted(&sub).await?,
                ProviderEvent::Other(kind) => Outcome::Ignored(kind),
            };
            tracing::info!(outcome = ?outcome, "webhook processed");
            Ok(outcome)
        }
        .instrument(span)
        .await
    }

    async fn checkout_completed(&self, session: &CheckoutSessionObject) -> Result<Outcome> {
        if let Some(existing) = self.content.order_by_session(&session.id).await? {
            let order_number = existing.order_number().to_string();
            if session.is_paid() && existing.status() == OrderStatus::Pending {
                self.content.mark_order_paid(&order_number).await?;
                tracing::info!(order_number = %order_number, "delayed payment confirmed");
                return Ok(Outcome::OrderPaid(order_number));
            }
            return Ok(Outcome::Duplicate(order_number));
        }

        let meta = CheckoutMetadata::decode(&session.metadata)?;
        let order_number = OrderNumber::parse(&meta.order_number)
            .ok_or_else(|| MetadataError::Malformed("orderNumber".into()))?;
        let currency = session.currency.clone().unwrap_or_else(|| self.default_currency.clone());

        // Installment sessions only report the first month in amount_total.
        let total_minor = match (meta.installments, session.amount_total) {
            (None, Some(amount)) => amount,
            _ => meta.total_minor,
        };
        let details = session.customer_details.as_ref();
        let email = if meta.customer_email.is_empty() {
            details.and_then(|d| d.email.clone()).unwrap_or_default()
        } else {
            meta.customer_email.clone()
        };
        let customer_name = if meta.customer_name.is_empty() {
            details.and_then(|d| d.name.clone()).unwrap_or_default()
        } else {
            meta.customer_name.clone()
        };

        let mut order = Order::place(OrderDraft {
            order_number: order_number.clone(),
            checkout_session_id: session.id.clone(),
            customer_id: session.customer.clone(),
            user_id: meta.user_id.clone(),
            customer_name,
            email,
            payment_intent_id: session.payment_intent.clone(),
            subscription_id: session.subscription.clone(),
            products: meta.items.iter().map(|i| OrderLine { product_id: i.id.clone(), quantity: i.q }).collect(),
            total: Money::from_minor_units(total_minor, &currency),
            amount_discount: Money::from_minor_units(session.amount_discount(), &currency).amount(),
            address: meta.address.clone(),
            installments: meta.installments,
            paid: session.is_paid(),
        })?;

        // The first invoice can land before this event does.
        if let Some(sub_id) = session.subscription.as_deref() {
            if let Some(plan) = self.installments.find(sub_id).await? {
                order.record_installment(plan.paid_installments)?;
            }
        }

        self.content.create_order(&order).await?;

        for line in order.products() {
            if let Err(e) = self.content.decrement_stock(&line.product_id, line.quantity).await {
                tracing::warn!(product_id = %line.product_id, error = %e, "stock decrement failed");
            }
        }
        for event in order.take_events() {
            self.publish(&event).await;
        }
        Ok(Outcome::OrderCreated(order_number.to_string()))
    }

    async fn invoice_paid(&self, invoice: &InvoiceObject) -> Result<Outcome> {
        let Some(subscription_id) = invoice.subscription_id() else {
            return Ok(Outcome::Ignored("invoice without subscription".into()));
        };
        if invoice.amount_paid <= 0 {
            return Ok(Outcome::Ignored("zero amount invoice".into()));
        }

        let meta = invoice.subscription_metadata();
        let meta_order = meta.and_then(|m| m.get("orderNumber")).cloned();
        let meta_total = meta.and_then(|m| m.get("installments")).and_then(|v| v.parse::<u32>().ok());

        let (order_number, total_installments) = match self.installments.find(subscription_id).await? {
            Some(plan) => (plan.order_number, plan.total_installments),
            None => match (meta_order, meta_total) {
                (Some(order), Some(total)) => (order, total),
                _ => return Ok(Outcome::Ignored("subscription is not an installment plan".into())),
            },
        };

        let recorded = self.installments.record_charge(&InstallmentCharge {
            invoice_id: invoice.id.clone(),
            subscription_id: subscription_id.to_string(),
            order_number,
            total_installments,
            amount_paid: invoice.amount_paid,
        }).await?;
        let mut plan = recorded.plan;

        // Runs on every delivery so a redelivered invoice repairs a failed patch.
        match self.content.update_installments_paid(&plan.order_number, plan.paid_installments).await {
            Ok(()) => {}
            // Invoice arrived before checkout completion; order creation syncs the count.
            Err(StorefrontError::NotFound(_)) => {
                tracing::debug!(order_number = %plan.order_number, "order not created yet, installment count deferred");
            }
            Err(e) => return Err(e),
        }

        if recorded.newly_recorded {
            self.publish(&DomainEvent::Installment(InstallmentEvent::Charged {
                subscription_id: plan.subscription_id.clone(),
                order_number: plan.order_number.clone(),
                paid: plan.paid_installments,
                total: plan.total_installments,
            })).await;
        }

        if plan.is_due_for_cancellation() {
            self.payments.cancel_subscription(&plan.subscription_id).await?;
            plan.complete();
            self.installments.save_status(&plan).await?;
            tracing::info!(subscription_id = %plan.subscription_id, "installment plan paid off, subscription cancelled");
            self.publish(&DomainEvent::Installment(InstallmentEvent::Completed {
                subscription_id: plan.subscription_id.clone(),
                order_number: plan.order_number.clone(),
            })).await;
            return Ok(Outcome::PlanCompleted(plan.subscription_id));
        }

        Ok(Outcome::InstallmentRecorded {
            subscription_id: plan.subscription_id,
            paid: plan.paid_installments,
            total: plan.total_installments,
        })
    }

    async fn subscription_deleted(&self, sub: &SubscriptionObject) -> Result<Outcome> {
        let Some(mut plan) = self.installments.find(&sub.id).await? else {
            return Ok(Outcome::Ignored("unknown subscription".into()));
        };
        if plan.status != PlanStatus::Active {
            return Ok(Outcome::Ignored(format!("plan already {}", plan.status.as_str())));
        }
        let cancelled = plan.cancel();
        self.installments.save_status(&plan).await?;
        if !cancelled {
            return Ok(Outcome::Ignored("plan already paid off".into()));
        }

        tracing::warn!(
            subscription_id = %plan.subscription_id,
            paid = plan.paid_installments,
            total = plan.total_installments,
            "installment plan cancelled before completion"
        );
        self.publish(&DomainEvent::Installment(InstallmentEvent::Cancelled {
            subscription_id: plan.subscription_id.clone(),
            order_number: plan.order_number.clone(),
        })).await;
        Ok(Outcome::PlanCancelled(plan.subscription_id))
    }

    async fn publish(&self, event: &DomainEvent) {
        if let Err(e) = self.events.publish(event).await {
            tracing::warn!(subject = event.subject(), error = %e, "event publish failed");
        }
    }
}
