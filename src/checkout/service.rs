use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::checkout::metadata::{CheckoutMetadata, ItemRef};
use crate::checkout::CheckoutSettings;
use crate::domain::aggregates::{Address, Basket};
use crate::domain::value_objects::{Money, OrderNumber};
use crate::error::{Result, StorefrontError};
use crate::ports::{CheckoutMode, ContentStore, PaymentGateway, SessionLineItem, SessionRequest};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BasketItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(length(min = 1, max = 100))]
    pub items: Vec<BasketItemRequest>,
    #[validate(length(max = 200))]
    pub customer_name: Option<String>,
    #[validate(email)]
    pub customer_email: Option<String>,
    #[validate]
    pub address: Option<Address>,
    pub installments: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSession {
    pub session_id: String,
    pub url: String,
    pub order_number: OrderNumber,
    pub total: Money,
    pub installments: Option<u32>,
    pub installment_amount: Option<Money>,
}

/// Monthly charge for an installment plan: the total split evenly, rounded up
/// so the plan never collects less than the order total.
pub fn installment_amount(total_minor: i64, installments: u32) -> i64 {
    let n = i64::from(installments.max(1));
    (total_minor + n - 1) / n
}

#[derive(Clone)]
pub struct CheckoutService {
    content: Arc<dyn ContentStore>,
    payments: Arc<dyn PaymentGateway>,
    settings: CheckoutSettings,
}

impl CheckoutService {
    pub fn new(content: Arc<dyn ContentStore>, payments: Arc<dyn PaymentGateway>, settings: CheckoutSettings) -> Self {
        Self { content, payments, settings }
    }

    pub fn settings(&self) -> &CheckoutSettings { &self.settings }

    /// Rebuilds the client's basket from catalog data.
    pub async fn quote(&self, items: &[BasketItemRequest]) -> Result<Basket> {
        if items.iter().any(|i| i.quantity == 0) {
            return Err(StorefrontError::Validation("quantity must be at least 1".into()));
        }
        let mut ids: Vec<String> = items.iter().map(|i| i.product_id.clone()).collect();
        ids.sort();
        ids.dedup();

        let catalog: HashMap<String, _> = self.content.products_by_ids(&ids).await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        let mut basket = Basket::with_line_cap(&self.settings.currency, self.settings.max_line_quantity);
        for item in items {
            let product = catalog.get(&item.product_id)
                .ok_or_else(|| StorefrontError::NotFound(format!("Product {}", item.product_id)))?;
            basket.add_item(product.clone(), item.quantity)?;
        }
        Ok(basket)
    }

    pub async fn start(&self, user: &CurrentUser, request: CheckoutRequest) -> Result<CheckoutSession> {
        request.validate()?;

        if let Some(n) = request.installments {
            if !self.settings.installment_options.contains(&n) {
                return Err(StorefrontError::Validation(format!(
                    "installments must be one of {:?}", self.settings.installment_options
                )));
            }
        }
        let email = request.customer_email.clone().or_else(|| user.email.clone())
            .ok_or_else(|| StorefrontError::Validation("customer email is required".into()))?;
        let name = request.customer_name.clone().or_else(|| user.name.clone()).unwrap_or_default();

        let basket = self.quote(&request.items).await?;
        let problems = basket.stock_problems();
        if !problems.is_empty() {
            return Err(StorefrontError::OutOfStock(problems));
        }

        let total = basket.subtotal().clone();
        let total_minor = total.to_minor_units()?;
        let order_number = OrderNumber::generate();
        let metadata = CheckoutMetadata {
            order_number: order_number.to_string(),
            user_id: user.id.clone(),
            customer_name: name,
            customer_email: email.clone(),
            total_minor,
            installments: request.installments,
            address: request.address.clone(),
            items: basket.lines().iter().map(|l| ItemRef { id: l.product.id.clone(), q: l.units() }).collect(),
        };

        // Oversized address or basket: reject the input before anything reaches the provider.
        let metadata = metadata.encode().map_err(|e| StorefrontError::Validation(e.to_string()))?;

        let (mode, line_items, subscription_metadata, per_installment) = match request.installments {
            Some(n) => {
                let unit = installment_amount(total_minor, n);
                let line = SessionLineItem {
                    name: format!("Order {} ({} monthly installments)", order_number, n),
                    image: basket.lines().first().and_then(|l| l.product.primary_image()).map(str::to_string),
                    unit_amount: unit,
                    quantity: 1,
                };
                let sub_meta = BTreeMap::from([
                    ("orderNumber".to_string(), order_number.to_string()),
                    ("installments".to_string(), n.to_string()),
                ]);
                (CheckoutMode::Installments { installments: n }, vec![line], sub_meta,
                 Some(Money::from_minor_units(unit, total.currency())))
            }
            None => {
                let mut lines = Vec::with_capacity(basket.lines().len());
                for l in basket.lines() {
                    lines.push(SessionLineItem {
                        name: l.product.name.clone(),
                        image: l.product.primary_image().map(str::to_string),
                        unit_amount: l.unit_price.to_minor_units()?,
                        quantity: l.units(),
                    });
                }
                (CheckoutMode::Payment, lines, BTreeMap::new(), None)
            }
        };

        let session_request = SessionRequest {
            mode,
            currency: self.settings.currency.clone(),
            customer_email: email,
            line_items,
            metadata,
            subscription_metadata,
            success_url: format!(
                "{}/success?session_id={{CHECKOUT_SESSION_ID}}&orderNumber={}",
                self.settings.public_url, order_number
            ),
            cancel_url: format!("{}/cart", self.settings.public_url),
        };

        let created = self.payments.create_checkout_session(&session_request).await?;
        tracing::info!(
            order_number = %order_number,
            session_id = %created.id,
            user_id = %user.id,
            total = %total,
            installments = ?request.installments,
            "checkout session created"
        );

        Ok(CheckoutSession {
            session_id: created.id,
            url: created.url,
            order_number,
            total,
            installments: request.installments,
            installment_amount: per_installment,
        })
    }
}
