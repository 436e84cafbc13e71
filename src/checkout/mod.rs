//! Checkout: pricing a basket and opening a payment-provider session for it.

pub mod metadata;
pub mod service;

pub use metadata::{CheckoutMetadata, ItemRef, MetadataError};
pub use service::{BasketItemRequest, CheckoutRequest, CheckoutService, CheckoutSession, installment_amount};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSettings {
    pub currency: String,
    /// Base URL of the storefront client; success and cancel pages hang off it.
    pub public_url: String,
    pub installment_options: Vec<u32>,
    pub max_line_quantity: u32,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            currency: "usd".into(),
            public_url: "http://localhost:3000".into(),
            installment_options: vec![3, 6, 12],
            max_line_quantity: crate::domain::aggregates::basket::DEFAULT_LINE_CAP,
        }
    }
}
