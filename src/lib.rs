//! Storefront - headless e-commerce backend
//!
//! Catalog and orders live in a hosted content backend; payments go through a
//! hosted checkout provider whose webhooks are reconciled into orders.
//!
//! ## Features
//! - Product catalog, categories and search
//! - Basket pricing with stock checks
//! - Checkout sessions, one-off or split into monthly installments
//! - Signed webhook reconciliation (orders, installment charges, plan completion)
//! - Wishlist, reviews and newsletter signups

pub mod adapters;
pub mod auth;
pub mod checkout;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod http;
pub mod ports;
pub mod telemetry;
pub mod webhook;

pub use error::{Result, StorefrontError};
