//! Basket summary carried in checkout-session metadata.
//!
//! The payment provider caps metadata at 50 keys with values of at most 500
//! characters, so the item list is compact JSON split across `items_0`,
//! `items_1`, ... and stitched back together when the webhook arrives.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::aggregates::Address;

pub const MAX_KEYS: usize = 50;
pub const MAX_VALUE_CHARS: usize = 500;

const ORDER_NUMBER: &str = "orderNumber";
const USER_ID: &str = "clerkUserId";
const CUSTOMER_NAME: &str = "customerName";
const CUSTOMER_EMAIL: &str = "customerEmail";
const TOTAL: &str = "totalAmount";
const INSTALLMENTS: &str = "installments";
const ADDRESS: &str = "address";
const ITEMS_PREFIX: &str = "items_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    pub id: String,
    pub q: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutMetadata {
    pub order_number: String,
    pub user_id: String,
    pub customer_name: String,
    pub customer_email: String,
    /// Basket total in minor units, before provider-side discounts.
    pub total_minor: i64,
    pub installments: Option<u32>,
    pub address: Option<Address>,
    pub items: Vec<ItemRef>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetadataError {
    #[error("metadata needs {0} keys, the limit is {}", MAX_KEYS)]
    TooManyKeys(usize),
    #[error("value for `{0}` exceeds {} characters", MAX_VALUE_CHARS)]
    ValueTooLong(String),
    #[error("missing `{0}`")]
    Missing(String),
    #[error("malformed `{0}`")]
    Malformed(String),
}

impl CheckoutMetadata {
    pub fn encode(&self) -> Result<BTreeMap<String, String>, MetadataError> {
        let mut out = BTreeMap::new();
        out.insert(ORDER_NUMBER.to_string(), self.order_number.clone());
        out.insert(USER_ID.to_string(), self.user_id.clone());
        out.insert(CUSTOMER_NAME.to_string(), self.customer_name.chars().take(MAX_VALUE_CHARS).collect());
        out.insert(CUSTOMER_EMAIL.to_string(), self.customer_email.clone());
        out.insert(TOTAL.to_string(), self.total_minor.to_string());
        if let Some(n) = self.installments {
            out.insert(INSTALLMENTS.to_string(), n.to_string());
        }
        if let Some(address) = &self.address {
            let json = serde_json::to_string(address).map_err(|_| MetadataError::Malformed(ADDRESS.into()))?;
            out.insert(ADDRESS.to_string(), json);
        }
        for (key, value) in &out {
            if value.chars().count() > MAX_VALUE_CHARS {
                return Err(MetadataError::ValueTooLong(key.clone()));
            }
        }

        let items = serde_json::to_string(&self.items).map_err(|_| MetadataError::Malformed("items".into()))?;
        let chunks = chunk_chars(&items, MAX_VALUE_CHARS);
        let needed = out.len() + chunks.len();
        if needed > MAX_KEYS {
            return Err(MetadataError::TooManyKeys(needed));
        }
        for (i, chunk) in chunks.into_iter().enumerate() {
            out.insert(format!("{}{}", ITEMS_PREFIX, i), chunk);
        }
        Ok(out)
    }

    pub fn decode(map: &BTreeMap<String, String>) -> Result<Self, MetadataError> {
        let required = |key: &str| map.get(key).cloned().ok_or_else(|| MetadataError::Missing(key.to_string()));

        let total_minor = required(TOTAL)?.parse::<i64>().map_err(|_| MetadataError::Malformed(TOTAL.into()))?;
        let installments = match map.get(INSTALLMENTS) {
            Some(raw) => Some(raw.parse::<u32>().map_err(|_| MetadataError::Malformed(INSTALLMENTS.into()))?),
            None => None,
        };
        let address = match map.get(ADDRESS) {
            Some(raw) => Some(serde_json::from_str(raw).map_err(|_| MetadataError::Malformed(ADDRESS.into()))?),
            None => None,
        };

        let mut joined = String::new();
        for i in 0.. {
            match map.get(&format!("{}{}", ITEMS_PREFIX, i)) {
                Some(part) => joined.push_str(part),
                None => break,
            }
        }
        if joined.is_empty() {
            return Err(MetadataError::Missing(format!("{}0", ITEMS_PREFIX)));
        }
        let items = serde_json::from_str(&joined).map_err(|_| MetadataError::Malformed("items".into()))?;

        Ok(Self {
            order_number: required(ORDER_NUMBER)?,
            user_id: required(USER_ID)?,
            customer_name: map.get(CUSTOMER_NAME).cloned().unwrap_or_default(),
            customer_email: required(CUSTOMER_EMAIL)?,
            total_minor,
            installments,
            address,
            items,
        })
    }
}

fn chunk_chars(s: &str, max: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut count = 0;
    for c in s.chars() {
        if count == max {
            out.push(std::mem::take(&mut current));
            count = 0;
        }
        current.push(c);
        count += 1;
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}
