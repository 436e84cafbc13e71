//! Catalog entities as served by the content backend

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    /// Percentage shown as a strike-through badge; checkout charges `price`.
    #[serde(default)]
    pub discount: Option<Decimal>,
    /// Concurrent decrements can drive the stored count below zero; read as 0.
    #[serde(default, deserialize_with = "stock_floor")]
    pub stock: u32,
    #[serde(default)]
    pub status: Option<ProductStatus>,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default, deserialize_with = "present_strings")]
    pub images: Vec<String>,
    #[serde(default, deserialize_with = "present_strings")]
    pub categories: Vec<String>,
}

fn stock_floor<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    let raw = Option::<i64>::deserialize(d)?.unwrap_or(0);
    Ok(raw.clamp(0, i64::from(u32::MAX)) as u32)
}

/// `null` lists and dangling references (`null` entries) both come back from
/// projections over incomplete documents.
fn present_strings<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let raw = Option::<Vec<Option<String>>>::deserialize(d)?;
    Ok(raw.unwrap_or_default().into_iter().flatten().collect())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus { New, Hot, Sale }

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::New => "new", Self::Hot => "hot", Self::Sale => "sale" }
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = ProductError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New), "hot" => Ok(Self::Hot), "sale" => Ok(Self::Sale),
            other => Err(ProductError::UnknownStatus(other.to_string())),
        }
    }
}

impl Product {
    pub fn unit_price(&self, currency: &str) -> Money { Money::new(self.price, currency) }
    pub fn is_in_stock(&self) -> bool { self.stock > 0 }
    pub fn can_fulfil(&self, quantity: u32) -> bool { quantity <= self.stock }
    pub fn primary_image(&self) -> Option<&str> { self.images.first().map(String::as_str) }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub product_count: u32,
}

#[derive(Debug, Clone)] pub enum ProductError { UnknownStatus(String) }
impl std::error::Error for ProductError {}
impl std::fmt::Display for ProductError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self { Self::UnknownStatus(s) => write!(f, "Unknown product status '{}'", s) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_product_from_content_document() {
        let p: Product = serde_json::from_value(serde_json::json!({
            "_id": "prod-1", "name": "Desk Lamp", "slug": "desk-lamp", "price": 24.5,
            "stock": 3, "status": "hot", "images": ["https://cdn/lamp.png"]
        })).unwrap();
        assert_eq!(p.price, Decimal::new(245, 1));
        assert_eq!(p.status, Some(ProductStatus::Hot));
        assert!(p.can_fulfil(3));
        assert!(!p.can_fulfil(4));
        assert_eq!(p.primary_image(), Some("https://cdn/lamp.png"));
    }
    #[test]
    fn test_incomplete_document_still_reads() {
        let p: Product = serde_json::from_value(serde_json::json!({
            "_id": "prod-2", "name": "Stool", "slug": "stool", "price": 40,
            "stock": null, "images": null, "categories": ["Seating", null]
        })).unwrap();
        assert_eq!(p.stock, 0);
        assert!(p.images.is_empty());
        assert_eq!(p.categories, vec!["Seating".to_string()]);
        assert_eq!(p.primary_image(), None);
    }

    #[test]
    fn test_oversold_stock_reads_as_zero() {
        let p: Product = serde_json::from_value(serde_json::json!({
            "_id": "prod-3", "name": "Lamp", "slug": "lamp", "price": 10, "stock": -1
        })).unwrap();
        assert_eq!(p.stock, 0);
        assert!(!p.is_in_stock());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("SALE".parse::<ProductStatus>().unwrap(), ProductStatus::Sale);
        assert!("clearance".parse::<ProductStatus>().is_err());
    }
}
