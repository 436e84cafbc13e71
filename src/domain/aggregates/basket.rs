//! Basket Aggregate
//!
//! The shopper's basket is kept by the client; the server rebuilds it from
//! catalog data whenever it needs authoritative prices or stock checks.

use serde::Serialize;
use crate::domain::aggregates::Product;
use crate::domain::value_objects::{Money, Quantity};

pub const DEFAULT_LINE_CAP: u32 = 99;

#[derive(Clone, Debug)]
pub struct Basket {
    lines: Vec<BasketLine>,
    currency: String,
    line_cap: u32,
    subtotal: Money,
}

#[derive(Clone, Debug, Serialize)]
pub struct BasketLine {
    pub product: Product,
    pub quantity: Quantity,
    pub unit_price: Money,
}

impl BasketLine {
    pub fn units(&self) -> u32 { self.quantity.get() }
    pub fn line_total(&self) -> Money { self.unit_price.multiply(self.units()) }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StockProblem {
    pub product_id: String,
    pub name: String,
    pub requested: u32,
    pub available: u32,
}

impl Basket {
    pub fn new(currency: &str) -> Self { Self::with_line_cap(currency, DEFAULT_LINE_CAP) }

    pub fn with_line_cap(currency: &str, line_cap: u32) -> Self {
        Self { lines: vec![], currency: currency.to_lowercase(), line_cap: line_cap.max(1), subtotal: Money::zero(currency) }
    }

    pub fn lines(&self) -> &[BasketLine] { &self.lines }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn subtotal(&self) -> &Money { &self.subtotal }
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }
    pub fn item_count(&self) -> u32 { self.lines.iter().map(BasketLine::units).sum() }

    /// Adds `quantity` of `product`, merging with an existing line. Returns the
    /// resulting line quantity, which is clamped to the line cap.
    pub fn add_item(&mut self, product: Product, quantity: u32) -> Result<u32, BasketError> {
        let cap = self.line_cap;
        let requested = Quantity::capped(quantity, cap).ok_or(BasketError::ZeroQuantity)?;
        let qty = if let Some(existing) = self.lines.iter_mut().find(|l| l.product.id == product.id) {
            existing.quantity = existing.quantity.merge(quantity, cap);
            existing.quantity
        } else {
            let unit_price = product.unit_price(&self.currency);
            self.lines.push(BasketLine { product, quantity: requested, unit_price });
            requested
        };
        self.recalculate();
        Ok(qty.get())
    }

    /// Takes one unit off a line, dropping the line when it reaches zero.
    pub fn remove_one(&mut self, product_id: &str) -> Result<u32, BasketError> {
        let idx = self.lines.iter().position(|l| l.product.id == product_id).ok_or(BasketError::ItemNotFound)?;
        let remaining = match self.lines[idx].quantity.decrement() {
            Some(q) => { self.lines[idx].quantity = q; q.get() }
            None => { self.lines.remove(idx); 0 }
        };
        self.recalculate();
        Ok(remaining)
    }

    pub fn delete_line(&mut self, product_id: &str) -> Result<(), BasketError> {
        let before = self.lines.len();
        self.lines.retain(|l| l.product.id != product_id);
        if self.lines.len() == before { return Err(BasketError::ItemNotFound); }
        self.recalculate();
        Ok(())
    }

    pub fn clear(&mut self) { self.lines.clear(); self.recalculate(); }

    pub fn stock_problems(&self) -> Vec<StockProblem> {
        self.lines.iter().filter(|l| !l.product.can_fulfil(l.units())).map(|l| StockProblem {
            product_id: l.product.id.clone(), name: l.product.name.clone(), requested: l.units(), available: l.product.stock,
        }).collect()
    }

    fn recalculate(&mut self) {
        self.subtotal = self.lines.iter().fold(Money::zero(&self.currency), |acc, l| acc.add(&l.line_total()).unwrap_or(acc));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum BasketError { ItemNotFound, ZeroQuantity }
impl std::error::Error for BasketError {}
impl std::fmt::Display for BasketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self { Self::ItemNotFound => write!(f, "Item not found"), Self::ZeroQuantity => write!(f, "Quantity must be at least 1") }
    }
}
