use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::checkout::BasketItemRequest;
use crate::domain::aggregates::{Category, Product, ProductStatus, StockProblem};
use crate::domain::value_objects::Money;
use crate::error::{Result, StorefrontError};
use crate::http::extract::{ApiJson, ApiPath, ApiQuery};
use crate::http::AppState;
use crate::ports::ProductQuery;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> { pub data: Vec<T>, pub total: u64, pub page: u32, pub per_page: u32 }

pub async fn list_products(State(s): State<AppState>, ApiQuery(p): ApiQuery<ListParams>) -> Result<Json<PaginatedResponse<Product>>> {
    let page = p.page.unwrap_or(1).max(1);
    let per_page = p.per_page.unwrap_or(20).clamp(1, 100);
    let status = p.status.as_deref().filter(|s| !s.is_empty())
        .map(str::parse::<ProductStatus>)
        .transpose()
        .map_err(|e| StorefrontError::Validation(e.to_string()))?;
    let offset = (page - 1).checked_mul(per_page)
        .ok_or_else(|| StorefrontError::Validation(format!("page {} is out of range", page)))?;
    let query = ProductQuery {
        category: p.category.filter(|c| !c.is_empty()),
        search: p.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
        status,
        offset,
        limit: per_page,
    };
    let result = s.content.list_products(&query).await?;
    Ok(Json(PaginatedResponse { data: result.products, total: result.total, page, per_page }))
}

pub async fn get_product(State(s): State<AppState>, ApiPath(slug): ApiPath<String>) -> Result<Json<Product>> {
    s.content.product_by_slug(&slug).await?
        .map(Json)
        .ok_or_else(|| StorefrontError::NotFound(format!("Product {}", slug)))
}

pub async fn list_categories(State(s): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(s.content.categories().await?))
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest { pub items: Vec<BasketItemRequest> }

#[derive(Debug, Serialize)]
pub struct QuoteLine {
    pub product_id: String,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub lines: Vec<QuoteLine>,
    pub item_count: u32,
    pub subtotal: Money,
    pub stock_problems: Vec<StockProblem>,
    pub installment_options: Vec<u32>,
}

pub async fn quote_basket(State(s): State<AppState>, ApiJson(r): ApiJson<QuoteRequest>) -> Result<Json<QuoteResponse>> {
    let basket = s.checkout.quote(&r.items).await?;
    let lines = basket.lines().iter().map(|l| QuoteLine {
        product_id: l.product.id.clone(),
        name: l.product.name.clone(),
        slug: l.product.slug.clone(),
        image: l.product.primary_image().map(str::to_string),
        quantity: l.units(),
        unit_price: l.unit_price.clone(),
        line_total: l.line_total(),
    }).collect();
    Ok(Json(QuoteResponse {
        lines,
        item_count: basket.item_count(),
        subtotal: basket.subtotal().clone(),
        stock_problems: basket.stock_problems(),
        installment_options: s.checkout.settings().installment_options.clone(),
    }))
}
