//! Signed-in shopper endpoints: order history, wishlist, newsletter.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::db::accounts;
use crate::domain::aggregates::{Order, Product};
use crate::error::{Result, StorefrontError};
use crate::http::extract::{ApiJson, ApiPath};
use crate::http::AppState;

pub async fn list_orders(State(s): State<AppState>, user: CurrentUser) -> Result<Json<Vec<Order>>> {
    Ok(Json(s.content.orders_for_user(&user.id).await?))
}

pub async fn get_order(State(s): State<AppState>, user: CurrentUser, ApiPath(order_number): ApiPath<String>) -> Result<Json<Order>> {
    // Someone else's order is reported as missing, not forbidden.
    s.content.order_by_number(&order_number).await?
        .filter(|o| o.user_id() == user.id)
        .map(Json)
        .ok_or_else(|| StorefrontError::NotFound(format!("Order {}", order_number)))
}

#[derive(Debug, Serialize)]
pub struct WishlistEntry {
    pub product_id: String,
    pub added_at: DateTime<Utc>,
    /// None when the product has since been removed from the catalog.
    pub product: Option<Product>,
}

pub async fn get_wishlist(State(s): State<AppState>, user: CurrentUser) -> Result<Json<Vec<WishlistEntry>>> {
    let items = accounts::wishlist(&s.db, &user.id).await?;
    let ids: Vec<String> = items.iter().map(|i| i.product_id.clone()).collect();
    let mut products = s.content.products_by_ids(&ids).await?;
    let entries = items.into_iter().map(|i| {
        let product = products.iter().position(|p| p.id == i.product_id).map(|idx| products.swap_remove(idx));
        WishlistEntry { product_id: i.product_id, added_at: i.created_at, product }
    }).collect();
    Ok(Json(entries))
}

#[derive(Debug, Deserialize, Validate)]
pub struct WishlistRequest {
    #[validate(length(min = 1, max = 100))]
    pub product_id: String,
}

pub async fn add_wishlist_item(State(s): State<AppState>, user: CurrentUser, ApiJson(r): ApiJson<WishlistRequest>) -> Result<StatusCode> {
    r.validate()?;
    if s.content.products_by_ids(std::slice::from_ref(&r.product_id)).await?.is_empty() {
        return Err(StorefrontError::NotFound(format!("Product {}", r.product_id)));
    }
    accounts::upsert_user(&s.db, &user).await?;
    let added = accounts::add_to_wishlist(&s.db, &user.id, &r.product_id).await?;
    Ok(if added { StatusCode::CREATED } else { StatusCode::OK })
}

pub async fn remove_wishlist_item(State(s): State<AppState>, user: CurrentUser, ApiPath(product_id): ApiPath<String>) -> Result<StatusCode> {
    if accounts::remove_from_wishlist(&s.db, &user.id, &product_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StorefrontError::NotFound("Wishlist item".into()))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewsletterRequest {
    #[validate(email)]
    pub email: String,
}

pub async fn subscribe_newsletter(State(s): State<AppState>, ApiJson(r): ApiJson<NewsletterRequest>) -> Result<StatusCode> {
    r.validate()?;
    let created = accounts::subscribe_newsletter(&s.db, &r.email).await?;
    tracing::info!(created, "newsletter signup");
    Ok(if created { StatusCode::CREATED } else { StatusCode::OK })
}
