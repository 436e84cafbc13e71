//! Users, wishlist and newsletter rows.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::auth::CurrentUser;
use crate::error::Result;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WishlistItem { pub product_id: String, pub created_at: DateTime<Utc> }

/// Mirrors the auth provider's user into the local table so foreign keys hold.
pub async fn upsert_user(db: &PgPool, user: &CurrentUser) -> Result<()> {
    sqlx::query("INSERT INTO users (id, email, name, created_at, updated_at) VALUES ($1, $2, $3, NOW(), NOW()) ON CONFLICT (id) DO UPDATE SET email = COALESCE(EXCLUDED.email, users.email), name = COALESCE(EXCLUDED.name, users.name), updated_at = NOW()")
        .bind(&user.id).bind(&user.email).bind(&user.name)
        .execute(db).await?;
    Ok(())
}

pub async fn wishlist(db: &PgPool, user_id: &str) -> Result<Vec<WishlistItem>> {
    let items = sqlx::query_as::<_, WishlistItem>("SELECT product_id, created_at FROM wishlist_items WHERE user_id = $1 ORDER BY created_at DESC")
        .bind(user_id).fetch_all(db).await?;
    Ok(items)
}

/// Returns false when the product was already on the list.
pub async fn add_to_wishlist(db: &PgPool, user_id: &str, product_id: &str) -> Result<bool> {
    let res = sqlx::query("INSERT INTO wishlist_items (user_id, product_id, created_at) VALUES ($1, $2, NOW()) ON CONFLICT (user_id, product_id) DO NOTHING")
        .bind(user_id).bind(product_id).execute(db).await?;
    Ok(res.rows_affected() == 1)
}

pub async fn remove_from_wishlist(db: &PgPool, user_id: &str, product_id: &str) -> Result<bool> {
    let res = sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1 AND product_id = $2")
        .bind(user_id).bind(product_id).execute(db).await?;
    Ok(res.rows_affected() == 1)
}

/// Returns false when the address was already subscribed.
pub async fn subscribe_newsletter(db: &PgPool, email: &str) -> Result<bool> {
    let res = sqlx::query("INSERT INTO newsletter_subscribers (email, created_at) VALUES ($1, NOW()) ON CONFLICT (email) DO NOTHING")
        .bind(email.trim().to_lowercase()).execute(db).await?;
    Ok(res.rows_affected() == 1)
}
