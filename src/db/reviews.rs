use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::domain::aggregates::{NewReview, Review};
use crate::error::{Result, StorefrontError};

const COLUMNS: &str = "id, product_id, user_id, author_name, rating, title, body, verified_purchase, helpful_count, created_at";

pub async fn for_product(db: &PgPool, product_id: &str) -> Result<Vec<Review>> {
    let reviews = sqlx::query_as::<_, Review>(&format!("SELECT {} FROM reviews WHERE product_id = $1 ORDER BY helpful_count DESC, created_at DESC", COLUMNS))
        .bind(product_id).fetch_all(db).await?;
    Ok(reviews)
}

pub async fn create(db: &PgPool, user: &CurrentUser, review: &NewReview, verified_purchase: bool) -> Result<Review> {
    sqlx::query_as::<_, Review>(&format!("INSERT INTO reviews ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, NOW()) RETURNING {}", COLUMNS, COLUMNS))
        .bind(Uuid::now_v7()).bind(&review.product_id).bind(&user.id).bind(&user.name)
        .bind(review.rating as i16).bind(review.title.trim()).bind(review.body.trim()).bind(verified_purchase)
        .fetch_one(db).await
        .map_err(|e| match StorefrontError::from(e) {
            err if err.is_unique_violation() => StorefrontError::Conflict("You have already reviewed this product".into()),
            err => err,
        })
}

/// Counts one helpful vote per user. Returns the review's new count.
pub async fn vote_helpful(db: &PgPool, review_id: Uuid, user_id: &str) -> Result<i32> {
    let mut tx = db.begin().await?;
    let author: Option<(String,)> = sqlx::query_as("SELECT user_id FROM reviews WHERE id = $1 FOR UPDATE")
        .bind(review_id).fetch_optional(&mut *tx).await?;
    let (author,) = author.ok_or_else(|| StorefrontError::NotFound("Review".into()))?;
    if author == user_id {
        return Err(StorefrontError::Validation("cannot vote on your own review".into()));
    }

    let inserted = sqlx::query("INSERT INTO review_votes (review_id, user_id, created_at) VALUES ($1, $2, NOW()) ON CONFLICT DO NOTHING")
        .bind(review_id).bind(user_id).execute(&mut *tx).await?.rows_affected() == 1;
    let (count,): (i32,) = if inserted {
        sqlx::query_as("UPDATE reviews SET helpful_count = helpful_count + 1 WHERE id = $1 RETURNING helpful_count")
            .bind(review_id).fetch_one(&mut *tx).await?
    } else {
        sqlx::query_as("SELECT helpful_count FROM reviews WHERE id = $1").bind(review_id).fetch_one(&mut *tx).await?
    };
    tx.commit().await?;
    Ok(count)
}
