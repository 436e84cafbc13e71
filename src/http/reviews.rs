use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::db::{accounts, reviews};
use crate::domain::aggregates::{NewReview, Review, ReviewSummary};
use crate::domain::value_objects::Rating;
use crate::error::{Result, StorefrontError};
use crate::http::extract::{ApiJson, ApiPath, ApiQuery};
use crate::http::AppState;

#[derive(Debug, Deserialize)]
pub struct ReviewParams { pub product_id: String }

#[derive(Debug, Serialize)]
pub struct ReviewsResponse { pub summary: ReviewSummary, pub reviews: Vec<Review> }

pub async fn list_reviews(State(s): State<AppState>, ApiQuery(p): ApiQuery<ReviewParams>) -> Result<Json<ReviewsResponse>> {
    let reviews = reviews::for_product(&s.db, &p.product_id).await?;
    let summary = ReviewSummary::from_ratings(
        reviews.iter().filter_map(|r| u8::try_from(r.rating).ok()).filter_map(|r| Rating::new(r).ok()),
    );
    Ok(Json(ReviewsResponse { summary, reviews }))
}

pub async fn create_review(State(s): State<AppState>, user: CurrentUser, ApiJson(r): ApiJson<NewReview>) -> Result<(StatusCode, Json<Review>)> {
    r.validate()?;
    if s.content.products_by_ids(std::slice::from_ref(&r.product_id)).await?.is_empty() {
        return Err(StorefrontError::NotFound(format!("Product {}", r.product_id)));
    }
    let verified = s.content.orders_for_user(&user.id).await?
        .iter()
        .any(|o| o.contains_product(&r.product_id));

    accounts::upsert_user(&s.db, &user).await?;
    let review = reviews::create(&s.db, &user, &r, verified).await?;
    tracing::info!(review_id = %review.id, product_id = %review.product_id, verified, "review created");
    Ok((StatusCode::CREATED, Json(review)))
}

#[derive(Debug, Serialize)]
pub struct HelpfulResponse { pub helpful_count: i32 }

pub async fn vote_helpful(State(s): State<AppState>, user: CurrentUser, ApiPath(id): ApiPath<Uuid>) -> Result<Json<HelpfulResponse>> {
    let helpful_count = reviews::vote_helpful(&s.db, id, &user.id).await?;
    Ok(Json(HelpfulResponse { helpful_count }))
}
