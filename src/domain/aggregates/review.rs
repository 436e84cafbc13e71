//! Product reviews

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use crate::domain::value_objects::Rating;

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NewReview {
    #[validate(length(min = 1, max = 100))]
    pub product_id: String,
    #[validate(range(min = 1, max = 5))]
    pub rating: u8,
    #[validate(length(min = 1, max = 120))]
    pub title: String,
    #[validate(length(min = 10, max = 2000))]
    pub body: String,
}

impl NewReview {
    pub fn rating(&self) -> Option<Rating> { Rating::new(self.rating).ok() }
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,
    pub product_id: String,
    pub user_id: String,
    pub author_name: Option<String>,
    pub rating: i16,
    pub title: String,
    pub body: String,
    pub verified_purchase: bool,
    pub helpful_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ReviewSummary {
    pub count: u32,
    pub average: Decimal,
    /// Index 0 holds one-star reviews, index 4 five-star.
    pub distribution: [u32; 5],
}

impl ReviewSummary {
    pub fn from_ratings<I: IntoIterator<Item = Rating>>(ratings: I) -> Self {
        let mut summary = Self::default();
        let mut sum = 0u64;
        for r in ratings {
            summary.distribution[(r.value() - 1) as usize] += 1;
            summary.count += 1;
            sum += r.value() as u64;
        }
        if summary.count > 0 {
            summary.average = (Decimal::from(sum) / Decimal::from(summary.count)).round_dp(1);
        }
        summary
    }
}
