//! Aggregates module
pub mod product;
pub mod basket;
pub mod order;
pub mod installment;
pub mod review;

pub use product::{Product, ProductError, ProductStatus, Category};
pub use basket::{Basket, BasketError, BasketLine, StockProblem};
pub use order::{Order, OrderDraft, OrderError, OrderStatus, OrderLine, PaymentPlan, Address};
pub use installment::{InstallmentPlan, InstallmentCharge, PlanStatus, RecordedCharge};
pub use review::{NewReview, Review, ReviewSummary};
