//! PostgreSQL persistence (sqlx).

pub mod accounts;
pub mod installments;
pub mod reviews;

pub use installments::PgInstallmentStore;
