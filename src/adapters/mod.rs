//! Adapters: concrete implementations of the ports for the real services.

pub mod content;
pub mod events;
pub mod payments;

pub use content::HttpContentStore;
pub use events::{LogPublisher, NatsPublisher};
pub use payments::StripeGateway;
