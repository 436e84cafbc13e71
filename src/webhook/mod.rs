//! Payment provider webhooks: signature check, event parsing, reconciliation.

pub mod event;
pub mod reconcile;
pub mod signature;

pub use event::{ProviderEvent, WebhookEvent};
pub use reconcile::{Outcome, WebhookProcessor};
pub use signature::{SignatureError, SignatureVerifier, SIGNATURE_HEADER};
