//! Domain event fan-out over NATS.

use async_trait::async_trait;

use crate::domain::events::DomainEvent;
use crate::error::{Result, StorefrontError};
use crate::ports::EventPublisher;

#[derive(Clone)]
pub struct NatsPublisher {
    client: async_nats::Client,
}

impl NatsPublisher {
    pub fn new(client: async_nats::Client) -> Self { Self { client } }
}

#[async_trait]
impl EventPublisher for NatsPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<()> {
        let payload = serde_json::to_vec(event)?;
        self.client
            .publish(event.subject().to_string(), payload.into())
            .await
            .map_err(|e| StorefrontError::Upstream(format!("nats publish: {}", e)))
    }
}

/// Used when no NATS server is configured.
#[derive(Clone, Default)]
pub struct LogPublisher;

#[async_trait]
impl EventPublisher for LogPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<()> {
        tracing::debug!(subject = event.subject(), event = ?event, "domain event");
        Ok(())
    }
}
