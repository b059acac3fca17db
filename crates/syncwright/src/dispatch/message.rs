//! Broker-neutral message and subscription types.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("failed to connect to broker: {0}")]
    Connect(String),
    #[error("failed to subscribe: {0}")]
    Subscribe(String),
    #[error("failed to receive message: {0}")]
    Receive(String),
    #[error("failed to acknowledge message: {0}")]
    Ack(String),
}

/// Settles one delivery with the broker.
#[async_trait]
pub trait Acknowledger: Send + Sync {
    /// Mark the message consumed.
    async fn ack(&self) -> Result<(), BrokerError>;

    /// Ask for redelivery, optionally after `delay`.
    async fn nak(&self, delay: Option<Duration>) -> Result<(), BrokerError>;
}

/// One delivery of a webhook body.
pub struct InboundMessage {
    pub subject: String,
    pub payload: Bytes,
    /// 1 on first delivery.
    pub delivered: u32,
    acker: Arc<dyn Acknowledger>,
}

impl InboundMessage {
    pub fn new(
        subject: impl Into<String>,
        payload: impl Into<Bytes>,
        delivered: u32,
        acker: Arc<dyn Acknowledger>,
    ) -> Self {
        Self {
            subject: subject.into(),
            payload: payload.into(),
            delivered,
            acker,
        }
    }

    pub async fn ack(&self) -> Result<(), BrokerError> {
        self.acker.ack().await
    }

    pub async fn nak(&self, delay: Option<Duration>) -> Result<(), BrokerError> {
        self.acker.nak(delay).await
    }
}

impl fmt::Debug for InboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InboundMessage")
            .field("subject", &self.subject)
            .field("payload_len", &self.payload.len())
            .field("delivered", &self.delivered)
            .finish()
    }
}

/// A durable consumer definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub durable_name: String,
    pub filter_subjects: Vec<String>,
    /// Replay starts here rather than at the beginning of the stream.
    pub start_time: DateTime<Utc>,
    pub max_deliver: i64,
}

pub type MessageStream = BoxStream<'static, Result<InboundMessage, BrokerError>>;

/// A durable, replayable stream of webhook deliveries.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Create or reconfigure the consumer and start pulling.
    async fn subscribe(&self, subscription: &Subscription) -> Result<MessageStream, BrokerError>;
}
