//! NATS JetStream adapter.
//!
//! Uses one durable pull consumer bound to the webhook stream. An existing
//! consumer keeps its ack floor across restarts: a changed filter set or
//! delivery limit is updated in place, and only a missing consumer (or one
//! whose ack policy cannot be changed) is created from `ByStartTime`.

use std::sync::Arc;
use std::time::Duration;

use async_nats::jetstream::{self, AckKind};
use async_nats::jetstream::consumer::{self, AckPolicy, DeliverPolicy, pull};
use async_trait::async_trait;
use futures::StreamExt;

use super::message::{
    Acknowledger, BrokerError, InboundMessage, MessageSource, MessageStream, Subscription,
};

pub struct JetStreamSource {
    jetstream: jetstream::Context,
    stream: String,
}

impl JetStreamSource {
    pub async fn connect(url: &str, stream: impl Into<String>) -> Result<Self, BrokerError> {
        let client = async_nats::connect(url)
            .await
            .map_err(|e| BrokerError::Connect(e.to_string()))?;
        Ok(Self {
            jetstream: jetstream::new(client),
            stream: stream.into(),
        })
    }
}

struct JetStreamAcker {
    message: jetstream::Message,
}

#[async_trait]
impl Acknowledger for JetStreamAcker {
    async fn ack(&self) -> Result<(), BrokerError> {
        self.message
            .ack()
            .await
            .map_err(|e| BrokerError::Ack(e.to_string()))
    }

    async fn nak(&self, delay: Option<Duration>) -> Result<(), BrokerError> {
        self.message
            .ack_with(AckKind::Nak(delay))
            .await
            .map_err(|e| BrokerError::Ack(e.to_string()))
    }
}

fn into_inbound(message: jetstream::Message) -> InboundMessage {
    let delivered = message
        .info()
        .map(|info| u32::try_from(info.delivered).unwrap_or(u32::MAX))
        .unwrap_or(1);
    let subject = message.message.subject.to_string();
    let payload = message.message.payload.clone();
    InboundMessage::new(subject, payload, delivered, Arc::new(JetStreamAcker { message }))
}

/// What to do with the durable consumer before pulling from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConsumerPlan {
    /// Consumer exists with the wanted configuration.
    Reuse,
    /// Consumer exists; filters or delivery limit change in place.
    Update,
    /// No consumer yet: create it at the subscription's start time.
    Create,
    /// Consumer exists with an immutable setting that differs.
    Recreate,
}

fn stored_filters(config: &consumer::Config) -> Vec<String> {
    let mut filters = if config.filter_subjects.is_empty() && !config.filter_subject.is_empty() {
        vec![config.filter_subject.clone()]
    } else {
        config.filter_subjects.clone()
    };
    filters.sort();
    filters
}

pub(crate) fn plan_consumer(
    existing: Option<&consumer::Config>,
    subscription: &Subscription,
) -> ConsumerPlan {
    let Some(existing) = existing else {
        return ConsumerPlan::Create;
    };
    if !matches!(existing.ack_policy, AckPolicy::Explicit) {
        return ConsumerPlan::Recreate;
    }
    let mut wanted = subscription.filter_subjects.clone();
    wanted.sort();
    if stored_filters(existing) == wanted && existing.max_deliver == subscription.max_deliver {
        ConsumerPlan::Reuse
    } else {
        ConsumerPlan::Update
    }
}

fn subscribe_error(err: impl std::fmt::Display) -> BrokerError {
    BrokerError::Subscribe(err.to_string())
}

impl JetStreamSource {
    async fn durable_consumer(
        &self,
        subscription: &Subscription,
    ) -> Result<jetstream::consumer::Consumer<pull::Config>, BrokerError> {
        let stream = self
            .jetstream
            .get_stream(&self.stream)
            .await
            .map_err(subscribe_error)?;
        let name = subscription.durable_name.as_str();

        let existing = match stream.get_consumer::<pull::Config>(name).await {
            Ok(consumer) => Some(consumer),
            Err(err) => {
                tracing::debug!(consumer = name, error = %err, "no existing durable consumer");
                None
            }
        };

        let plan = plan_consumer(
            existing.as_ref().map(|c| &c.cached_info().config),
            subscription,
        );
        tracing::info!(
            consumer = name,
            ?plan,
            filters = ?subscription.filter_subjects,
            "binding durable consumer"
        );
        match (plan, existing) {
            (ConsumerPlan::Reuse, Some(consumer)) => Ok(consumer),
            (ConsumerPlan::Update, Some(consumer)) => {
                let deliver_policy = consumer.cached_info().config.deliver_policy.clone();
                stream
                    .update_consumer(pull::Config {
                        durable_name: Some(name.to_string()),
                        filter_subjects: subscription.filter_subjects.clone(),
                        deliver_policy,
                        ack_policy: AckPolicy::Explicit,
                        max_deliver: subscription.max_deliver,
                        ..Default::default()
                    })
                    .await
                    .map_err(subscribe_error)
            }
            (plan, _) => {
                if plan == ConsumerPlan::Recreate {
                    stream.delete_consumer(name).await.map_err(subscribe_error)?;
                }
                let start_time =
                    time::OffsetDateTime::from_unix_timestamp(subscription.start_time.timestamp())
                        .map_err(subscribe_error)?;
                stream
                    .create_consumer(pull::Config {
                        durable_name: Some(name.to_string()),
                        filter_subjects: subscription.filter_subjects.clone(),
                        deliver_policy: DeliverPolicy::ByStartTime { start_time },
                        ack_policy: AckPolicy::Explicit,
                        max_deliver: subscription.max_deliver,
                        ..Default::default()
                    })
                    .await
                    .map_err(subscribe_error)
            }
        }
    }
}

#[async_trait]
impl MessageSource for JetStreamSource {
    async fn subscribe(&self, subscription: &Subscription) -> Result<MessageStream, BrokerError> {
        let consumer = self.durable_consumer(subscription).await?;
        let messages = consumer.messages().await.map_err(subscribe_error)?;

        Ok(messages
            .map(|next| match next {
                Ok(message) => Ok(into_inbound(message)),
                Err(err) => Err(BrokerError::Receive(err.to_string())),
            })
            .boxed())
    }
}
