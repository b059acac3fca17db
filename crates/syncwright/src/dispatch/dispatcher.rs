//! Inbound dispatcher: pulls deliveries, routes them to handlers and settles
//! them with the broker.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::context::EngineContext;
use crate::settings::BrokerSettings;
use crate::webhook::{EventType, HandlerRegistry};

use super::disposition::Disposition;
use super::message::{BrokerError, InboundMessage, MessageSource, Subscription};
use super::subject::{filter_subjects, parse_subject};

/// Counts of settled deliveries over one [`Dispatcher::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub acked: usize,
    pub dropped: usize,
    pub nakked: usize,
    pub subscriptions: usize,
}

impl DispatchStats {
    fn count(&mut self, disposition: &Disposition) {
        match disposition {
            Disposition::Ack => self.acked += 1,
            Disposition::Drop { .. } => self.dropped += 1,
            Disposition::Nak { .. } => self.nakked += 1,
        }
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    context: EngineContext,
    registry: Arc<HandlerRegistry>,
    source: Arc<dyn MessageSource>,
    settings: BrokerSettings,
}

impl Dispatcher {
    pub fn new(
        context: EngineContext,
        registry: Arc<HandlerRegistry>,
        source: Arc<dyn MessageSource>,
        settings: BrokerSettings,
    ) -> Self {
        Self {
            context,
            registry,
            source,
            settings,
        }
    }

    /// Consumer definition for the current monitored set.
    pub fn subscription(&self, now: DateTime<Utc>) -> Subscription {
        Subscription {
            durable_name: self.settings.consumer.clone(),
            filter_subjects: filter_subjects(
                &self.settings.namespace,
                &self.context.tenants,
                &self.registry.supported_event_types(),
            ),
            start_time: now - chrono::Duration::days(i64::from(self.settings.replay_days)),
            max_deliver: self.settings.max_deliver,
        }
    }

    /// Route one delivery to its handler and classify the outcome.
    pub async fn process(&self, message: &InboundMessage) -> Disposition {
        let Some(parsed) = parse_subject(&message.subject) else {
            return Disposition::Drop {
                reason: format!("malformed subject {}", message.subject),
            };
        };
        let handler = match parsed.event.parse::<EventType>() {
            Ok(event_type) => self.registry.get(event_type),
            Err(_) => None,
        };
        let Some(handler) = handler else {
            return Disposition::Drop {
                reason: format!("unsupported event type {}", parsed.event),
            };
        };

        let started = Instant::now();
        let result = handler.handle(&self.context, &message.payload).await;
        let disposition = Disposition::from_result(&result, message.delivered);
        tracing::debug!(
            subject = %message.subject,
            event_type = %parsed.event,
            delivered = message.delivered,
            elapsed_ms = started.elapsed().as_millis() as u64,
            ?disposition,
            "webhook handled"
        );
        disposition
    }

    /// Settle a delivery according to `disposition`.
    async fn settle(
        &self,
        message: &InboundMessage,
        disposition: &Disposition,
    ) -> Result<(), BrokerError> {
        match disposition {
            Disposition::Ack => message.ack().await,
            Disposition::Drop { reason } => {
                tracing::warn!(
                    subject = %message.subject,
                    delivered = message.delivered,
                    reason = %reason,
                    "dropping message"
                );
                message.ack().await
            }
            Disposition::Nak { delay } => {
                if i64::from(message.delivered) >= self.settings.max_deliver {
                    tracing::error!(
                        subject = %message.subject,
                        delivered = message.delivered,
                        "retryable failure on final delivery"
                    );
                } else {
                    tracing::debug!(
                        subject = %message.subject,
                        delivered = message.delivered,
                        ?delay,
                        "redelivery requested"
                    );
                }
                message.nak(Some(*delay)).await
            }
        }
    }

    async fn handle_delivery(&self, message: InboundMessage) -> Disposition {
        let disposition = self.process(&message).await;
        if let Err(err) = self.settle(&message, &disposition).await {
            tracing::warn!(subject = %message.subject, error = %err, "failed to settle message");
        }
        disposition
    }

    /// Consume until `cancel` fires or the stream ends, then drain in-flight handlers.
    ///
    /// The subscription is rebuilt whenever the monitored set changes.
    pub async fn run(&self, cancel: CancellationToken) -> Result<DispatchStats, BrokerError> {
        let mut stats = DispatchStats::default();
        let mut versions = self.context.tenants.subscribe();
        let semaphore = Arc::new(Semaphore::new(self.settings.max_in_flight.max(1)));
        let mut in_flight: JoinSet<Disposition> = JoinSet::new();

        'subscribe: loop {
            versions.borrow_and_update();
            let subscription = self.subscription(Utc::now());
            if subscription.filter_subjects.is_empty() {
                tracing::info!("no monitored subjects, waiting for tenants");
                tokio::select! {
                    _ = cancel.cancelled() => break 'subscribe,
                    changed = versions.changed() => {
                        if changed.is_err() {
                            break 'subscribe;
                        }
                        continue 'subscribe;
                    }
                }
            }

            let mut stream = self.source.subscribe(&subscription).await?;
            stats.subscriptions += 1;
            tracing::info!(
                consumer = %subscription.durable_name,
                subjects = subscription.filter_subjects.len(),
                start_time = %subscription.start_time,
                "subscribed"
            );

            loop {
                while let Some(joined) = in_flight.try_join_next() {
                    record(&mut stats, joined);
                }

                let next = tokio::select! {
                    _ = cancel.cancelled() => break 'subscribe,
                    changed = versions.changed() => {
                        if changed.is_err() {
                            break 'subscribe;
                        }
                        tracing::info!("monitored set changed, resubscribing");
                        continue 'subscribe;
                    }
                    next = stream.next() => next,
                };

                let message = match next {
                    Some(Ok(message)) => message,
                    Some(Err(err)) => {
                        tracing::warn!(error = %err, "failed to receive message");
                        continue;
                    }
                    None => {
                        tracing::info!("message stream ended");
                        break 'subscribe;
                    }
                };

                let permit = tokio::select! {
                    _ = cancel.cancelled() => break 'subscribe,
                    permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => break 'subscribe,
                    },
                };

                let dispatcher = self.clone();
                in_flight.spawn(async move {
                    let _permit = permit;
                    dispatcher.handle_delivery(message).await
                });
            }
        }

        if !in_flight.is_empty() {
            tracing::info!(in_flight = in_flight.len(), "draining in-flight handlers");
        }
        while let Some(joined) = in_flight.join_next().await {
            record(&mut stats, joined);
        }
        tracing::info!(
            acked = stats.acked,
            dropped = stats.dropped,
            nakked = stats.nakked,
            "dispatcher stopped"
        );
        Ok(stats)
    }
}

fn record(stats: &mut DispatchStats, joined: Result<Disposition, tokio::task::JoinError>) {
    match joined {
        Ok(disposition) => stats.count(&disposition),
        Err(err) => tracing::error!(error = %err, "handler task failed"),
    }
}
