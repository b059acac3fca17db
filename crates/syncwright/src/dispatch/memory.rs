//! In-process broker for tests and local runs.
//!
//! Keeps every published message with its publish time. A subscription
//! replays matching messages published at or after its start time, then
//! receives live publishes until [`MemoryBroker::close`]. Naks redeliver
//! immediately with the delivery count bumped, up to `max_deliver`.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use tokio::sync::mpsc;

use super::message::{
    Acknowledger, BrokerError, InboundMessage, MessageSource, MessageStream, Subscription,
};
use super::subject::subject_matches;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Acked,
    Nakked { delay: Option<Duration> },
}

/// How one delivery was settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub subject: String,
    pub delivered: u32,
    pub settlement: Settlement,
}

#[derive(Debug, Clone)]
struct Published {
    subject: String,
    payload: Bytes,
    at: DateTime<Utc>,
}

struct Delivery {
    subject: String,
    payload: Bytes,
    delivered: u32,
    max_deliver: i64,
    redeliver: mpsc::UnboundedSender<Delivery>,
}

struct LiveSubscriber {
    filters: Vec<String>,
    max_deliver: i64,
    sender: mpsc::UnboundedSender<Delivery>,
}

#[derive(Default)]
struct State {
    log: Vec<Published>,
    subscribers: Vec<LiveSubscriber>,
    subscriptions: Vec<Subscription>,
    outcomes: Vec<Outcome>,
    closed: bool,
}

#[derive(Clone, Default)]
pub struct MemoryBroker {
    state: Arc<Mutex<State>>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn publish(&self, subject: impl Into<String>, payload: impl Into<Bytes>) {
        self.publish_at(subject, payload, Utc::now());
    }

    /// Publish with an explicit timestamp, e.g. to fall outside a replay window.
    pub fn publish_at(
        &self,
        subject: impl Into<String>,
        payload: impl Into<Bytes>,
        at: DateTime<Utc>,
    ) {
        let published = Published {
            subject: subject.into(),
            payload: payload.into(),
            at,
        };
        let mut state = self.lock();
        state.subscribers.retain(|subscriber| {
            if !matches_any(&subscriber.filters, &published.subject) {
                return true;
            }
            subscriber
                .sender
                .send(Delivery {
                    subject: published.subject.clone(),
                    payload: published.payload.clone(),
                    delivered: 1,
                    max_deliver: subscriber.max_deliver,
                    redeliver: subscriber.sender.clone(),
                })
                .is_ok()
        });
        state.log.push(published);
    }

    /// Stop live delivery. Open streams end once their pending messages settle.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.subscribers.clear();
    }

    pub fn outcomes(&self) -> Vec<Outcome> {
        self.lock().outcomes.clone()
    }

    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.lock().subscriptions.clone()
    }

    fn settle(&self, outcome: Outcome) {
        self.lock().outcomes.push(outcome);
    }
}

fn matches_any(filters: &[String], subject: &str) -> bool {
    filters.iter().any(|filter| subject_matches(filter, subject))
}

struct MemoryAcker {
    broker: MemoryBroker,
    subject: String,
    payload: Bytes,
    delivered: u32,
    max_deliver: i64,
    redeliver: mpsc::UnboundedSender<Delivery>,
}

#[async_trait]
impl Acknowledger for MemoryAcker {
    async fn ack(&self) -> Result<(), BrokerError> {
        self.broker.settle(Outcome {
            subject: self.subject.clone(),
            delivered: self.delivered,
            settlement: Settlement::Acked,
        });
        Ok(())
    }

    async fn nak(&self, delay: Option<Duration>) -> Result<(), BrokerError> {
        self.broker.settle(Outcome {
            subject: self.subject.clone(),
            delivered: self.delivered,
            settlement: Settlement::Nakked { delay },
        });
        if i64::from(self.delivered) < self.max_deliver {
            self.redeliver
                .send(Delivery {
                    subject: self.subject.clone(),
                    payload: self.payload.clone(),
                    delivered: self.delivered + 1,
                    max_deliver: self.max_deliver,
                    redeliver: self.redeliver.clone(),
                })
                .map_err(|e| BrokerError::Ack(e.to_string()))?;
        }
        Ok(())
    }
}

#[async_trait]
impl MessageSource for MemoryBroker {
    async fn subscribe(&self, subscription: &Subscription) -> Result<MessageStream, BrokerError> {
        let (sender, receiver) = mpsc::unbounded_channel();
        {
            let mut state = self.lock();
            state.subscriptions.push(subscription.clone());
            for published in &state.log {
                if published.at >= subscription.start_time
                    && matches_any(&subscription.filter_subjects, &published.subject)
                {
                    sender
                        .send(Delivery {
                            subject: published.subject.clone(),
                            payload: published.payload.clone(),
                            delivered: 1,
                            max_deliver: subscription.max_deliver,
                            redeliver: sender.clone(),
                        })
                        .map_err(|e| BrokerError::Subscribe(e.to_string()))?;
                }
            }
            if !state.closed {
                state.subscribers.push(LiveSubscriber {
                    filters: subscription.filter_subjects.clone(),
                    max_deliver: subscription.max_deliver,
                    sender,
                });
            }
        }

        let broker = self.clone();
        let stream = futures::stream::unfold(receiver, |mut receiver| async move {
            let delivery = receiver.recv().await?;
            Some((delivery, receiver))
        })
        .map(move |delivery| {
            let acker = MemoryAcker {
                broker: broker.clone(),
                subject: delivery.subject.clone(),
                payload: delivery.payload.clone(),
                delivered: delivery.delivered,
                max_deliver: delivery.max_deliver,
                redeliver: delivery.redeliver,
            };
            Ok(InboundMessage::new(
                delivery.subject,
                delivery.payload,
                delivery.delivered,
                Arc::new(acker),
            ))
        });
        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription(filters: &[&str]) -> Subscription {
        Subscription {
            durable_name: "test".into(),
            filter_subjects: filters.iter().map(|s| s.to_string()).collect(),
            start_time: Utc::now() - chrono::Duration::days(1),
            max_deliver: 2,
        }
    }

    #[tokio::test]
    async fn replays_matching_messages_within_window() {
        let broker = MemoryBroker::new();
        broker.publish("github.acme.api.issues", "a");
        broker.publish("github.acme.web.issues", "b");
        broker.publish_at("github.acme.api.issues", "old", Utc::now() - chrono::Duration::days(3));
        broker.close();

        let mut stream = broker.subscribe(&subscription(&["github.acme.api.*"])).await.unwrap();
        let message = stream.next().await.unwrap().unwrap();
        assert_eq!(message.payload, Bytes::from_static(b"a"));
        message.ack().await.unwrap();
        drop(message);
        assert!(stream.next().await.is_none());
        assert_eq!(broker.outcomes().len(), 1);
    }

    #[tokio::test]
    async fn nak_redelivers_until_max_deliver() {
        let broker = MemoryBroker::new();
        broker.publish("github.acme.api.issues", "a");
        broker.close();

        let mut stream = broker.subscribe(&subscription(&["github.>"])).await.unwrap();
        let first = stream.next().await.unwrap().unwrap();
        first.nak(None).await.unwrap();
        drop(first);
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second.delivered, 2);
        second.nak(None).await.unwrap();
        drop(second);
        assert!(stream.next().await.is_none());
        assert_eq!(broker.outcomes().len(), 2);
    }

    #[tokio::test]
    async fn live_publishes_reach_open_subscriptions() {
        let broker = MemoryBroker::new();
        let mut stream = broker.subscribe(&subscription(&["github.acme.?.team"])).await.unwrap();
        broker.publish("github.acme.api.issues", "ignored");
        broker.publish("github.acme.?.team", "team");
        let message = stream.next().await.unwrap().unwrap();
        assert_eq!(message.subject, "github.acme.?.team");
    }
}
