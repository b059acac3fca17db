//! Broker consumption: subjects, dispositions and the dispatcher loop.

mod disposition;
mod dispatcher;
pub mod memory;
mod message;
#[cfg(feature = "nats")]
pub mod nats;
pub mod subject;

pub use disposition::{BASE_NAK_DELAY, Disposition, MAX_NAK_DELAY, nak_delay};
pub use dispatcher::{DispatchStats, Dispatcher};
pub use memory::MemoryBroker;
pub use message::{
    Acknowledger, BrokerError, InboundMessage, MessageSource, MessageStream, Subscription,
};
#[cfg(feature = "nats")]
pub use nats::JetStreamSource;
