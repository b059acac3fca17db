//! Webhook side of the engine: event types, the handler template, one
//! handler per event type and the registry routing between them.

pub mod events;
pub mod handler;
pub mod handlers;
pub mod registry;

pub use events::{EventScope, EventType, UnknownEventType};
pub use handler::{FollowUp, TypedWebhookHandler, WebhookHandler};
pub use registry::{HandlerRegistry, RegistryError, REGISTRATIONS};
