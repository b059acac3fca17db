//! Outbound credentials and failure isolation per tenant.

pub mod circuit;
pub mod token;

pub use circuit::{CircuitConfig, CircuitRegistry, CircuitState};
pub use token::{AppTokenProvider, StaticTokenProvider, TokenError, TokenProvider};
