//! GraphQL access for reconciliation.

pub mod client;
pub mod queries;
pub mod types;

pub use client::{GraphQlClient, HttpGraphQlClient, query_as};
pub use queries::GraphQlQuery;
pub use types::{Connection, PageInfo};
