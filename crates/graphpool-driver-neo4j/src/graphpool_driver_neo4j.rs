//! Neo4j driver implementation
//!
//! Each pooled handle owns its own `neo4rs::Graph` limited to a single Bolt
//! connection, so the pool's size is the number of open Bolt connections.

mod connection;
mod connector;
mod params;

pub use connection::{Neo4jConnection, Neo4jSession};
pub use connector::{DEFAULT_FETCH_SIZE, Neo4jConnector};
