//! graphpool core - abstractions shared by the pool, drivers and services
//!
//! This crate defines:
//!
//! - `GraphConnector` - opens one live connection to a graph database
//! - `GraphConnection` - a live connection that can start sessions
//! - `GraphSession` - a unit of work (transaction) against one database
//! - `ConnectionTarget` / `Credentials` - where and as whom to connect
//! - `Value` / `Params` - query parameters passed through sessions

mod connection;
mod error;
mod target;
mod types;

pub use connection::*;
pub use error::*;
pub use target::*;
pub use types::*;
