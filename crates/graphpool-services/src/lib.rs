//! graphpool services layer
//!
//! Graph-access services that borrow connections from the pool, run one unit
//! of work per call and always hand the connection back.
//!
//! # Architecture
//!
//! ```text
//! CLI (graphpool-cli)
//!     ↓
//! Service Layer (graphpool-services) ← This crate
//!     ↓
//! Pool (graphpool-connection)
//!     ↓
//! Infrastructure Layer (graphpool-core, graphpool-driver-neo4j)
//! ```
//!
//! # Services
//!
//! - [`ClassGraphService`] - writes classes, their properties and the calls
//!   between them as a graph

mod class_graph_service;
mod error;
mod models;

pub use class_graph_service::{ClassGraphService, WriteSummary};
pub use error::{ServiceError, ServiceResult};
pub use models::{ClassKind, ClassNode, MethodCall, PropertyNode};
