//! Connection target: endpoint, credentials and bound database

use std::fmt;

use serde::{Deserialize, Serialize};

/// User name and password used to authenticate against the database
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub user: String,
    /// Never serialized; supplied from the environment or flags at startup
    #[serde(skip_serializing, default)]
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything a `GraphConnector` needs to open one connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTarget {
    /// Endpoint URI, e.g. `bolt://localhost:7687`
    pub endpoint: String,
    pub credentials: Credentials,
    /// Database every session opened through this target is bound to
    pub database: String,
}

impl ConnectionTarget {
    pub fn new(
        endpoint: impl Into<String>,
        credentials: Credentials,
        database: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            credentials,
            database: database.into(),
        }
    }
}
