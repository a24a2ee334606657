//! Connection tools.

use crate::db::ConnectionManager;
use crate::error::DbResult;
use serde::Deserialize;
use std::sync::Arc;

/// Input for the connect tool.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectInput {
    /// PostgreSQL/MySQL URL, `sqlite:` URL or a path to a SQLite file
    pub connection_string: String,
}

pub struct ConnectionToolHandler {
    connection_manager: Arc<ConnectionManager>,
}

impl ConnectionToolHandler {
    pub fn new(connection_manager: Arc<ConnectionManager>) -> Self {
        Self { connection_manager }
    }

    /// Open a read-only session, replacing any active one.
    pub async fn connect(&self, input: ConnectInput) -> DbResult<String> {
        self.connection_manager
            .connect(&input.connection_string)
            .await
    }

    pub async fn disconnect(&self) -> String {
        if self.connection_manager.is_connected().await {
            self.connection_manager.disconnect().await;
            "Disconnected.".to_string()
        } else {
            "No active connection.".to_string()
        }
    }
}
