//! Telemetry payloads emitted on every reporting tick.

use registry_core::ServerRecord;
use serde::{Deserialize, Serialize};

/// Log type tag for the lookup counter.
pub const LOG_HITS: &str = "logging.hits";

/// Log type tag for the server tree.
pub const LOG_SERVERS: &str = "logging.servers";

/// Number of lookups served since the previous tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitCounterLog {
    /// Name of the reporting registry instance
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub hits: u64,
}

impl HitCounterLog {
    pub fn new(name: impl Into<String>, hits: u64) -> Self {
        Self {
            name: name.into(),
            kind: LOG_HITS.to_string(),
            hits,
        }
    }
}

/// Read-only view of every registered server and its rooms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerTreeLog {
    /// Name of the reporting registry instance
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub servers: Vec<ServerRecord>,
}

impl ServerTreeLog {
    pub fn new(name: impl Into<String>, servers: Vec<ServerRecord>) -> Self {
        Self {
            name: name.into(),
            kind: LOG_SERVERS.to_string(),
            servers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use registry_core::ServerAddress;

    #[test]
    fn test_hit_counter_serialization() {
        let json = serde_json::to_string(&HitCounterLog::new("registry", 12)).unwrap();
        assert!(json.contains("\"type\":\"logging.hits\""));
        assert!(json.contains("\"name\":\"registry\""));
        assert!(json.contains("\"hits\":12"));
    }

    #[test]
    fn test_server_tree_serialization() {
        let servers = vec![ServerRecord::new("chat-1", ServerAddress::new("localhost", 6767))];
        let value = serde_json::to_value(ServerTreeLog::new("registry", servers)).unwrap();
        assert_eq!(value["type"], "logging.servers");
        assert_eq!(value["servers"][0]["name"], "chat-1");
        assert_eq!(value["servers"][0]["port"], 6767);
    }
}
