//! JSON message protocol for IPC communication between CLI and daemon.

use crate::cache::{CacheStats, StoredTranslation};
use crate::worker::CurrentTranslation;
use serde::{Deserialize, Serialize};

/// Commands sent by CLI to the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Get the current translation snapshot
    Translation,
    /// Reset worker state and discard pending shorts
    Reset,
    /// Get RAM cache statistics
    CacheStats,
    /// Get recent durable-store history, newest first
    History { limit: usize },
    /// Shutdown the daemon
    Shutdown,
}

impl Command {
    /// Serialize command to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize command from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Responses sent by daemon to CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Command succeeded
    Ok,
    /// Current translation snapshot
    Translation { current: CurrentTranslation },
    /// RAM cache statistics
    CacheStats { stats: CacheStats },
    /// Recent durable-store entries
    History { entries: Vec<StoredTranslation> },
    /// Error occurred
    Error { message: String },
}

impl Response {
    /// Serialize response to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize response from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_json_roundtrip() {
        let commands = vec![
            Command::Translation,
            Command::Reset,
            Command::CacheStats,
            Command::History { limit: 30 },
            Command::Shutdown,
        ];

        for cmd in commands {
            let json = cmd.to_json().expect("should serialize");
            let deserialized = Command::from_json(&json).expect("should deserialize");
            assert_eq!(cmd, deserialized, "roundtrip failed for {:?}", cmd);
        }
    }

    #[test]
    fn test_json_format_is_snake_case() {
        let json = Command::CacheStats.to_json().expect("should serialize");
        assert!(
            json.contains("\"type\":\"cache_stats\""),
            "JSON should use snake_case. Got: {}",
            json
        );
    }

    #[test]
    fn test_translation_response_carries_snapshot() {
        let resp = Response::Translation {
            current: CurrentTranslation {
                text: "hello".to_string(),
                id: 3,
                busy: true,
                context_active: false,
            },
        };
        let json = resp.to_json().expect("should serialize");
        let deserialized = Response::from_json(&json).expect("should deserialize");
        assert_eq!(resp, deserialized);
        assert!(json.contains("\"id\":3"));
    }

    #[test]
    fn test_history_response_roundtrip() {
        let resp = Response::History {
            entries: vec![StoredTranslation {
                key: "k".to_string(),
                value: "v".to_string(),
                created_at: 42,
            }],
        };
        let json = resp.to_json().expect("should serialize");
        assert_eq!(Response::from_json(&json).expect("deserialize"), resp);
    }

    #[test]
    fn test_error_response_roundtrip() {
        let resp = Response::Error {
            message: "went wrong".to_string(),
        };
        let json = resp.to_json().expect("should serialize");
        assert_eq!(Response::from_json(&json).expect("deserialize"), resp);
    }
}
