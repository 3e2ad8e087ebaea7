//! Wire types for the control-plane API.
//!
//! Every endpoint responds with the [`ApiResponse`] envelope; mutating
//! endpoints additionally carry the log lines captured while the operation
//! ran, so a synchronous caller still gets operation-progress visibility
//! after the fact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<LogEntry>,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn ok_with_data(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            ..Self::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn failure_with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            details: Some(details.into()),
            ..Self::default()
        }
    }

    pub fn with_logs(mut self, logs: Vec<LogEntry>) -> Self {
        self.logs = logs;
        self
    }
}

/// One captured, leveled log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub message: String,
}

/// Optional body for `POST /api/v1/up`. An absent or empty body installs
/// or starts with the persisted configuration untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpRequest {
    #[serde(default)]
    pub image_tag: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub enable_inference_engine: Option<bool>,
    #[serde(default)]
    pub enable_proxy_agent: Option<bool>,
}

/// Optional body for `POST /api/v1/restart`; no service means all.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RestartRequest {
    #[serde(default)]
    pub service: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_omits_empty_fields() {
        let json = serde_json::to_value(ApiResponse::ok("done")).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "done");
        assert!(json.get("error").is_none());
        assert!(json.get("logs").is_none());

        let json = serde_json::to_value(ApiResponse::failure_with_details("bad", "why")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "bad");
        assert_eq!(json["details"], "why");
        assert!(json.get("message").is_none());
    }

    #[test]
    fn up_request_tolerates_empty_and_partial_bodies() {
        let req: UpRequest = serde_json::from_str("{}").unwrap();
        assert!(req.image_tag.is_none());
        assert!(req.port.is_none());

        let req: UpRequest = serde_json::from_str(r#"{"port": 8080}"#).unwrap();
        assert_eq!(req.port, Some(8080));
        assert!(req.enable_proxy_agent.is_none());
    }
}
