//! Wire messages exchanged with the host bridge.
//!
//! Uses JSON Lines (newline-delimited JSON) over a Unix stream socket.
//! Commands carry an id and get a response with the same id; events are
//! pushed by the host at any time and carry an `event` tag instead.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Command sent to the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeRequest {
    pub id: u64,
    /// Host method name, e.g. `startDial`
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl BridgeRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            id,
            method: method.into(),
            params,
        }
    }
}

/// Host reply to a [`BridgeRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeResponse {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BridgeResponse {
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: u64, message: impl Into<String>) -> Self {
        Self {
            id,
            result: None,
            error: Some(message.into()),
        }
    }
}

/// Event pushed by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum HostEvent {
    /// One dial attempt finished. `status` is the raw host string and is
    /// validated by the sequencer.
    CallCompleted { number: String, status: String },
    /// Host-side post-call countdown
    Countdown { seconds: i64 },
    UploadStart,
    UploadDone {
        ok: bool,
        #[serde(default)]
        message: Option<String>,
    },
    Error {
        #[serde(default)]
        message: String,
    },
    Info {
        #[serde(default)]
        message: String,
    },
}

impl HostEvent {
    pub fn call_completed(number: impl Into<String>, status: impl ToString) -> Self {
        HostEvent::CallCompleted {
            number: number.into(),
            status: status.to_string(),
        }
    }
}

/// Any line the host may send.
#[derive(Debug, Clone)]
pub enum HostMessage {
    Response(BridgeResponse),
    Event(HostEvent),
}

impl HostMessage {
    /// Parse one line. Returns `None` for lines that are neither a response
    /// nor a known event.
    pub fn parse(line: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(line).ok()?;
        if value.get("event").is_some() {
            serde_json::from_value(value).ok().map(HostMessage::Event)
        } else if value.get("id").is_some() {
            serde_json::from_value(value).ok().map(HostMessage::Response)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let request = BridgeRequest::new(7, "startDial", json!({"numbers": ["1"], "intervalMs": 5000}));
        let line = serde_json::to_string(&request).unwrap();
        assert!(line.contains("\"method\":\"startDial\""));
        assert!(line.contains("\"intervalMs\":5000"));
    }

    #[test]
    fn test_parse_call_completed() {
        let msg = HostMessage::parse(r#"{"event":"callCompleted","number":"09171230001","status":"ANSWERED"}"#);
        match msg {
            Some(HostMessage::Event(HostEvent::CallCompleted { number, status })) => {
                assert_eq!(number, "09171230001");
                assert_eq!(status, "ANSWERED");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_upload_done_without_message() {
        let msg = HostMessage::parse(r#"{"event":"uploadDone","ok":true}"#);
        assert!(matches!(
            msg,
            Some(HostMessage::Event(HostEvent::UploadDone { ok: true, message: None }))
        ));
    }

    #[test]
    fn test_parse_response() {
        let msg = HostMessage::parse(r#"{"id":3,"error":"no permission"}"#);
        match msg {
            Some(HostMessage::Response(resp)) => {
                assert_eq!(resp.id, 3);
                assert_eq!(resp.error.as_deref(), Some("no permission"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_garbage() {
        assert!(HostMessage::parse("not json").is_none());
        assert!(HostMessage::parse(r#"{"event":"teleport"}"#).is_none());
        assert!(HostMessage::parse(r#"{"hello":1}"#).is_none());
    }

    #[test]
    fn test_event_round_trip_tag() {
        let json = serde_json::to_value(HostEvent::Countdown { seconds: 4 }).unwrap();
        assert_eq!(json, json!({"event": "countdown", "seconds": 4}));
    }
}
