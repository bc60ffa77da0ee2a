//! Gateway WebSocket message types and parser.
//!
//! Both directions use the shape `{"type": "<kind>", "data": {...}}`.

use serde::{Deserialize, Serialize};

/// Messages the gateway sends to us.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GatewayMessage {
    /// The PV has a new value.
    Update(UpdateData),

    /// The gateway (re)established its own link to the PV.
    Connected(PvRef),

    /// The gateway lost its link to the PV.
    Disconnected(PvRef),
}

/// Payload for `update` messages.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateData {
    pub pv: String,
    /// Raw value as sent by the gateway; see [`numeric_value`].
    pub value: serde_json::Value,
}

/// Payload for messages that only name a PV.
#[derive(Debug, Clone, Deserialize)]
pub struct PvRef {
    pub pv: String,
}

/// Messages we send to the gateway.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe(PvRequest),
}

#[derive(Debug, Clone, Serialize)]
pub struct PvRequest {
    pub pv: String,
}

impl ClientMessage {
    pub fn subscribe(pv: &str) -> Self {
        Self::Subscribe(PvRequest { pv: pv.to_string() })
    }
}

/// Parse a gateway text frame.
///
/// Returns `Err` for malformed JSON or unknown `type` values.
/// Callers should log and continue.
pub fn parse_message(text: &str) -> Result<GatewayMessage, serde_json::Error> {
    serde_json::from_str(text)
}

/// Reduce a gateway value to a single number.
///
/// Numbers pass through, booleans map to 1/0, and arrays yield their first
/// element. Anything else has no numeric reading.
pub fn numeric_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        serde_json::Value::Array(items) => items.first().and_then(numeric_value),
        _ => None,
    }
}
