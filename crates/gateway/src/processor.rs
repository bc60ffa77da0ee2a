//! Per-connection message loop.
//!
//! Reads frames from a subscribed gateway socket, parses them and forwards
//! the resulting [`PvUpdate`]s to the watcher side.

use futures::StreamExt;
use pvwatch_engine::PvUpdate;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::client::GatewayStream;
use crate::messages::{numeric_value, parse_message, GatewayMessage};

/// Why [`process_messages`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The socket closed or failed.
    Closed,
    /// Shutdown was requested.
    Cancelled,
    /// Nobody is listening for updates any more.
    ReceiverDropped,
}

/// Forward updates for `pv` from `ws_stream` into `tx`.
///
/// Loops until the socket closes, `cancel` fires, or `tx`'s receiver is
/// dropped.
pub async fn process_messages(
    ws_stream: &mut GatewayStream,
    pv: &str,
    tx: &mpsc::Sender<PvUpdate>,
    cancel: &CancellationToken,
) -> StreamEnd {
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => return StreamEnd::Cancelled,
            _ = tx.closed() => return StreamEnd::ReceiverDropped,
            frame = ws_stream.next() => frame,
        };

        let update = match frame {
            Some(Ok(Message::Text(text))) => handle_text_message(&text, pv),
            Some(Ok(Message::Close(frame))) => {
                tracing::info!(pv = %pv, ?frame, "Gateway closed the connection");
                return StreamEnd::Closed;
            }
            Some(Ok(_)) => None,
            Some(Err(e)) => {
                tracing::error!(pv = %pv, error = %e, "WebSocket receive error");
                return StreamEnd::Closed;
            }
            None => return StreamEnd::Closed,
        };

        if let Some(update) = update {
            if tx.send(update).await.is_err() {
                return StreamEnd::ReceiverDropped;
            }
        }
    }
}

/// Turn one text frame into an update, if it carries one for `pv`.
fn handle_text_message(text: &str, pv: &str) -> Option<PvUpdate> {
    let msg = match parse_message(text) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::warn!(
                pv = %pv,
                error = %e,
                raw_message = %text,
                "Failed to parse gateway message",
            );
            return None;
        }
    };

    match msg {
        GatewayMessage::Update(data) if data.pv == pv => match numeric_value(&data.value) {
            Some(value) => Some(PvUpdate::Sample(value)),
            None => {
                tracing::warn!(pv = %pv, value = %data.value, "Skipping non-numeric value");
                None
            }
        },
        GatewayMessage::Disconnected(data) if data.pv == pv => Some(PvUpdate::Disconnected),
        GatewayMessage::Connected(data) if data.pv == pv => {
            tracing::debug!(pv = %pv, "Gateway reports PV connected");
            None
        }
        other => {
            tracing::debug!(pv = %pv, ?other, "Ignoring message for another PV");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_for_own_pv_is_a_sample() {
        let text = r#"{"type":"update","data":{"pv":"A","value":[4.0]}}"#;
        assert_eq!(handle_text_message(text, "A"), Some(PvUpdate::Sample(4.0)));
    }

    #[test]
    fn update_for_other_pv_is_ignored() {
        let text = r#"{"type":"update","data":{"pv":"B","value":4.0}}"#;
        assert_eq!(handle_text_message(text, "A"), None);
    }

    #[test]
    fn disconnected_maps_to_update() {
        let text = r#"{"type":"disconnected","data":{"pv":"A"}}"#;
        assert_eq!(handle_text_message(text, "A"), Some(PvUpdate::Disconnected));
    }

    #[test]
    fn non_numeric_and_malformed_are_skipped() {
        let text = r#"{"type":"update","data":{"pv":"A","value":"high"}}"#;
        assert_eq!(handle_text_message(text, "A"), None);
        assert_eq!(handle_text_message("{", "A"), None);
        let text = r#"{"type":"connected","data":{"pv":"A"}}"#;
        assert_eq!(handle_text_message(text, "A"), None);
    }
}
