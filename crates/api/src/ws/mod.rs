//! Live event stream for WebSocket clients.
//!
//! A joining client first receives a `state` frame with the summary and
//! every target snapshot, then one JSON frame per engine event.

mod handler;
pub mod manager;
mod stream;

pub use handler::ws_handler;
pub use manager::{StateFrame, StreamFrame, WsManager};
pub use stream::{spawn_event_stream, HEARTBEAT_INTERVAL};
