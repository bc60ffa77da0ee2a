//! WebSocket client for the PV subscription gateway.
//!
//! Provides typed message parsing, per-PV connection management,
//! reconnection logic, and a [`GatewayAdapter`] that plugs the gateway
//! into the watcher engine as its subscription source.

pub mod adapter;
pub mod client;
pub mod messages;
pub mod processor;
pub mod reconnect;

pub use adapter::GatewayAdapter;
