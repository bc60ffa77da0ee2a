//! Pure domain logic for the PV watcher.
//!
//! Nothing in this crate touches the network or spawns tasks; the engine
//! and transport crates build on these types.

pub mod bounds;
pub mod config;
pub mod display;
pub mod error;
pub mod pv_names;
pub mod verdict;
