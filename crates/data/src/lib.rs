//! Sensor data access: implementations of the core `SensorStore` port.
//!
//! `client` talks HTTP to the remote sensor API; `memory` is a deterministic
//! in-process store for tests and offline demos.

pub mod client;
pub mod memory;

pub use client::SensorApiClient;
pub use memory::InMemorySensorStore;
