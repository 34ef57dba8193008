//! j1939-sim - a simulated J1939 vehicle
//!
//! [`SimulatedVehicle`] implements [`j1939_core::DiagnosticGateway`] from
//! per-module response tables, either built in code or loaded from TOML.

pub mod config;
pub mod vehicle;

pub use config::{ConfigError, EraseOn, ReplyKind, Scope, VehicleConfig};
pub use vehicle::{Reply, SimModule, SimulatedVehicle};
