//! j1939-core - shared collaborators of a J1939-84 run
//!
//! The bus gateway abstraction, the typed request layer built on it, the
//! per-run module registry and the listener that receives outcomes.

pub mod comms;
pub mod error;
pub mod gateway;
pub mod listener;
pub mod outcome;
pub mod registry;

pub use comms::CommunicationsModule;
pub use error::{GatewayError, GatewayResult};
pub use gateway::{DiagnosticGateway, DirectedResponse, RequestResult};
pub use listener::{CollectingListener, ListenerEvent, ResultsListener};
pub use outcome::{Outcome, Severity};
pub use registry::{CounterBaselines, ModuleInfo, ModuleRegistry};
