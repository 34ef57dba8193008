//! J1939 diagnostic message codec
//!
//! Decodes the diagnostic messages (DM1 through DM33, engine hours, idle
//! operation, acknowledgments) exchanged during a J1939-84 run, judges each
//! message's "erased" state after a clear, and encodes DTCs and freeze frames
//! in their J1939-73 byte layouts.

pub mod ack;
pub mod dtc;
pub mod erased;
pub mod error;
pub mod freeze_frame;
pub mod lookup;
pub mod messages;
pub mod monitor;
pub mod packet;

pub use ack::{AckResponse, Acknowledgment};
pub use dtc::{DiagnosticTroubleCode, LampStatus};
pub use erased::{ErasedState, ResettableCounter};
pub use error::{PacketError, PacketResult};
pub use freeze_frame::{FreezeFrame, Spn};
pub use lookup::address_name;
pub use monitor::{CompositeSystem, DiagnosticReadiness, MonitorStatus, MonitoredSystem};
pub use packet::{pgn, DiagnosticMessage, Packet, TOOL_ADDRESS};
