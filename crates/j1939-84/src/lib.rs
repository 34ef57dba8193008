//! j1939-84 - J1939-84 conformance step execution
//!
//! Steps ([`StepController`]) run one at a time on a [`TestScheduler`] and
//! report outcomes through a [`StepContext`]. The context also correlates
//! global against destination-specific responses; [`ErasureVerifier`] judges
//! whether the OBD modules erased diagnostic information atomically and
//! consistently after a clear.

pub mod config;
pub mod correlate;
pub mod error;
pub mod parts;
pub mod scheduler;
pub mod step;
pub mod verifier;

pub use config::{ConfigError, RunConfig};
pub use correlate::{directed_acks, directed_packets, global_acks, global_packets};
pub use error::{StepError, StepResult};
pub use parts::all_steps;
pub use scheduler::{RunCanceller, RunHandle, RunReport, StepOutcome, StepRecord, TestScheduler};
pub use step::{StepContext, StepController, StepIdentity};
pub use verifier::{ErasureProbe, ErasureVerifier, ModuleErasureRecord};
