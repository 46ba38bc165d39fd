pub mod logging;
pub mod telemetry;
pub mod tracelog;

pub use telemetry::{Propagation, Telemetry, TelemetryConfig, TelemetryError};
pub use tracelog::{attach, resolve, Logger};
