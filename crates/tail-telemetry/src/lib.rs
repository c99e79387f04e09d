//! # TAIL Telemetry
//!
//! Structured logging for the TAIL registry crates and tools.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tail_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&TelemetryConfig::for_tool("tail-cli"))?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TAIL_SERVICE_NAME` | `tail-registry` | Service name in logs |
//! | `TAIL_LOG_LEVEL` | `info` | Log level filter |
//! | `TAIL_JSON_LOGS` | `false` | Emit JSON lines |
//! | `TAIL_CONSOLE_OUTPUT` | `true` | Write logs to stderr |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Failed to install tracing subscriber: {0}")]
    Init(String),
}
