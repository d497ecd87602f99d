//! `missionlink` - Terminal mission control for live launch telemetry
//!
//! This library polls a telemetry endpoint while a mission is armed, keeps
//! the most recent batch of readings, and derives the values a
//! mission-control display shows: Mach ratio, dynamic pressure, G-force,
//! status colour and mission clock.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod console;
pub mod dashboard;
pub mod error;
pub mod logging;
pub mod mission;
pub mod readout;
pub mod render;
pub mod source;
pub mod telemetry;

pub use config::Config;
pub use dashboard::{Dashboard, DashboardSnapshot, PollOutcome};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use mission::{MissionState, MissionStatus, PowerMode};
pub use readout::Readouts;
pub use source::{HttpTelemetrySource, TelemetrySource};
pub use telemetry::{TelemetryHistory, TelemetrySample};
