//! Mission and control-panel state.
//!
//! Holds the operator-controlled flags of the dashboard. None of these talk
//! to a backend; they change what is displayed and whether telemetry polling
//! is allowed to run.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Prompt shown to the operator before an abort takes effect.
pub const ABORT_PROMPT: &str = "CRITICAL WARNING: ABORT MISSION? This cannot be undone.";

/// Overall mission status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionStatus {
    /// Waiting for launch.
    #[default]
    Ready,
    /// Launched and flying.
    Nominal,
    /// Terminated by the operator; only a reset leaves this state.
    Aborted,
}

impl std::fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready => write!(f, "READY"),
            Self::Nominal => write!(f, "NOMINAL"),
            Self::Aborted => write!(f, "ABORTED"),
        }
    }
}

/// Which bus feeds the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PowerMode {
    /// Ground support equipment via the umbilical.
    #[default]
    Ground,
    /// Onboard batteries.
    Internal,
}

impl PowerMode {
    /// The other power source.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Ground => Self::Internal,
            Self::Internal => Self::Ground,
        }
    }
}

impl std::fmt::Display for PowerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ground => write!(f, "GROUND"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// Asks the operator to confirm a destructive action.
///
/// Any `FnMut(&str) -> bool` closure is a `Confirm`, which keeps call sites
/// and tests short.
pub trait Confirm {
    /// Show `prompt` and return `true` if the operator agreed.
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Operator-controlled dashboard state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MissionState {
    /// Whether the dashboard should be polling telemetry.
    pub armed: bool,
    /// Current mission status.
    pub status: MissionStatus,
    /// Selected power source.
    pub power_mode: PowerMode,
    /// Whether the LOX bleed valves are open.
    pub venting: bool,
}

impl MissionState {
    /// Create a fresh, unarmed state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if telemetry polling is permitted.
    #[must_use]
    pub fn should_poll(&self) -> bool {
        self.armed && self.status != MissionStatus::Aborted
    }

    /// Check if the mission has been aborted.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.status == MissionStatus::Aborted
    }

    /// Arm the dashboard and mark the mission nominal.
    ///
    /// Calling it again while armed changes nothing. Returns `false` without
    /// touching state when the mission is aborted: only a reset leaves that.
    pub fn launch(&mut self) -> bool {
        if self.is_aborted() {
            warn!("Launch refused: mission is aborted, reset first");
            return false;
        }
        if !self.armed {
            info!("Launch initiated");
        }
        self.armed = true;
        self.status = MissionStatus::Nominal;
        true
    }

    /// Abort the mission if the operator confirms.
    ///
    /// Returns `true` if the mission is aborted after the call.
    pub fn abort<C: Confirm + ?Sized>(&mut self, confirm: &mut C) -> bool {
        if !confirm.confirm(ABORT_PROMPT) {
            debug!("Abort not confirmed");
            return false;
        }
        if !self.is_aborted() {
            warn!("Mission aborted by operator");
        }
        self.status = MissionStatus::Aborted;
        true
    }

    /// Return to the pre-launch state.
    ///
    /// Power source and vent valve positions are left as they are.
    pub fn reset(&mut self) {
        info!(from = %self.status, "System reset");
        self.armed = false;
        self.status = MissionStatus::Ready;
    }

    /// Switch between ground and internal power.
    pub fn toggle_power(&mut self) -> PowerMode {
        self.power_mode = self.power_mode.toggled();
        debug!(power_mode = %self.power_mode, "Power source switched");
        self.power_mode
    }

    /// Open or close the propellant vent valves.
    pub fn toggle_vent(&mut self) -> bool {
        self.venting = !self.venting;
        debug!(venting = self.venting, "Vent valve toggled");
        self.venting
    }
}
